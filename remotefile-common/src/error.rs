use std::io;

use reqwest::StatusCode;

/// Errors surfaced by [`File`](crate::File) implementations.
///
/// Nothing here is logged or retried by the readers that produce it; every
/// failure goes straight back to the caller of the triggering operation.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("got non-2XX status code {status}: {url}")]
    HttpStatus { status: StatusCode, url: String },
    #[error("size of {0} is unknown (no Content-Length)")]
    SizeUnknown(String),
    #[error("size mismatch for {url}: backend reported {expected} bytes, download has {actual}")]
    SizeMismatch {
        url: String,
        expected: u64,
        actual: u64,
    },
    #[error("{0} is not supported")]
    NotSupported(&'static str),
    #[error("backend error: {0:#}")]
    Backend(anyhow::Error),
    #[error("file is closed: {0}")]
    Closed(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FileError {
    /// Recover a `FileError` that travelled through `std::io::Read`.
    pub fn from_io(err: &io::Error) -> Option<&FileError> {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<FileError>())
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            FileError::NotSupported(_) => io::ErrorKind::Unsupported,
            FileError::HttpStatus { status, .. } if *status == StatusCode::NOT_FOUND => {
                io::ErrorKind::NotFound
            }
            FileError::SizeMismatch { .. } => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        }
    }
}

impl From<FileError> for io::Error {
    fn from(err: FileError) -> Self {
        match err {
            FileError::Io(e) => e,
            other => io::Error::new(other.io_kind(), other),
        }
    }
}
