//! Remote object exposed as a forward-only [`File`].
//!
//! Nothing touches the network until the first `read` or `size`. That call
//! performs exactly one fetch through the configured source and keeps the
//! resulting stream for every later read.

use std::fmt;
use std::fs::Metadata;
use std::io::{self, Read, SeekFrom};

use reqwest::Url;
use tracing::debug;

use remotefile_common::{File, FileError, ObjectStream, StorageBackend};

use crate::http::HttpTransport;

/// Where a reader gets its bytes from. Borrowed, so one transport or backend
/// can back many readers.
#[derive(Clone, Copy)]
pub enum Source<'a> {
    /// Plain HTTP GET of the locator.
    Http(&'a dyn HttpTransport),
    /// Structured backend; the declared size is checked against the download.
    Backend(&'a dyn StorageBackend),
}

impl fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Http(_) => f.write_str("Http"),
            Source::Backend(_) => f.write_str("Backend"),
        }
    }
}

enum State {
    NotStarted,
    /// `length` is `None` when the server did not declare one.
    Active {
        stream: ObjectStream,
        length: Option<u64>,
    },
    Closed,
}

pub struct RemoteObjectReader<'a> {
    source: Source<'a>,
    url: Url,
    state: State,
}

impl<'a> RemoteObjectReader<'a> {
    pub fn new(source: Source<'a>, url: Url) -> Self {
        Self {
            source,
            url,
            state: State::NotStarted,
        }
    }

    pub fn over_http(transport: &'a dyn HttpTransport, url: Url) -> Self {
        Self::new(Source::Http(transport), url)
    }

    pub fn over_backend(backend: &'a dyn StorageBackend, url: Url) -> Self {
        Self::new(Source::Backend(backend), url)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// True once a fetch has succeeded and until the reader is closed.
    pub fn is_started(&self) -> bool {
        matches!(self.state, State::Active { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Perform the fetch unless one already succeeded. On failure the reader
    /// stays `NotStarted`, so the next call fetches again from scratch.
    fn ensure_started(&mut self) -> Result<(), FileError> {
        match self.state {
            State::Active { .. } => return Ok(()),
            State::Closed => return Err(FileError::Closed(self.url.to_string())),
            State::NotStarted => {}
        }

        let (stream, length) = match self.source {
            Source::Http(transport) => fetch_http(transport, &self.url)?,
            Source::Backend(backend) => fetch_backend(backend, &self.url)?,
        };
        debug!(url = %self.url, length = ?length, "Remote object opened");
        self.state = State::Active { stream, length };
        Ok(())
    }
}

fn fetch_http(
    transport: &dyn HttpTransport,
    url: &Url,
) -> Result<(ObjectStream, Option<u64>), FileError> {
    let response = transport.get(url)?;
    if !response.status.is_success() {
        return Err(FileError::HttpStatus {
            status: response.status,
            url: url.to_string(),
        });
    }
    let length = response.content_length();
    Ok((response.body, length))
}

fn fetch_backend(
    backend: &dyn StorageBackend,
    url: &Url,
) -> Result<(ObjectStream, Option<u64>), FileError> {
    let expected = backend.file_info(url).map_err(FileError::Backend)?;
    let download = backend.download(url).map_err(FileError::Backend)?;
    // Guards against truncated or redirected downloads; the stream is dropped.
    if download.size != expected {
        return Err(FileError::SizeMismatch {
            url: url.to_string(),
            expected,
            actual: download.size,
        });
    }
    Ok((download.body, Some(download.size)))
}

impl Read for RemoteObjectReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ensure_started()?;
        match &mut self.state {
            State::Active { stream, .. } => stream.read(buf),
            State::NotStarted | State::Closed => {
                Err(FileError::Closed(self.url.to_string()).into())
            }
        }
    }
}

impl File for RemoteObjectReader<'_> {
    fn close(&mut self) -> Result<(), FileError> {
        if let State::Active { .. } = self.state {
            debug!(url = %self.url, "Remote object closed");
        }
        self.state = State::Closed;
        Ok(())
    }

    /// Remote objects are forward-read-only.
    fn seek(&mut self, _pos: SeekFrom) -> Result<u64, FileError> {
        Err(FileError::NotSupported("seek"))
    }

    fn size(&mut self) -> Result<u64, FileError> {
        self.ensure_started()?;
        match self.state {
            State::Active {
                length: Some(length),
                ..
            } => Ok(length),
            _ => Err(FileError::SizeUnknown(self.url.to_string())),
        }
    }

    fn abs_path(&self) -> String {
        self.url.to_string()
    }

    fn stat(&self) -> Option<Metadata> {
        None
    }
}

impl fmt::Debug for RemoteObjectReader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::NotStarted => "not started",
            State::Active { .. } => "active",
            State::Closed => "closed",
        };
        f.debug_struct("RemoteObjectReader")
            .field("source", &self.source)
            .field("url", &self.url.as_str())
            .field("state", &state)
            .finish()
    }
}
