use std::fs::Metadata;
use std::io::{Read, SeekFrom};

use crate::error::FileError;

/// Generic file abstraction shared by local and remote files.
///
/// Callers that only need sequential bytes can treat any implementation as a
/// plain `Read`. Implementations that cannot seek return
/// [`FileError::NotSupported`].
pub trait File: Read {
    /// Release the underlying handle. Safe to call more than once.
    fn close(&mut self) -> Result<(), FileError>;

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, FileError>;

    /// Total size in bytes.
    fn size(&mut self) -> Result<u64, FileError>;

    /// Absolute path or URL naming this file.
    fn abs_path(&self) -> String;

    /// Filesystem metadata, when the implementation has any.
    fn stat(&self) -> Option<Metadata>;
}
