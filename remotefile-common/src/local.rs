//! Local-disk implementation of the generic file abstraction.

use std::fs::{self, Metadata};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::FileError;
use crate::file::File;

#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    file: Option<fs::File>,
}

impl LocalFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FileError> {
        let path = fs::canonicalize(path.as_ref())?;
        let file = fs::File::open(&path)?;
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    fn handle(&mut self) -> Result<&mut fs::File, FileError> {
        match self.file.as_mut() {
            Some(file) => Ok(file),
            None => Err(FileError::Closed(self.path.display().to_string())),
        }
    }
}

impl Read for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.handle()?.read(buf)?)
    }
}

impl File for LocalFile {
    fn close(&mut self) -> Result<(), FileError> {
        self.file = None;
        Ok(())
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64, FileError> {
        Ok(self.handle()?.seek(pos)?)
    }

    fn size(&mut self) -> Result<u64, FileError> {
        Ok(self.handle()?.metadata()?.len())
    }

    fn abs_path(&self) -> String {
        self.path.display().to_string()
    }

    fn stat(&self) -> Option<Metadata> {
        self.file.as_ref().and_then(|file| file.metadata().ok())
    }
}
