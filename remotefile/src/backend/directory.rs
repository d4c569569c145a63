//! Local directory backend adapter.
//!
//! Serves objects stored under a base directory. The locator's path is the
//! object key, whatever its scheme.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context};
use reqwest::Url;
use tracing::debug;

use remotefile_common::backend::object_key;
use remotefile_common::{Download, StorageBackend};

pub struct DirectoryAdapter {
    base_path: PathBuf,
}

impl DirectoryAdapter {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Map an object key below `base_path`. Keys that could escape it
    /// (`..`, absolute paths, drive prefixes) are refused.
    fn full_path(&self, key: &str) -> anyhow::Result<PathBuf> {
        let mut path = self.base_path.clone();
        for component in Path::new(key).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    bail!("Object key escapes the base directory: {}", key);
                }
            }
        }
        if path == self.base_path {
            bail!("Empty object key");
        }
        Ok(path)
    }
}

impl StorageBackend for DirectoryAdapter {
    fn file_info(&self, url: &Url) -> anyhow::Result<u64> {
        let path = self.full_path(&object_key(url)?)?;
        let meta = fs::metadata(&path)
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        if !meta.is_file() {
            bail!("Not a regular file: {}", path.display());
        }
        Ok(meta.len())
    }

    fn download(&self, url: &Url) -> anyhow::Result<Download> {
        let path = self.full_path(&object_key(url)?)?;
        let file = fs::File::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let size = file
            .metadata()
            .with_context(|| format!("Failed to stat {}", path.display()))?
            .len();
        debug!(path = %path.display(), size, "Directory download opened");
        Ok(Download {
            body: Box::new(file),
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_directory_adapter_info_and_download() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("test/subdir")).unwrap();
        std::fs::write(dir.path().join("test/subdir/file.txt"), b"hello world").unwrap();
        let adapter = DirectoryAdapter::new(dir.path());

        let url = Url::parse("s3://bucket/test/subdir/file.txt").unwrap();
        assert_eq!(adapter.file_info(&url).unwrap(), 11);

        let mut download = adapter.download(&url).unwrap();
        assert_eq!(download.size, 11);
        let mut body = String::new();
        download.body.read_to_string(&mut body).unwrap();
        assert_eq!(body, "hello world");
    }

    #[test]
    fn test_directory_adapter_missing() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = DirectoryAdapter::new(dir.path());
        let url = Url::parse("file:///nope.bin").unwrap();
        assert!(adapter.file_info(&url).is_err());
        assert!(adapter.download(&url).is_err());
    }

    #[test]
    fn test_directory_adapter_rejects_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        let adapter = DirectoryAdapter::new(dir.path());
        let url = Url::parse("file:///sub").unwrap();
        assert!(adapter.file_info(&url).is_err());
    }

    #[test]
    fn test_directory_adapter_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = DirectoryAdapter::new(dir.path());
        assert!(adapter.full_path("../../../etc/passwd").is_err());
        assert!(adapter.full_path("a/../../secret").is_err());
        assert!(adapter.full_path("/etc/passwd").is_err());
        assert!(adapter.full_path("").is_err());

        let dest = adapter.full_path("./sub/file.txt").unwrap();
        assert_eq!(dest, dir.path().join("sub").join("file.txt"));
    }

    #[test]
    fn test_directory_adapter_encoded_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = DirectoryAdapter::new(dir.path().join("objects"));
        std::fs::create_dir_all(dir.path().join("objects")).unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"outside").unwrap();

        let url = Url::parse("s3://bucket/..%2Fsecret.txt").unwrap();
        assert!(adapter.file_info(&url).is_err());
        assert!(adapter.download(&url).is_err());
    }

    #[test]
    fn test_directory_adapter_dots_inside_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("v1..2.txt"), b"right object").unwrap();
        std::fs::write(dir.path().join("v12.txt"), b"WRONG OBJECT").unwrap();
        let adapter = DirectoryAdapter::new(dir.path());

        let url = Url::parse("s3://bucket/v1..2.txt").unwrap();
        let mut download = adapter.download(&url).unwrap();
        let mut body = String::new();
        download.body.read_to_string(&mut body).unwrap();
        assert_eq!(body, "right object");
        assert_eq!(adapter.file_info(&url).unwrap(), 12);
    }
}
