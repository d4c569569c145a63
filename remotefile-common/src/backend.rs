use std::fmt;
use std::io::Read;

use reqwest::Url;

/// Byte stream handed out by transports and backends.
pub type ObjectStream = Box<dyn Read + Send>;

/// An object body together with the size the backend reports for it.
pub struct Download {
    pub body: ObjectStream,
    pub size: u64,
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download").field("size", &self.size).finish_non_exhaustive()
    }
}

/// Trait implemented by structured storage backends.
///
/// A backend answers two questions about a locator: how big the object is
/// (`file_info`) and what its bytes are (`download`). Credentials, signing and
/// endpoint selection live inside the backend; readers only borrow it, so one
/// backend can serve any number of readers.
pub trait StorageBackend: Send + Sync {
    /// Authoritative size of the object, in bytes.
    fn file_info(&self, url: &Url) -> anyhow::Result<u64>;

    /// Open the object for reading.
    fn download(&self, url: &Url) -> anyhow::Result<Download>;
}

/// Compute the object key for a locator: its path without the leading slash,
/// percent-decoded. The host (bucket) is not part of the key. Keys that do not
/// decode to UTF-8 are rejected rather than passed on still encoded.
pub fn object_key(url: &Url) -> anyhow::Result<String> {
    let path = url.path().trim_start_matches('/');
    let decoded = urlencoding::decode(path)
        .map_err(|e| anyhow::anyhow!("Object key in {} is not valid UTF-8: {}", url, e))?;
    Ok(decoded.into_owned())
}
