pub mod backend;
pub mod error;
pub mod file;
pub mod local;

pub use backend::{Download, ObjectStream, StorageBackend};
pub use error::FileError;
pub use file::File;
pub use local::LocalFile;
