pub mod backend;
pub mod config;
pub mod http;
pub mod reader;

pub use remotefile_common::{Download, File, FileError, LocalFile, ObjectStream, StorageBackend};

pub use self::config::BackendConfig;
pub use self::http::{HttpOptions, HttpResponse, HttpTransport, ReqwestTransport};
pub use self::reader::{RemoteObjectReader, Source};
