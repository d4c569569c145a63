pub mod directory;
pub mod s3;

use anyhow::bail;
use remotefile_common::StorageBackend;

use crate::config::BackendConfig;

use self::directory::DirectoryAdapter;
use self::s3::{S3Adapter, S3Config};

/// Construct a storage backend from its configuration.
///
/// S3 credentials missing from the configuration fall back to the standard
/// AWS environment variables.
pub fn from_config(config: &BackendConfig) -> anyhow::Result<Box<dyn StorageBackend>> {
    match config {
        BackendConfig::S3(settings) => {
            let access_key_id = settings
                .access_key_id
                .clone()
                .unwrap_or_else(|| std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_default());
            let secret_access_key = settings
                .secret_access_key
                .clone()
                .unwrap_or_else(|| std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_default());

            if access_key_id.is_empty() || secret_access_key.is_empty() {
                bail!("S3 credentials not found");
            }

            Ok(Box::new(S3Adapter::new(S3Config {
                bucket: settings.bucket.clone(),
                region: settings.region.clone(),
                endpoint: settings.endpoint.clone(),
                access_key_id,
                secret_access_key,
                http: settings.http.clone(),
            })?))
        }
        BackendConfig::Directory { path } => Ok(Box::new(DirectoryAdapter::new(path))),
    }
}
