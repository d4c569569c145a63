use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::http::HttpOptions;

/// Which structured backend to build, and how.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum BackendConfig {
    #[serde(alias = "b2")]
    S3(S3Settings),
    Directory { path: PathBuf },
}

/// S3-compatible backend settings. Credentials left out here are taken from
/// `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` when the backend is built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct S3Settings {
    /// Bucket used for locators that do not name one.
    #[serde(default)]
    pub bucket: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Custom endpoint for B2, MinIO or other S3-compatible APIs.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Client settings for requests to the object store.
    #[serde(default)]
    pub http: HttpOptions,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl BackendConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: BackendConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Accept the same shape as a JSON document, e.g. one stored alongside
    /// other settings in a database.
    pub fn from_json(doc: &serde_json::Value) -> anyhow::Result<Self> {
        let config: BackendConfig = serde_json::from_value(doc.clone())
            .map_err(|e| anyhow::anyhow!("Invalid backend document: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        match self {
            BackendConfig::S3(s3) => {
                if s3.bucket.is_empty() {
                    anyhow::bail!("bucket must not be empty");
                }
                if s3.region.is_empty() {
                    anyhow::bail!("region must not be empty");
                }
                if let Some(ep) = &s3.endpoint {
                    if !ep.starts_with("http://") && !ep.starts_with("https://") {
                        anyhow::bail!("endpoint must be an http(s) URL: {}", ep);
                    }
                }
            }
            BackendConfig::Directory { path } => {
                if !path.is_absolute() {
                    anyhow::bail!("directory path must be absolute: {}", path.display());
                }
            }
        }
        Ok(())
    }
}
