//! Generic HTTP transport.
//!
//! The reader only needs `GET url -> (status, headers, body)`; the default
//! implementation is a blocking reqwest client.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, CONTENT_LENGTH};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use remotefile_common::{FileError, ObjectStream};

pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ObjectStream,
}

impl HttpResponse {
    /// Declared `Content-Length`, if present and well-formed.
    pub fn content_length(&self) -> Option<u64> {
        content_length(&self.headers)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Parse the `Content-Length` header.
pub fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &Url) -> Result<HttpResponse, FileError>;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpOptions {
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Upper bound on a whole request including reading the body. Unset means
    /// no limit, since bodies are streamed for as long as the caller reads.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("remotefile/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            timeout_secs: None,
            user_agent: default_user_agent(),
        }
    }
}

/// Blocking client configured from `options`; shared by the plain transport
/// and the S3 adapter.
pub fn build_client(options: &HttpOptions) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(options.connect_timeout_secs))
        .timeout(options.timeout_secs.map(Duration::from_secs))
        .user_agent(options.user_agent.clone())
        .build()
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, FileError> {
        Self::with_options(&HttpOptions::default())
    }

    pub fn with_options(options: &HttpOptions) -> Result<Self, FileError> {
        Ok(Self {
            client: build_client(options)?,
        })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse, FileError> {
        let resp = self.client.get(url.clone()).send()?;
        let status = resp.status();
        let headers = resp.headers().clone();
        debug!(url = %url, status = %status, "HTTP GET");
        Ok(HttpResponse {
            status,
            headers,
            body: Box::new(resp),
        })
    }
}
