//! S3-compatible backend adapter.
//!
//! Handles AWS S3 and S3-compatible stores (Backblaze B2, MinIO). Uses
//! blocking reqwest with manual AWS Signature V4 signing so no SDK dependency
//! is needed. Objects are addressed path-style: `{endpoint}/{bucket}/{key}`.
//!
//! Locators have the form `s3://<bucket>/<key>`; an empty host falls back to
//! the configured bucket.

use std::collections::BTreeMap;

use anyhow::{bail, Context};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::blocking::{Client, Response};
use reqwest::{Method, Url};
use sha2::{Digest, Sha256};
use tracing::debug;

use remotefile_common::backend::object_key;
use remotefile_common::{Download, StorageBackend};

use crate::http::{build_client, content_length, HttpOptions};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub http: HttpOptions,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("http", &self.http)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct S3Adapter {
    config: S3Config,
    client: Client,
}

impl S3Adapter {
    pub fn new(config: S3Config) -> anyhow::Result<Self> {
        let client = build_client(&config.http).context("Failed to build HTTP client")?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        if let Some(ep) = &self.config.endpoint {
            ep.trim_end_matches('/').to_string()
        } else {
            format!("https://s3.{}.amazonaws.com", self.config.region)
        }
    }

    /// Resolve a locator to the path-style object URL.
    fn object_url(&self, url: &Url) -> anyhow::Result<Url> {
        if url.scheme() != "s3" {
            bail!("Unsupported locator scheme '{}': {}", url.scheme(), url);
        }
        let bucket = match url.host_str() {
            Some(host) if !host.is_empty() => host,
            _ => self.config.bucket.as_str(),
        };
        if bucket.is_empty() {
            bail!("No bucket in locator and none configured: {}", url);
        }
        let key = object_key(url)?;
        if key.is_empty() {
            bail!("No object key in locator: {}", url);
        }

        let encoded_key = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let object = format!("{}/{}/{}", self.endpoint(), bucket, encoded_key);
        Url::parse(&object).with_context(|| format!("Invalid object URL {}", object))
    }

    /// Compute AWS Signature V4 for a request. `path` is the canonical
    /// (already URI-encoded) path, including its leading slash; `date_time`
    /// is the `x-amz-date` value, whose first eight characters are the scope date.
    fn sign(
        &self,
        method: &str,
        path: &str,
        query: &str,
        headers: &BTreeMap<String, String>,
        body_hash: &str,
        date_time: &str,
    ) -> anyhow::Result<String> {
        let date = date_time
            .get(..8)
            .with_context(|| format!("Malformed x-amz-date: {}", date_time))?;

        // Canonical request
        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();
        let signed_headers: String = headers.keys().cloned().collect::<Vec<_>>().join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, path, query, canonical_headers, signed_headers, body_hash
        );

        // String to sign
        let cr_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let credential_scope = format!("{}/{}/s3/aws4_request", date, self.config.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{}\n{}\n{}",
            date_time, credential_scope, cr_hash
        );

        let signing_key =
            derive_signing_key(&self.config.secret_access_key, date, &self.config.region)?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        Ok(format!(
            "AWS4-HMAC-SHA256 Credential={}/{},SignedHeaders={},Signature={}",
            self.config.access_key_id, credential_scope, signed_headers, signature
        ))
    }

    /// Send a signed, bodiless request for the object named by `url`.
    fn send(&self, method: Method, url: &Url) -> anyhow::Result<Response> {
        let now = Utc::now();
        let date_time = now.format("%Y%m%dT%H%M%SZ").to_string();

        let object = self.object_url(url)?;
        let host = url_host(&object)?;
        let empty_hash = body_hash(b"");

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), host);
        headers.insert("x-amz-content-sha256".to_string(), empty_hash.clone());
        headers.insert("x-amz-date".to_string(), date_time.clone());

        let auth = self.sign(
            method.as_str(),
            object.path(),
            "",
            &headers,
            &empty_hash,
            &date_time,
        )?;

        let resp = self
            .client
            .request(method.clone(), object)
            .header("x-amz-date", &date_time)
            .header("x-amz-content-sha256", &empty_hash)
            .header("Authorization", &auth)
            .send()
            .with_context(|| format!("S3 {} request failed", method))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().unwrap_or_default();
            bail!("S3 {} failed: HTTP {} - {}", method, status, body);
        }

        debug!(url = %url, method = %method, status = %resp.status(), "S3 request complete");
        Ok(resp)
    }
}

fn derive_signing_key(secret: &str, date: &str, region: &str) -> anyhow::Result<Vec<u8>> {
    let key = format!("AWS4{}", secret);
    let k_date = hmac_sha256(key.as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, b"s3")?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| anyhow::anyhow!("Invalid HMAC key: {}", e))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn body_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Host header value for signing: host plus any non-default port.
fn url_host(url: &Url) -> anyhow::Result<String> {
    let host = url
        .host_str()
        .with_context(|| format!("No host in {}", url))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

impl StorageBackend for S3Adapter {
    fn file_info(&self, url: &Url) -> anyhow::Result<u64> {
        let resp = self.send(Method::HEAD, url)?;
        content_length(resp.headers())
            .with_context(|| format!("S3 HEAD response for {} has no Content-Length", url))
    }

    fn download(&self, url: &Url) -> anyhow::Result<Download> {
        let resp = self.send(Method::GET, url)?;
        let size = content_length(resp.headers())
            .with_context(|| format!("S3 GET response for {} has no Content-Length", url))?;
        Ok(Download {
            body: Box::new(resp),
            size,
        })
    }
}
