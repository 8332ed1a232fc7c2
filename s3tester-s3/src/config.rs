use std::fmt;
use std::time::Duration;

use crate::error::ClientError;

/// Region used when none is configured.
///
/// Most S3-compatible services ignore the region, but it is part of every request signature.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for one S3-compatible endpoint and bucket.
#[derive(Clone)]
pub struct S3Config {
    /// Endpoint URL or bare `host[:port]`. Bare hosts are contacted over plain HTTP.
    pub endpoint: String,
    /// Target bucket; it must exist already.
    pub bucket: String,
    /// Region used for request signing.
    pub region: String,
    /// Address buckets as `endpoint/bucket` instead of `bucket.endpoint`.
    pub path_style: bool,
    /// Access key ID. Without it, credentials are read from `AWS_*` environment variables, or
    /// requests are sent unsigned.
    pub access_key: Option<String>,
    /// Secret access key belonging to `access_key`.
    pub secret_key: Option<String>,
    /// Timeout for every single request.
    pub request_timeout: Option<Duration>,
}

impl S3Config {
    /// Creates a configuration with default settings for the given endpoint and bucket.
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            region: DEFAULT_REGION.to_owned(),
            path_style: true,
            access_key: None,
            secret_key: None,
            request_timeout: None,
        }
    }

    /// Returns the endpoint as a URL including its scheme.
    pub fn endpoint_url(&self) -> Result<String, ClientError> {
        normalize_endpoint(&self.endpoint)
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("path_style", &self.path_style)
            .field("access_key", &self.access_key.as_ref().map(|_| "[redacted]"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[redacted]"))
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn normalize_endpoint(endpoint: &str) -> Result<String, ClientError> {
    let endpoint = endpoint.trim();
    let (scheme, host) = endpoint.split_once("://").unwrap_or(("http", endpoint));

    if !matches!(scheme, "http" | "https") {
        return Err(ClientError::Config(format!(
            "unsupported endpoint scheme `{scheme}`"
        )));
    }

    let host = host.trim_end_matches('/');
    if host.is_empty() {
        return Err(ClientError::Config(format!(
            "endpoint `{endpoint}` has no host"
        )));
    }

    Ok(format!("{scheme}://{host}"))
}
