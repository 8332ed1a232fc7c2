use std::fmt;

use bytes::Bytes;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use s3tester_core::{ClientFactory, StorageClient, StorageError};

use crate::config::S3Config;
use crate::error::ClientError;

/// Creates independent [`S3Client`] sessions for one endpoint and bucket.
///
/// Credentials and the endpoint are resolved once when the factory is created; every call to
/// [`connect`](ClientFactory::connect) then builds a fresh bucket handle with its own connection
/// pool.
pub struct S3ClientFactory {
    endpoint: String,
    bucket: String,
    region: String,
    path_style: bool,
    request_timeout: Option<std::time::Duration>,
    credentials: Credentials,
}

impl S3ClientFactory {
    /// Validates `config` and resolves credentials.
    ///
    /// This does not contact the endpoint. Use [`S3Client::count_objects`] to check
    /// connectivity.
    pub fn new(config: S3Config) -> Result<Self, ClientError> {
        let endpoint = config.endpoint_url()?;
        if config.bucket.is_empty() {
            return Err(ClientError::Config("bucket name must not be empty".into()));
        }

        let credentials = match config.access_key.as_deref() {
            Some(access_key) => Credentials::new(
                Some(access_key),
                config.secret_key.as_deref(),
                None,
                None,
                None,
            ),
            None => Credentials::from_env().or_else(|_| {
                tracing::debug!("no S3 credentials configured, sending anonymous requests");
                Credentials::anonymous()
            }),
        }
        .map_err(|cause| ClientError::Credentials(cause.into()))?;

        let factory = Self {
            endpoint,
            bucket: config.bucket,
            region: config.region,
            path_style: config.path_style,
            request_timeout: config.request_timeout,
            credentials,
        };

        // Fail early on settings the S3 client rejects, rather than in every worker.
        factory.open_bucket()?;

        Ok(factory)
    }

    /// The endpoint URL all sessions connect to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The bucket all sessions write to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Opens a new session.
    pub fn session(&self) -> Result<S3Client, ClientError> {
        self.open_bucket().map(|bucket| S3Client {
            bucket,
            bucket_name: self.bucket.clone(),
            endpoint: self.endpoint.clone(),
        })
    }

    fn open_bucket(&self) -> Result<Box<Bucket>, ClientError> {
        let bucket_error = |cause: S3Error| ClientError::Bucket {
            bucket: self.bucket.clone(),
            cause,
        };

        let region = Region::Custom {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
        };

        let mut bucket =
            Bucket::new(&self.bucket, region, self.credentials.clone()).map_err(bucket_error)?;

        if self.path_style {
            bucket = bucket.with_path_style();
        }

        if let Some(request_timeout) = self.request_timeout {
            bucket = bucket
                .with_request_timeout(request_timeout)
                .map_err(bucket_error)?;
        }

        Ok(bucket)
    }
}

impl fmt::Debug for S3ClientFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3ClientFactory")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("path_style", &self.path_style)
            .finish_non_exhaustive()
    }
}

impl ClientFactory for S3ClientFactory {
    type Client = S3Client;

    fn connect(&self) -> Result<Self::Client, StorageError> {
        self.session()
            .map_err(|error| StorageError::new("failed to open S3 session", error))
    }
}

/// A session against one bucket of an S3-compatible endpoint.
pub struct S3Client {
    bucket: Box<Bucket>,
    bucket_name: String,
    endpoint: String,
}

impl S3Client {
    /// Lists the entire bucket and returns the number of objects in it.
    ///
    /// This is the preflight check run before a write test: any failure means the endpoint is
    /// unreachable or the bucket is not accessible with the configured credentials.
    #[tracing::instrument(level = "debug", skip_all, fields(endpoint = %self.endpoint))]
    pub async fn count_objects(&self) -> Result<usize, ClientError> {
        let pages = self
            .bucket
            .list(String::new(), None)
            .await
            .map_err(|cause| ClientError::Connection {
                endpoint: self.endpoint.clone(),
                bucket: self.bucket_name.clone(),
                cause,
            })?;

        let count: usize = pages.iter().map(|page| page.contents.len()).sum();
        tracing::debug!(pages = pages.len(), count, "listed bucket");
        Ok(count)
    }
}

impl fmt::Debug for S3Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Client")
            .field("bucket", &self.bucket_name)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl StorageClient for S3Client {
    fn bucket(&self) -> &str {
        &self.bucket_name
    }

    async fn put_object(&self, key: &str, payload: Bytes) -> Result<(), StorageError> {
        // Responses other than 2xx are turned into errors by the S3 client.
        self.bucket
            .put_object(key, &payload)
            .await
            .map_err(|error| StorageError::new(format!("failed to upload `{key}`"), error))?;

        Ok(())
    }
}
