use s3::error::S3Error;
use thiserror::Error;

/// Errors raised while setting up or talking to an S3-compatible endpoint.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint or bucket configuration cannot be used.
    #[error("invalid S3 configuration: {0}")]
    Config(String),

    /// Credentials could not be constructed.
    #[error("failed to load S3 credentials")]
    Credentials(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A bucket handle could not be created.
    #[error("failed to open bucket `{bucket}`")]
    Bucket {
        /// Name of the bucket.
        bucket: String,
        /// The error reported by the S3 client.
        #[source]
        cause: S3Error,
    },

    /// The endpoint could not be reached, or refused to list the bucket.
    #[error("failed to list bucket `{bucket}` at {endpoint}")]
    Connection {
        /// The endpoint URL.
        endpoint: String,
        /// Name of the bucket.
        bucket: String,
        /// The error reported by the S3 client.
        #[source]
        cause: S3Error,
    },
}
