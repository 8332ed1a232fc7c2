//! Error types of the write engine.

use thiserror::Error;

use crate::key::KeyError;

/// A boxed error type used to carry the cause of storage failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error returned by a [`StorageClient`](crate::StorageClient) or
/// [`ClientFactory`](crate::ClientFactory).
#[derive(Debug, Error)]
#[error("{context}")]
pub struct StorageError {
    context: String,
    #[source]
    cause: Option<BoxError>,
}

impl StorageError {
    /// Creates an error with the given context and underlying cause.
    pub fn new(context: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            context: context.into(),
            cause: Some(cause.into()),
        }
    }

    /// Creates an error that consists of a message only.
    pub fn msg(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            cause: None,
        }
    }
}

/// Errors that abort a dispatcher run as a whole.
///
/// Failures of individual writes never show up here, they are counted instead.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The run was started without any workers.
    #[error("at least one worker is required")]
    NoWorkers,

    /// Object keys cannot be generated with the configured prefix length.
    #[error("invalid object key configuration: {0}")]
    Key(#[from] KeyError),

    /// A worker could not obtain a storage client.
    #[error("failed to connect worker {worker}")]
    Connect {
        /// Index of the worker that failed to connect.
        worker: usize,
        /// The error returned by the client factory.
        #[source]
        cause: StorageError,
    },

    /// A worker task panicked or was cancelled by the runtime.
    #[error("worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
