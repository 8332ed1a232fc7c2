//! The storage capability the write engine depends on.

use std::fmt::Debug;

use bytes::Bytes;

use crate::error::StorageError;

/// A connection to a single bucket of an object storage service.
///
/// Implementations are bound to their bucket when they are created by a [`ClientFactory`].
#[async_trait::async_trait]
pub trait StorageClient: Debug + Send + Sync + 'static {
    /// The bucket all objects are written to.
    fn bucket(&self) -> &str;

    /// Stores `payload` under `key` in the bucket, replacing any existing object.
    async fn put_object(&self, key: &str, payload: Bytes) -> Result<(), StorageError>;
}

/// Creates [`StorageClient`]s for the workers of a run.
///
/// Every worker obtains its own client when it starts and releases it when it exits, so
/// connections are never shared between workers.
pub trait ClientFactory: Debug + Send + Sync + 'static {
    /// The client type produced by this factory.
    type Client: StorageClient;

    /// Establishes a new client session.
    fn connect(&self) -> Result<Self::Client, StorageError>;
}
