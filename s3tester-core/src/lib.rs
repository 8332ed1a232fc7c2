//! The write-load engine of `s3tester`.
//!
//! This crate issues a fixed number of object writes against a storage backend through a bounded
//! pool of workers, and aggregates how many objects and bytes made it to the backend.
//!
//! The storage itself is abstracted behind the [`StorageClient`] and [`ClientFactory`] traits, so
//! the engine can run against a real S3-compatible service as well as against in-memory fakes.
//! The entry point for a full run is [`WriteTest`].
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod client;
pub mod counters;
pub mod dispatcher;
pub mod error;
pub mod key;
pub mod payload;

pub use crate::client::{ClientFactory, StorageClient};
pub use crate::counters::{Counters, TestResult};
pub use crate::dispatcher::{Dispatcher, WriteJob};
pub use crate::error::{DispatchError, StorageError};
pub use crate::key::ObjectKey;
pub use crate::payload::{PAYLOAD_SIZE, Payload};
pub use crate::write_test::{WriteTest, WriteTestOutcome, WriteTestParams};
