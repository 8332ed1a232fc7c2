//! S3-compatible storage for the `s3tester` write engine.
//!
//! This crate implements the [`StorageClient`](s3tester_core::StorageClient) and
//! [`ClientFactory`](s3tester_core::ClientFactory) ports of [`s3tester_core`] on top of the
//! `rust-s3` client. It also provides the preflight listing that confirms an endpoint is
//! reachable and the bucket is accessible before any load is generated.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod client;
mod config;
mod error;

pub use client::{S3Client, S3ClientFactory};
pub use config::{DEFAULT_REGION, S3Config};
pub use error::ClientError;
