//! Command line application generating write load against S3-compatible object storage.
//!
//! This builds on top of [`s3tester_core`] for the write engine and [`s3tester_s3`] for the
//! storage access, and adds configuration, logging and result reporting.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod observability;
pub mod report;
pub mod runner;
