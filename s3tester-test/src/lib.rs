//! Test utilities for `s3tester` and its libraries.
//!
//! This crate provides utilities to facilitate testing of the write engine, the S3 adapter and
//! the command line application. See the modules for all available utilities.

pub mod tracing;
