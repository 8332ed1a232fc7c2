//! Write load generator for S3-compatible object storage.
//!
//! Writes a configured number of small random objects into a bucket through a pool of concurrent
//! workers, and reports how many of them each endpoint accepted.

fn main() -> anyhow::Result<()> {
    s3tester::cli::execute()
}
