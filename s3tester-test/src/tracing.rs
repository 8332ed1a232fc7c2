//! Log capture for tests.

use tracing_subscriber::EnvFilter;

/// Crates whose logs are captured at full verbosity.
const CAPTURED_CRATES: &[&str] = &["s3tester", "s3tester_core", "s3tester_s3"];

/// Builds the filter used by [`init`].
///
/// `RUST_LOG` takes precedence when it is set, so a single test can be debugged with a narrower
/// or wider filter without touching code.
fn test_filter() -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    CAPTURED_CRATES
        .iter()
        .fold(EnvFilter::new("ERROR"), |filter, name| {
            filter.add_directive(format!("{name}=TRACE").parse().unwrap())
        })
}

/// Routes `tracing` output of the calling test through the test harness.
///
/// Output is only shown for failing tests, or with `--nocapture`. Calling this more than once
/// per process is harmless.
///
/// # Example
///
/// ```
/// s3tester_test::tracing::init();
/// ```
pub fn init() {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(test_filter())
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init()
        .ok();
}
