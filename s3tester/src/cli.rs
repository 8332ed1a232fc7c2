//! Command line interface of `s3tester`.

use std::path::PathBuf;

use anyhow::Result;
use argh::FromArgs;

use crate::config::{Config, Overrides, RECOMMENDED_MIN_WORKERS};
use crate::{observability, runner};

/// Write load generator for S3-compatible object storage.
///
/// Values can also be provided through the environment variables DATA_VIP, BUCKET_NAME,
/// NUMBER_OBJECTS, PREFIX_LENGTH and WORKER_COUNT, which take precedence over flags.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// remote endpoint for data connections, or a comma-separated list of endpoints
    #[argh(option)]
    datavip: Option<String>,

    /// bucket to write objects into
    #[argh(option)]
    bucket: Option<String>,

    /// number of objects to write (default: 10000)
    #[argh(option)]
    objects: Option<u64>,

    /// number of random characters in object names (default: 32)
    #[argh(option)]
    prefix: Option<usize>,

    /// number of concurrent workers (default: number of CPU cores)
    #[argh(option)]
    workers: Option<usize>,

    /// print the version and exit
    #[argh(switch)]
    version: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            endpoint: self.datavip.clone(),
            bucket: self.bucket.clone(),
            objects: self.objects,
            prefix_length: self.prefix,
            workers: self.workers,
        }
    }
}

/// Bootstrap the runtime and execute the CLI command.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    if args.version {
        println!("s3tester {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load(args.config.as_deref(), &args.overrides())?;

    // Sentry should be initialized before creating the async runtime.
    let _sentry_guard = observability::init_sentry(&config);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("s3tester-rt")
        .enable_all()
        .build()?;
    let _runtime_guard = runtime.enter();

    observability::init_tracing(&config);
    tracing::debug!(?config);

    config.validate()?;
    if config.is_underprovisioned() {
        tracing::warn!(
            workers = config.workers,
            "recommend at least {RECOMMENDED_MIN_WORKERS} workers to prevent client bottlenecks"
        );
    }

    let report = runtime.block_on(runner::run(&config));
    println!();
    print!("{report}");

    Ok(())
}
