//! Logging and error reporting setup.

use std::env;
use std::io::IsTerminal;

use sentry::integrations::tracing as sentry_tracing;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, prelude::*};

use crate::config::{Config, LogFormat};

/// Initializes Sentry if a DSN is configured.
///
/// The returned guard flushes pending events when dropped and must be kept alive for the
/// duration of the program.
pub fn init_sentry(config: &Config) -> Option<sentry::ClientInitGuard> {
    config.sentry.dsn.as_ref().map(|dsn| {
        sentry::init(sentry::ClientOptions {
            dsn: dsn.as_str().parse().ok(),
            environment: config.sentry.environment.clone().map(Into::into),
            sample_rate: config.sentry.sample_rate,
            release: sentry::release_name!(),
            ..Default::default()
        })
    })
}

/// Installs the global tracing subscriber, logging to stderr.
pub fn init_tracing(config: &Config) {
    // Warnings and errors become events, everything at INFO is kept as breadcrumb.
    let sentry_layer = config.sentry.dsn.as_ref().map(|_| {
        sentry_tracing::layer().event_filter(|metadata| match *metadata.level() {
            Level::ERROR | Level::WARN => sentry_tracing::EventFilter::Event,
            Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
            Level::DEBUG | Level::TRACE => sentry_tracing::EventFilter::Ignore,
        })
    });

    let (level, env_filter) = parse_rust_log(config.logging.level);

    let format = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    let format = match config.logging.format {
        LogFormat::Auto if std::io::stderr().is_terminal() => format.compact().boxed(),
        LogFormat::Pretty => format.compact().boxed(),
        LogFormat::Auto | LogFormat::Simplified => format.with_ansi(false).boxed(),
        LogFormat::Json => format.json().flatten_event(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(format.with_filter(level))
        .with(sentry_layer)
        .with(env_filter)
        .init();
}

/// Resolves the effective log level and filter.
///
/// If `RUST_LOG` is a plain level, it replaces the configured level. Any other value is used as
/// a filter directive verbatim.
fn parse_rust_log(configured: LevelFilter) -> (LevelFilter, EnvFilter) {
    let level = match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(value) => match value.parse::<LevelFilter>() {
            Ok(level) => level,
            Err(_) => return (LevelFilter::TRACE, EnvFilter::new(value)),
        },
        Err(_) => configured,
    };

    // This is the maximum verbosity that will be logged, we filter this down to `level`.
    let env_filter = EnvFilter::new(
        "INFO,\
        s3tester=TRACE,\
        s3tester_core=TRACE,\
        s3tester_s3=TRACE,\
        ",
    );

    (level, env_filter)
}
