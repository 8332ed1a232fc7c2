//! Configuration for the `s3tester` command.
//!
//! Configuration is merged from the following sources, with later sources overriding earlier
//! ones:
//!
//! 1. Defaults
//! 2. YAML configuration file (specified via `-c` or `--config`)
//! 3. Command line flags that were given explicitly
//! 4. The plain environment variables `DATA_VIP`, `BUCKET_NAME`, `NUMBER_OBJECTS`,
//!    `PREFIX_LENGTH` and `WORKER_COUNT`
//! 5. Environment variables prefixed with `S3TESTER__`
//!
//! # Environment Variables
//!
//! Prefixed environment variables use double underscores (`__`) to denote nested configuration
//! structures. For example:
//!
//! - `S3TESTER__LOGGING__LEVEL=debug` sets the log level
//! - `S3TESTER__S3__REGION=eu-west-1` sets the signing region
//!
//! # YAML Configuration File
//!
//! ```yaml
//! endpoint: 10.0.0.5:9000
//! bucket: loadtest
//! objects: 50000
//! workers: 64
//!
//! s3:
//!   request_timeout: 30s
//! ```

use std::fmt;
use std::path::Path;
use std::thread::available_parallelism;
use std::time::Duration;

use anyhow::Result;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use s3tester_core::WriteTestParams;
use s3tester_s3::{DEFAULT_REGION, S3Config};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Environment variable prefix for all nested configuration options.
const ENV_PREFIX: &str = "S3TESTER__";

/// Plain environment variables and the configuration field each of them sets.
const PLAIN_ENV: &[(&str, &str)] = &[
    ("DATA_VIP", "endpoint"),
    ("BUCKET_NAME", "bucket"),
    ("NUMBER_OBJECTS", "objects"),
    ("PREFIX_LENGTH", "prefix_length"),
    ("WORKER_COUNT", "workers"),
];

/// Fields whose environment values are taken verbatim.
///
/// All other environment values are parsed, which would turn `BUCKET_NAME=007` into the number 7.
const STRING_FIELDS: &[&str] = &[
    "endpoint",
    "bucket",
    "access_key",
    "secret_key",
    "s3.region",
    "sentry.dsn",
    "sentry.environment",
];

/// Below this number of workers, the client is likely to become the bottleneck.
pub const RECOMMENDED_MIN_WORKERS: usize = 12;

/// Errors detected when validating a loaded [`Config`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No bucket was configured.
    #[error("must set bucket name on the command line or in the environment (BUCKET_NAME)")]
    MissingBucket,
    /// No endpoint was configured.
    #[error("must provide data VIP on the command line or in the environment (DATA_VIP)")]
    MissingEndpoint,
    /// The number of objects is zero.
    #[error(
        "must set number of objects to be created on the command line or in the environment (NUMBER_OBJECTS)"
    )]
    InvalidObjectCount,
    /// The prefix length is zero.
    #[error(
        "must set the length of the object name prefix on the command line or in the environment (PREFIX_LENGTH)"
    )]
    InvalidPrefixLength,
    /// The number of workers is zero.
    #[error("worker count must be at least 1")]
    InvalidWorkerCount,
}

/// Newtype around `String` that keeps secrets out of debug output and logs.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    /// Returns the secret value.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for ConfigSecret {
    fn from(str: &str) -> Self {
        ConfigSecret(str.to_string())
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "[redacted]")
    }
}

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact colored output on a terminal, [`LogFormat::Simplified`] otherwise.
    #[default]
    Auto,
    /// Compact output with colors.
    Pretty,
    /// Plain text without colors.
    Simplified,
    /// JSON lines.
    Json,
}

/// Logging configuration. Logs are always written to stderr.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Logging {
    /// Minimum log level to output.
    ///
    /// `RUST_LOG` overrides this if it is set.
    ///
    /// # Environment Variable
    ///
    /// `S3TESTER__LOGGING__LEVEL`
    #[serde(with = "display_fromstr")]
    pub level: LevelFilter,

    /// Log output format.
    ///
    /// # Environment Variable
    ///
    /// `S3TESTER__LOGGING__FORMAT`
    pub format: LogFormat,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Auto,
        }
    }
}

/// Optional Sentry error reporting.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Sentry {
    /// Sentry DSN. Sentry is disabled unless this is set.
    ///
    /// # Environment Variable
    ///
    /// `S3TESTER__SENTRY__DSN`
    pub dsn: Option<ConfigSecret>,

    /// Environment name attached to all events.
    pub environment: Option<String>,

    /// Fraction of error events sent to Sentry.
    pub sample_rate: f32,
}

impl Default for Sentry {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            sample_rate: 1.0,
        }
    }
}

/// Settings of the S3 client.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct S3 {
    /// Region used to sign requests.
    ///
    /// # Environment Variable
    ///
    /// `S3TESTER__S3__REGION`
    pub region: String,

    /// Use path-style bucket addressing (`endpoint/bucket`).
    pub path_style: bool,

    /// Timeout for every S3 request, for example `30s`. Unlimited if unset.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
}

impl Default for S3 {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_owned(),
            path_style: true,
            request_timeout: None,
        }
    }
}

/// Configuration values that were given explicitly on the command line.
///
/// Only set fields take part in the merge.
#[derive(Debug, Default, Serialize)]
pub struct Overrides {
    /// Endpoint or comma-separated list of endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Target bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Number of objects to write.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects: Option<u64>,
    /// Number of random characters in object names.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<usize>,
    /// Number of concurrent workers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

/// Complete configuration of a write test invocation.
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Endpoint of the S3-compatible service, or a comma-separated list of endpoints that are
    /// tested one after another.
    ///
    /// Bare `host[:port]` values are contacted over plain HTTP.
    ///
    /// # Environment Variable
    ///
    /// `DATA_VIP`
    pub endpoint: Option<String>,

    /// Bucket to write objects into. It must exist already.
    ///
    /// # Environment Variable
    ///
    /// `BUCKET_NAME`
    pub bucket: Option<String>,

    /// Number of objects to write per endpoint.
    ///
    /// # Default
    ///
    /// `10000`
    ///
    /// # Environment Variable
    ///
    /// `NUMBER_OBJECTS`
    pub objects: u64,

    /// Number of random characters in every object name.
    ///
    /// # Default
    ///
    /// `32`
    ///
    /// # Environment Variable
    ///
    /// `PREFIX_LENGTH`
    pub prefix_length: usize,

    /// Number of concurrent workers, each with its own connection.
    ///
    /// # Default
    ///
    /// The number of available CPU cores.
    ///
    /// # Environment Variable
    ///
    /// `WORKER_COUNT`
    pub workers: usize,

    /// Access key ID. Without it, `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` are used if
    /// present, otherwise requests are sent unsigned.
    ///
    /// # Environment Variable
    ///
    /// `S3TESTER__ACCESS_KEY`
    pub access_key: Option<ConfigSecret>,

    /// Secret access key belonging to [`access_key`](Config::access_key).
    ///
    /// # Environment Variable
    ///
    /// `S3TESTER__SECRET_KEY`
    pub secret_key: Option<ConfigSecret>,

    /// S3 client settings.
    pub s3: S3,

    /// Logging configuration.
    pub logging: Logging,

    /// Sentry error reporting configuration.
    pub sentry: Sentry,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            bucket: None,
            objects: 10_000,
            prefix_length: 32,
            workers: available_parallelism().map_or(1, |n| n.get()),
            access_key: None,
            secret_key: None,
            s3: S3::default(),
            logging: Logging::default(),
            sentry: Sentry::default(),
        }
    }
}

impl Config {
    /// Loads configuration from defaults, an optional YAML file, command line overrides and the
    /// environment.
    ///
    /// The result is not validated; call [`validate`](Self::validate) before using it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The YAML configuration file cannot be read or parsed
    /// - Environment variables contain invalid values
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Serialized::defaults(overrides));
        figment = merge_env(figment, plain_env);
        figment = merge_env(figment, prefixed_env);

        Ok(figment.extract()?)
    }

    /// Checks that all values required for a write test are present and in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingBucket);
        }
        if self.endpoints().is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }
        if self.objects == 0 {
            return Err(ConfigError::InvalidObjectCount);
        }
        if self.prefix_length == 0 {
            return Err(ConfigError::InvalidPrefixLength);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkerCount);
        }
        Ok(())
    }

    /// Returns `true` if the worker count is below [`RECOMMENDED_MIN_WORKERS`].
    pub fn is_underprovisioned(&self) -> bool {
        self.workers < RECOMMENDED_MIN_WORKERS
    }

    /// All configured endpoints, in the order they are tested.
    pub fn endpoints(&self) -> Vec<&str> {
        self.endpoint
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|endpoint| !endpoint.is_empty())
            .collect()
    }

    /// Parameters of the write test run against every endpoint.
    pub fn write_params(&self) -> WriteTestParams {
        WriteTestParams {
            object_count: self.objects,
            worker_count: self.workers,
            prefix_length: self.prefix_length,
        }
    }

    /// S3 client settings for one of the configured endpoints.
    pub fn s3_config(&self, endpoint: &str) -> S3Config {
        let mut config = S3Config::new(endpoint, self.bucket.clone().unwrap_or_default());
        config.region = self.s3.region.clone();
        config.path_style = self.s3.path_style;
        config.request_timeout = self.s3.request_timeout;
        config.access_key = self.access_key.as_ref().map(|key| key.as_str().to_owned());
        config.secret_key = self.secret_key.as_ref().map(|key| key.as_str().to_owned());
        config
    }
}

fn plain_env() -> Env {
    Env::raw().filter_map(|key| {
        PLAIN_ENV
            .iter()
            .find(|(name, _)| key.as_str().eq_ignore_ascii_case(name))
            .map(|(_, field)| (*field).into())
    })
}

fn prefixed_env() -> Env {
    Env::prefixed(ENV_PREFIX).split("__")
}

/// Merges the variables selected by `env` into `figment`, keeping [`STRING_FIELDS`] unparsed.
fn merge_env(figment: Figment, env: fn() -> Env) -> Figment {
    let mut figment = figment.merge(env().ignore(STRING_FIELDS));
    for (key, value) in env().only(STRING_FIELDS).iter() {
        figment = figment.merge(Serialized::default(key.as_str(), value));
    }
    figment
}

mod display_fromstr {
    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
        T: std::fmt::Display,
    {
        serializer.collect_str(&value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: std::str::FromStr,
        <T as std::str::FromStr>::Err: std::fmt::Display,
    {
        use serde::Deserialize;
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
