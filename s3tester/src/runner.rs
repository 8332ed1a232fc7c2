//! Runs the write test against every configured endpoint.

use s3tester_core::{DispatchError, WriteTest};
use s3tester_s3::{ClientError, S3ClientFactory};

use crate::config::Config;
use crate::report::{self, EndpointReport, Report};

/// Tests all endpoints one after another and collects their results.
///
/// An endpoint that cannot be reached is recorded as failed, and testing continues with the
/// next one.
pub async fn run(config: &Config) -> Report {
    let mut report = Report::default();
    for endpoint in config.endpoints() {
        report.push(test_endpoint(config, endpoint).await);
    }
    report
}

#[tracing::instrument(skip(config))]
async fn test_endpoint(config: &Config, endpoint: &str) -> EndpointReport {
    let factory = match preflight(config, endpoint).await {
        Ok(factory) => factory,
        Err(error) => {
            tracing::error!(
                error = &error as &dyn std::error::Error,
                "failed to connect to endpoint"
            );
            return EndpointReport::failed_to_connect(endpoint);
        }
    };

    println!("Writing Objects.");
    let test = WriteTest::new(factory, config.write_params());
    match test.run().await {
        Ok(outcome) => {
            report::print_summary(&outcome);
            EndpointReport::success(endpoint, outcome.result.objects_written)
        }
        Err(error @ DispatchError::Connect { .. }) => {
            tracing::error!(
                error = &error as &dyn std::error::Error,
                "failed to open sessions"
            );
            EndpointReport::failed_to_connect(endpoint)
        }
        Err(error) => {
            tracing::error!(error = &error as &dyn std::error::Error, "write test aborted");
            EndpointReport::failed(endpoint)
        }
    }
}

/// Confirms the bucket can be listed before any load is generated.
async fn preflight(config: &Config, endpoint: &str) -> Result<S3ClientFactory, ClientError> {
    let factory = S3ClientFactory::new(config.s3_config(endpoint))?;
    let existing = factory.session()?.count_objects().await?;
    tracing::info!(
        endpoint = factory.endpoint(),
        bucket = factory.bucket(),
        existing,
        "connected to bucket"
    );
    Ok(factory)
}

#[cfg(test)]
mod tests {
    use crate::report::EndpointStatus;

    use super::*;

    #[tokio::test]
    async fn unreachable_endpoints_are_reported() {
        s3tester_test::tracing::init();

        let config = Config {
            endpoint: Some("127.0.0.1:1,ftp://bad".into()),
            bucket: Some("loadtest".into()),
            objects: 5,
            ..Default::default()
        };

        let report = run(&config).await;

        let statuses: Vec<_> = report.rows().iter().map(|row| row.status).collect();
        assert_eq!(
            statuses,
            [EndpointStatus::FailedToConnect, EndpointStatus::FailedToConnect]
        );
        assert_eq!(report.rows()[1].endpoint, "ftp://bad");
    }
}
