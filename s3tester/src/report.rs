//! Result output for write tests.
//!
//! After each endpoint, a human-readable summary is printed. Once all endpoints have been
//! tested, a machine-readable [`Report`] with one line per endpoint follows:
//!
//! ```text
//! endpoint,protocol,result,objects_written
//! 10.0.0.5,s3,SUCCESS,10000
//! 10.0.0.6,s3,FAILED TO CONNECT,
//! ```

use std::fmt;
use std::io::{self, IsTerminal};

use bytesize::ByteSize;
use s3tester_core::WriteTestOutcome;
use yansi::{Condition, Paint};

/// Header line of the report.
pub const HEADER: &str = "endpoint,protocol,result,objects_written";

/// The protocol column; only S3 is tested.
const PROTOCOL: &str = "s3";

/// How testing a single endpoint ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndpointStatus {
    /// The write test ran to completion.
    Success {
        /// Number of objects the endpoint confirmed.
        objects_written: u64,
    },
    /// The endpoint could not be reached or the bucket could not be listed.
    FailedToConnect,
    /// The write test could not be completed.
    Failed,
}

/// One line of the [`Report`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointReport {
    /// The endpoint as it was configured.
    pub endpoint: String,
    /// The outcome for this endpoint.
    pub status: EndpointStatus,
}

impl EndpointReport {
    /// A successful test of `endpoint`.
    pub fn success(endpoint: &str, objects_written: u64) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            status: EndpointStatus::Success { objects_written },
        }
    }

    /// A test of `endpoint` that failed the preflight check.
    pub fn failed_to_connect(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            status: EndpointStatus::FailedToConnect,
        }
    }

    /// A test of `endpoint` that was aborted.
    pub fn failed(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            status: EndpointStatus::Failed,
        }
    }
}

impl fmt::Display for EndpointReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{PROTOCOL},", self.endpoint)?;
        match self.status {
            EndpointStatus::Success { objects_written } => write!(f, "SUCCESS,{objects_written}"),
            EndpointStatus::FailedToConnect => write!(f, "FAILED TO CONNECT,"),
            EndpointStatus::Failed => write!(f, "FAILED,"),
        }
    }
}

/// Results of all tested endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Report {
    rows: Vec<EndpointReport>,
}

impl Report {
    /// Appends the result of one endpoint.
    pub fn push(&mut self, row: EndpointReport) {
        self.rows.push(row);
    }

    /// All results in the order the endpoints were tested.
    pub fn rows(&self) -> &[EndpointReport] {
        &self.rows
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{HEADER}")?;
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Human-readable summary of one write test.
///
/// Styling is only applied if `styled` is set; use [`print_summary`] to decide this based on
/// whether stdout is a terminal.
#[derive(Debug)]
pub struct Summary<'a> {
    outcome: &'a WriteTestOutcome,
    styled: bool,
}

impl<'a> Summary<'a> {
    /// Creates a summary of `outcome`.
    pub fn new(outcome: &'a WriteTestOutcome, styled: bool) -> Self {
        Self { outcome, styled }
    }
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let when = if self.styled {
            Condition::ALWAYS
        } else {
            Condition::NEVER
        };
        let result = &self.outcome.result;

        write!(
            f,
            "{} {}",
            "Objects Written =".bold().green().whenever(when),
            result.objects_written.bold().whenever(when)
        )?;
        if result.write_failures > 0 {
            let failures = format!("{} FAILURES", result.write_failures);
            write!(f, " ({})", failures.bold().red().whenever(when))?;
        }
        writeln!(f)?;

        let throughput = ByteSize::b(self.outcome.throughput() as u64);
        writeln!(
            f,
            "  {} in {:.2?}, {}/s",
            ByteSize::b(result.bytes_written),
            self.outcome.elapsed,
            throughput.bold().whenever(when)
        )
    }
}

/// Prints the summary of one write test to stdout, styled only if stdout is a terminal.
pub fn print_summary(outcome: &WriteTestOutcome) {
    print!("{}", Summary::new(outcome, io::stdout().is_terminal()));
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use s3tester_core::TestResult;

    use super::*;

    fn outcome(write_failures: u64) -> WriteTestOutcome {
        WriteTestOutcome {
            result: TestResult {
                objects_written: 10,
                bytes_written: 81920,
                write_failures,
            },
            elapsed: Duration::from_secs(2),
        }
    }

    #[test]
    fn report_lines() {
        let mut report = Report::default();
        report.push(EndpointReport::success("10.0.0.5", 10));
        report.push(EndpointReport::failed_to_connect("10.0.0.6"));
        report.push(EndpointReport::failed("10.0.0.7"));

        assert_eq!(
            report.to_string(),
            "endpoint,protocol,result,objects_written\n\
             10.0.0.5,s3,SUCCESS,10\n\
             10.0.0.6,s3,FAILED TO CONNECT,\n\
             10.0.0.7,s3,FAILED,\n"
        );
    }

    #[test]
    fn empty_report_has_header() {
        assert_eq!(Report::default().to_string(), format!("{HEADER}\n"));
    }

    #[test]
    fn plain_summary_has_no_escape_codes() {
        let outcome = outcome(3);
        let summary = Summary::new(&outcome, false).to_string();

        assert!(!summary.contains('\x1b'), "{summary:?}");
        assert!(summary.starts_with("Objects Written = 10 (3 FAILURES)\n"), "{summary:?}");
        assert!(summary.contains(" in 2.00s, "), "{summary:?}");
    }

    #[test]
    fn styled_summary() {
        let outcome = outcome(0);
        let summary = Summary::new(&outcome, true).to_string();

        assert!(summary.contains("\x1b["), "{summary:?}");
        assert!(summary.contains("Objects Written ="), "{summary:?}");
        assert!(!summary.contains("FAILURES"), "{summary:?}");
    }
}
