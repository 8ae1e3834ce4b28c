//! VMake Conformance Harness Driver
//!
//! Runs every discovered case against the located executable and tallies the
//! results per suite and overall.
//!
//! # Architecture
//!
//! 1. **Discovery**: [`crate::discovery`] turns leaf fixture directories into cases
//! 2. **Execution**: [`crate::test::runner`] runs the executable once per case
//! 3. **Comparison**: [`crate::compare`] checks captured streams against golden files
//! 4. **Reporting**: [`crate::cli::output`] prints per-case detail and summaries
//!
//! Suites run in name order and cases within a suite in directory order, one at a
//! time. A case that cannot run (spawn failure, timeout) fails on its own and the
//! run moves on to the next case.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use termcolor::{ColorChoice, StandardStream};
//! use vmake_harness::cli::output::Reporter;
//! use vmake_harness::config::Palette;
//! use vmake_harness::discovery::TestDiscoverer;
//! use vmake_harness::test::runner::TestRunner;
//! use vmake_harness::test_harness::run_all_tests;
//!
//! let discovery = TestDiscoverer::new("vmake").discover("test").unwrap();
//! let runner = TestRunner::new("build/vaq-make", Duration::from_secs(1));
//! let mut reporter = Reporter::new(
//!     StandardStream::stdout(ColorChoice::Auto),
//!     StandardStream::stderr(ColorChoice::Auto),
//!     Palette::default(),
//! );
//! let report = run_all_tests(&discovery, &runner, &mut reporter).unwrap();
//! if report.has_failures() {
//!     std::process::exit(1);
//! }
//! ```

use crate::cli::output::Reporter;
use crate::compare;
use crate::discovery::Discovery;
use crate::errors::{HarnessError, Result, RunError};
use crate::test::runner::TestRunner;
use crate::test::{RunResult, TestCase, TestSummary};
use std::collections::BTreeMap;
use termcolor::WriteColor;
use tracing::{info, warn};

// =============================================================================
// CORE TYPES
// =============================================================================

/// What happened to one case.
#[derive(Debug)]
pub enum CaseOutcome {
    /// The executable ran to completion and its output was compared.
    Completed {
        expected_stdout: Option<String>,
        expected_stderr: Option<String>,
        result: RunResult,
    },
    /// The executable could not be run or did not finish in time.
    Errored(RunError),
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, CaseOutcome::Completed { result, .. } if result.passed)
    }
}

/// Counters for a whole run. Suites are keyed by name, in report order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub suites: BTreeMap<String, TestSummary>,
    pub skipped: usize,
}

impl Report {
    pub fn totals(&self) -> TestSummary {
        self.suites
            .values()
            .fold(TestSummary::default(), |acc, s| TestSummary {
                passed: acc.passed + s.passed,
                failed: acc.failed + s.failed,
            })
    }

    pub fn has_failures(&self) -> bool {
        self.totals().has_failures()
    }
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Runs and checks a single case.
pub fn run_test_case(runner: &TestRunner, case: &TestCase) -> CaseOutcome {
    match runner.run(case) {
        Ok(output) => CaseOutcome::Completed {
            expected_stdout: case.expected_stdout.clone(),
            expected_stderr: case.expected_stderr.clone(),
            result: compare::check(case, output),
        },
        Err(error) => {
            warn!(case = %case.directory.display(), %error, "case did not complete");
            CaseOutcome::Errored(error)
        }
    }
}

/// Runs every suite in order, reporting as it goes, and returns the tallies.
pub fn run_all_tests<O, E>(
    discovery: &Discovery,
    runner: &TestRunner,
    reporter: &mut Reporter<O, E>,
) -> Result<Report>
where
    O: WriteColor,
    E: WriteColor,
{
    let mut report = Report {
        skipped: discovery.skipped,
        ..Report::default()
    };

    for (suite, cases) in &discovery.suites {
        reporter.suite_header(suite).map_err(HarnessError::Report)?;
        let mut summary = TestSummary::default();
        for case in cases {
            let outcome = run_test_case(runner, case);
            summary.record(outcome.passed());
            reporter
                .case_result(&case.name(), &outcome)
                .map_err(HarnessError::Report)?;
        }
        reporter
            .suite_summary(suite, &summary)
            .map_err(HarnessError::Report)?;
        info!(suite = %suite, passed = summary.passed, failed = summary.failed, "suite done");
        report.suites.insert(suite.clone(), summary);
    }

    reporter.summary(&report).map_err(HarnessError::Report)?;
    Ok(report)
}
