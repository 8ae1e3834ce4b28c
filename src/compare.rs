//! Golden-output comparison.

use crate::test::{CapturedOutput, RunResult, TestCase};
use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// A leading `[location] ` tag in front of `ERROR`, e.g. `[/abs/file.vmake:3] ERROR`.
/// The location embeds absolute paths, so it is dropped before comparing.
static LOCATION_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[.+?\]\sERROR").expect("valid location tag regex"));

/// Strips one leading location tag that directly precedes `ERROR`.
pub fn normalize_stderr(stderr: &str) -> Cow<'_, str> {
    LOCATION_TAG.replacen(stderr, 1, "ERROR")
}

/// Checks one stream: exact equality when expected, emptiness otherwise.
fn stream_matches(expected: Option<&str>, actual: &str) -> bool {
    match expected {
        Some(expected) => actual == expected,
        None => actual.is_empty(),
    }
}

/// Compares captured streams with the golden files. Stderr is only checked
/// once stdout has matched.
pub fn compare(
    expected_stdout: Option<&str>,
    expected_stderr: Option<&str>,
    stdout: &str,
    stderr: &str,
) -> bool {
    stream_matches(expected_stdout, stdout)
        && stream_matches(expected_stderr, &normalize_stderr(stderr))
}

/// Builds the [`RunResult`] for a case from its captured output.
pub fn check(case: &TestCase, output: CapturedOutput) -> RunResult {
    let stderr = normalize_stderr(&output.stderr).into_owned();
    let passed = stream_matches(case.expected_stdout.as_deref(), &output.stdout)
        && stream_matches(case.expected_stderr.as_deref(), &stderr);
    RunResult {
        passed,
        stdout: output.stdout,
        stderr,
    }
}
