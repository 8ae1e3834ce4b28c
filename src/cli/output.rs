//! Handles all user-facing output for the harness.
//!
//! The report (suites, cases, summary) goes to one stream and diagnostics
//! (discovery warnings, executable search progress) to another. Both are
//! `termcolor` writers, so tests can capture them in uncolored buffers.

// ============================================================================
// REPORTER
// ============================================================================

use crate::config::Palette;
use crate::diff::{highlight, Highlighted};
use crate::discovery::DiscoveryWarning;
use crate::locate::{Located, SearchPattern};
use crate::test::TestSummary;
use crate::test_harness::{CaseOutcome, Report};
use std::io::{self, Write};
use termcolor::{Color, ColorSpec, WriteColor};

/// Delimiters for divergent text when the writer cannot color it.
const DIVERGENCE_START: &str = "[[";
const DIVERGENCE_END: &str = "]]";

pub struct Reporter<O, E> {
    out: O,
    err: E,
    palette: Palette,
}

impl<O: WriteColor, E: WriteColor> Reporter<O, E> {
    pub fn new(out: O, err: E, palette: Palette) -> Self {
        Self { out, err, palette }
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    // ------------------------------------------------------------------------
    // Diagnostics stream
    // ------------------------------------------------------------------------

    pub fn warning(&mut self, warning: &DiscoveryWarning) -> io::Result<()> {
        let color = self.palette.warn;
        paint_line(&mut self.err, color, &warning.to_string())
    }

    pub fn no_hint(&mut self) -> io::Result<()> {
        let color = self.palette.detail;
        paint_line(&mut self.err, color, "vmake executable path not specified")
    }

    pub fn filtering(&mut self, filter: &str) -> io::Result<()> {
        let color = self.palette.detail;
        paint_line(
            &mut self.err,
            color,
            &format!("Looking for vmake executable that matches pattern '{}'", filter),
        )
    }

    pub fn searching(&mut self, pattern: &SearchPattern) -> io::Result<()> {
        let color = self.palette.detail;
        paint_line(
            &mut self.err,
            color,
            &format!("Searching in {}", pattern.display),
        )
    }

    pub fn located(&mut self, located: &Located) -> io::Result<()> {
        let path = located.path.display();
        if located.ambiguous {
            let color = self.palette.detail;
            paint_line(
                &mut self.err,
                color,
                &format!("Found multiple matches. Taking {}", path),
            )
        } else {
            let color = self.palette.success;
            paint_line(&mut self.err, color, &format!("Found executable at {}", path))
        }
    }

    // ------------------------------------------------------------------------
    // Report stream
    // ------------------------------------------------------------------------

    pub fn suite_header(&mut self, suite: &str) -> io::Result<()> {
        let color = self.palette.info;
        paint(&mut self.out, color, &format!("Suite '{}'", suite))?;
        writeln!(self.out, ":")
    }

    pub fn case_result(&mut self, name: &str, outcome: &CaseOutcome) -> io::Result<()> {
        if outcome.passed() {
            let color = self.palette.success;
            return paint_line(&mut self.out, color, &format!("  Test '{}' passed", name));
        }
        let color = self.palette.error;
        paint_line(&mut self.out, color, &format!("  Test '{}' failed", name))?;
        match outcome {
            CaseOutcome::Completed {
                expected_stdout,
                expected_stderr,
                result,
            } => {
                self.compare_stream(expected_stdout.as_deref(), &result.stdout, "stdout")?;
                self.compare_stream(expected_stderr.as_deref(), &result.stderr, "stderr")
            }
            CaseOutcome::Errored(error) => {
                paint_line(&mut self.out, color, &format!("    Could not run: {}", error))
            }
        }
    }

    /// Shows how one captured stream departs from its golden file.
    fn compare_stream(&mut self, expected: Option<&str>, found: &str, name: &str) -> io::Result<()> {
        let palette = self.palette.clone();
        match expected {
            Some(expected) if expected == found => Ok(()),
            Some(expected) => {
                paint_line(&mut self.out, palette.error, &format!("    Expected ({}):", name))?;
                write_block(&mut self.out, expected)?;
                if found.is_empty() {
                    paint_line(
                        &mut self.out,
                        palette.warn,
                        &format!("    Found nothing in {}", name),
                    )
                } else {
                    paint_line(&mut self.out, palette.detail, &format!("    Found ({}):", name))?;
                    self.write_highlighted(&highlight(expected, found))
                }
            }
            None if found.is_empty() => Ok(()),
            None => {
                paint_line(
                    &mut self.out,
                    palette.error,
                    &format!("    Expected nothing ({})", name),
                )?;
                paint_line(&mut self.out, palette.detail, &format!("    Found ({}):", name))?;
                write_block(&mut self.out, found)
            }
        }
    }

    fn write_highlighted(&mut self, highlighted: &Highlighted) -> io::Result<()> {
        let colored = self.out.supports_color();
        let mut at_line_start = true;
        for run in &highlighted.runs {
            if run.divergent && !colored {
                write!(self.out, "{}{}{}", DIVERGENCE_START, run.text, DIVERGENCE_END)?;
                at_line_start = false;
                continue;
            }
            if run.divergent {
                self.out
                    .set_color(ColorSpec::new().set_fg(Some(self.palette.error)))?;
                write!(self.out, "{}", run.text)?;
                self.out.reset()?;
            } else {
                write!(self.out, "{}", run.text)?;
            }
            at_line_start = run.text.ends_with('\n');
        }
        if !at_line_start {
            writeln!(self.out)?;
        }
        Ok(())
    }

    pub fn suite_summary(&mut self, suite: &str, summary: &TestSummary) -> io::Result<()> {
        let color = self.palette.info;
        paint(&mut self.out, color, &format!("Suite '{}'", suite))?;
        write!(self.out, ": ")?;
        self.tally(summary)
    }

    pub fn summary(&mut self, report: &Report) -> io::Result<()> {
        writeln!(self.out)?;
        let color = self.palette.info;
        paint(&mut self.out, color, "Summary")?;
        write!(self.out, ": ")?;
        self.tally(&report.totals())?;
        if report.skipped > 0 {
            let color = self.palette.warn;
            paint_line(
                &mut self.out,
                color,
                &format!(
                    "Skipped {} test{}. This probably means some tests were not created correctly and should be fixed",
                    report.skipped,
                    if report.skipped > 1 { "s" } else { "" }
                ),
            )?;
        }
        self.out.flush()
    }

    fn tally(&mut self, summary: &TestSummary) -> io::Result<()> {
        let total = summary.total_tests();
        let palette = self.palette.clone();
        paint(
            &mut self.out,
            palette.success,
            &format!("{}/{} passed", summary.passed, total),
        )?;
        if summary.has_failures() {
            write!(self.out, ", ")?;
            paint(
                &mut self.out,
                palette.error,
                &format!("{}/{} failed", summary.failed, total),
            )?;
        }
        writeln!(self.out)
    }
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn paint<W: WriteColor>(w: &mut W, color: Color, text: &str) -> io::Result<()> {
    w.set_color(ColorSpec::new().set_fg(Some(color)))?;
    write!(w, "{}", text)?;
    w.reset()
}

fn paint_line<W: WriteColor>(w: &mut W, color: Color, text: &str) -> io::Result<()> {
    paint(w, color, text)?;
    writeln!(w)
}

/// Writes golden/captured text verbatim, ending it with a newline if it has none.
fn write_block<W: Write>(w: &mut W, text: &str) -> io::Result<()> {
    write!(w, "{}", text)?;
    if !text.ends_with('\n') {
        writeln!(w)?;
    }
    Ok(())
}
