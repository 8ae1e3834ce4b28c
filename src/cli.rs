//! The harness command-line entry point.
//!
//! Order of work: locate the executable, discover fixtures, run every suite,
//! print the summary. Only a usage error, a failed executable search, or an
//! unreadable test root stop the run early.

use std::ffi::OsString;

use clap::Parser;
use termcolor::{StandardStream, WriteColor};

use crate::{
    cli::{
        args::{program_name, HarnessArgs},
        output::Reporter,
    },
    discovery::TestDiscoverer,
    errors::{HarnessError, Result},
    locate::{ExecutableLocator, Hint, Located},
    test::runner::TestRunner,
    test_harness::run_all_tests,
};

pub mod args;
pub mod output;

/// Runs the harness and returns the process exit status.
pub fn run<I, T>(args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let program = program_name(args.first().and_then(|a| a.to_str()));
    let args = HarnessArgs::parse_from(args);
    let target = args.target(&program)?;
    let config = args.config()?;

    let mut reporter = Reporter::new(
        StandardStream::stdout(config.color.choice(atty::Stream::Stdout)),
        StandardStream::stderr(config.color.choice(atty::Stream::Stderr)),
        config.palette.clone(),
    );

    // ========================================================================
    // EXECUTABLE
    // ========================================================================

    let locator = ExecutableLocator::new(&config.search_base, &config.executable_name);
    let located = locate_executable(&mut reporter, &locator, &Hint::from_arg(target))?;

    // ========================================================================
    // DISCOVERY AND EXECUTION
    // ========================================================================

    let discovery = TestDiscoverer::new(&config.source_extension).discover(&config.test_root)?;
    for warning in &discovery.warnings {
        reporter.warning(warning).map_err(HarnessError::Report)?;
    }

    let runner = TestRunner::new(located.path, config.timeout);
    let report = run_all_tests(&discovery, &runner, &mut reporter)?;

    Ok(if config.strict && report.has_failures() { 1 } else { 0 })
}

/// Resolves the executable, reporting the hint and each pattern as it is tried.
fn locate_executable<O, E>(
    reporter: &mut Reporter<O, E>,
    locator: &ExecutableLocator,
    hint: &Hint,
) -> Result<Located>
where
    O: WriteColor,
    E: WriteColor,
{
    match hint {
        Hint::None => reporter.no_hint().map_err(HarnessError::Report)?,
        Hint::Filter(filter) => reporter.filtering(filter).map_err(HarnessError::Report)?,
        Hint::Path(_) => {}
    }

    let mut write_error = None;
    let located = locator.locate(hint, |pattern| {
        if write_error.is_none() {
            write_error = reporter.searching(pattern).err();
        }
    });
    if let Some(e) = write_error {
        return Err(HarnessError::Report(e));
    }
    let located = located?;
    if located.pattern.is_some() {
        reporter.located(&located).map_err(HarnessError::Report)?;
    }
    Ok(located)
}
