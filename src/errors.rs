//! Harness error types.
//!
//! Only conditions that stop the whole run live in [`HarnessError`]. Problems
//! confined to one fixture are data: discovery reports them as warnings and the
//! runner reports them as [`RunError`] values that fail a single case.

use miette::Diagnostic;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result alias for fallible harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

// ============================================================================
// FATAL ERRORS
// ============================================================================

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("Usage: {program} [vmake_executable_path | pattern]")]
    #[diagnostic(
        code(harness::usage),
        help("pass nothing to auto-search, a file path to use it directly, or a directory name filter")
    )]
    Usage { program: String },

    #[error("Could not find vmake executable (searched {patterns})")]
    #[diagnostic(
        code(harness::locate),
        help("build the tool first or pass its path explicitly")
    )]
    ExecutableNotFound { patterns: String },

    #[error("Invalid search pattern")]
    #[diagnostic(code(harness::locate::pattern))]
    Pattern(#[from] glob::PatternError),

    #[error("Failed to walk fixture directory")]
    #[diagnostic(
        code(harness::discovery),
        help("check that the test root exists and is readable")
    )]
    Walk(#[from] walkdir::Error),

    #[error("Invalid harness configuration in '{}'", .path.display())]
    #[diagnostic(code(harness::config))]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to write report")]
    #[diagnostic(code(harness::report))]
    Report(#[source] io::Error),

    #[error("{context}")]
    #[diagnostic(code(harness::io))]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl HarnessError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

// ============================================================================
// PER-CASE ERRORS
// ============================================================================

/// Why a single case produced no comparable output.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error while running case: {0}")]
    Io(#[from] io::Error),

    #[error("timed out after {}ms", .after.as_millis())]
    TimedOut { after: Duration },
}

impl RunError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunError::TimedOut { .. })
    }
}
