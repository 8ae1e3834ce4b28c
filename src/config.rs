//! Harness configuration.
//!
//! A single [`HarnessConfig`] value is built once at startup and passed down to
//! every component that needs it. Sources, lowest to highest precedence:
//! built-in defaults, an optional `harness.yaml` at the test root, then
//! command-line flags.

use crate::errors::{HarnessError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use termcolor::{Color, ColorChoice};

pub const DEFAULT_EXECUTABLE_NAME: &str = "vaq-make";
pub const DEFAULT_SOURCE_EXTENSION: &str = "vmake";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
pub const CONFIG_FILE_NAME: &str = "harness.yaml";

/// Grey used for informational text on 256-color terminals.
const INFO_GREY_256: u8 = 253;

static TERM_256: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)-256(color)?$").expect("valid TERM regex"));

// =============================================================================
// DISPLAY
// =============================================================================

/// When to emit ANSI colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorMode {
    /// Color only when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn choice(self, stream: atty::Stream) -> ColorChoice {
        match self {
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
            ColorMode::Auto if atty::is(stream) => ColorChoice::Auto,
            ColorMode::Auto => ColorChoice::Never,
        }
    }
}

/// Colors used by the reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub info: Color,
    pub detail: Color,
    pub warn: Color,
    pub error: Color,
    pub success: Color,
}

impl Palette {
    /// Picks the info color from the terminal type. Nothing else depends on it.
    pub fn for_term(term: Option<&str>) -> Self {
        let info = match term {
            Some(term) if TERM_256.is_match(term) => Color::Ansi256(INFO_GREY_256),
            _ => Color::Blue,
        };
        Self {
            info,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self::for_term(std::env::var("TERM").ok().as_deref())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            info: Color::Blue,
            detail: Color::Cyan,
            warn: Color::Yellow,
            error: Color::Red,
            success: Color::Green,
        }
    }
}

// =============================================================================
// HARNESS CONFIG
// =============================================================================

/// Configuration for discovery, execution and reporting.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub test_root: PathBuf,
    pub search_base: PathBuf,
    pub executable_name: String,
    pub source_extension: String,
    pub timeout: Duration,
    pub strict: bool,
    pub palette: Palette,
    pub color: ColorMode,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test_root: PathBuf::from("test"),
            search_base: PathBuf::from("."),
            executable_name: DEFAULT_EXECUTABLE_NAME.to_string(),
            source_extension: DEFAULT_SOURCE_EXTENSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            strict: false,
            palette: Palette::default(),
            color: ColorMode::default(),
        }
    }
}

/// Overrides read from `harness.yaml`.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileOverrides {
    pub executable_name: Option<String>,
    pub source_extension: Option<String>,
    pub timeout_ms: Option<u64>,
}

impl FileOverrides {
    /// Reads `harness.yaml` from `root` if present.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .map_err(|e| HarnessError::io(format!("Failed to read {}", path.display()), e))?;
        let overrides = serde_yaml::from_str(&content)
            .map_err(|source| HarnessError::Config { path, source })?;
        Ok(Some(overrides))
    }
}

impl HarnessConfig {
    pub fn apply(&mut self, overrides: FileOverrides) {
        if let Some(name) = overrides.executable_name {
            self.executable_name = name;
        }
        if let Some(ext) = overrides.source_extension {
            self.source_extension = ext.trim_start_matches('.').to_string();
        }
        if let Some(ms) = overrides.timeout_ms {
            self.timeout = Duration::from_millis(ms);
        }
    }
}
