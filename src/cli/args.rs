//! Defines the command-line arguments for the harness.
//!
//! The positional argument keeps the historical contract: nothing, an
//! executable path, or a filter. Everything else is an optional flag.

use crate::config::{ColorMode, FileOverrides, HarnessConfig, Palette};
use crate::errors::{HarnessError, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "test_runner",
    version,
    about = "Runs vaq-make against fixture directories and compares its output with golden files."
)]
pub struct HarnessArgs {
    /// Path to the vaq-make executable, or a directory name that narrows the search for it.
    #[arg(value_name = "vmake_executable_path | pattern")]
    pub target: Vec<String>,

    /// Root of the fixture tree.
    #[arg(long, default_value = "test")]
    pub root: PathBuf,

    /// Directory the executable search patterns start from.
    #[arg(long, default_value = ".")]
    pub search_base: PathBuf,

    /// Extension of build-description files (without the dot).
    #[arg(long)]
    pub extension: Option<String>,

    /// Per-case time limit in milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Exit with status 1 when any case fails.
    #[arg(long)]
    pub strict: bool,

    /// When to use colors.
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,
}

impl HarnessArgs {
    /// The single positional argument, or a usage error if there are several.
    pub fn target(&self, program: &str) -> Result<Option<&str>> {
        match self.target.as_slice() {
            [] => Ok(None),
            [one] => Ok(Some(one.as_str())),
            _ => Err(HarnessError::Usage {
                program: program.to_string(),
            }),
        }
    }

    /// Defaults, then `harness.yaml` under the root, then these flags.
    pub fn config(&self) -> Result<HarnessConfig> {
        let mut config = HarnessConfig {
            test_root: self.root.clone(),
            search_base: self.search_base.clone(),
            strict: self.strict,
            color: self.color,
            palette: Palette::from_env(),
            ..HarnessConfig::default()
        };
        if let Some(overrides) = FileOverrides::load(&self.root)? {
            config.apply(overrides);
        }
        config.apply(FileOverrides {
            executable_name: None,
            source_extension: self.extension.clone(),
            timeout_ms: self.timeout_ms,
        });
        Ok(config)
    }
}

/// Program name for usage messages.
pub fn program_name(arg0: Option<&str>) -> String {
    arg0.and_then(|a| Path::new(a).file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "test_runner".to_string())
}
