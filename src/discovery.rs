use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::errors::{HarnessError, Result};
use crate::test::TestCase;

// =====================
// Types
// =====================

/// Suite name → cases, both in deterministic order.
pub type Suites = BTreeMap<String, Vec<TestCase>>;

/// Suite name for cases whose parent is the discovery root.
pub const ROOT_SUITE: &str = ".";

/// Why a leaf directory was not turned into a test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoExpectedOutput,
    NoSource,
    DuplicateSource { first: PathBuf, second: PathBuf },
    Unreadable { file: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    InputNotSupported,
    Skipped(SkipReason),
}

/// A non-fatal discovery problem, tied to the directory it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryWarning {
    /// Directory relative to the discovery root.
    pub directory: PathBuf,
    pub kind: WarningKind,
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = self.directory.display();
        match &self.kind {
            WarningKind::InputNotSupported => {
                write!(f, "Reading from stdin is not yet supported for VMake ({})", dir)
            }
            WarningKind::Skipped(SkipReason::NoExpectedOutput) => write!(
                f,
                "No output or error file was found. The test in {} will be skipped",
                dir
            ),
            WarningKind::Skipped(SkipReason::NoSource) => write!(
                f,
                "No VMake file was found. The test in {} will be skipped",
                dir
            ),
            WarningKind::Skipped(SkipReason::DuplicateSource { first, second }) => write!(
                f,
                "Cannot have more than one VMake file for test ({} and {}). The test in {} will be skipped",
                file_name(first),
                file_name(second),
                dir
            ),
            WarningKind::Skipped(SkipReason::Unreadable { file, message }) => write!(
                f,
                "Could not read {} ({}). The test in {} will be skipped",
                file_name(file),
                message,
                dir
            ),
        }
    }
}

/// Everything discovery found under one root.
#[derive(Debug, Default)]
pub struct Discovery {
    pub suites: Suites,
    pub skipped: usize,
    pub warnings: Vec<DiscoveryWarning>,
}

impl Discovery {
    pub fn case_count(&self) -> usize {
        self.suites.values().map(Vec::len).sum()
    }
}

/// Classifies leaf directories under a root into test cases.
///
/// A leaf is a directory with no subdirectories and at least one file. Inside a
/// leaf, files are recognized by name:
/// - `in` / `input`: text fed to the executable's stdin
/// - `out` / `output`: expected stdout
/// - `error`: expected stderr
/// - `*.<source_extension>`: the build description passed as the only argument
#[derive(Debug, Clone)]
pub struct TestDiscoverer {
    source_extension: String,
}

impl TestDiscoverer {
    pub fn new(source_extension: impl Into<String>) -> Self {
        Self {
            source_extension: source_extension.into(),
        }
    }

    fn is_source_file(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .is_some_and(|ext| ext == self.source_extension.as_str())
    }

    // =====================
    // Public API
    // =====================

    /// Walks `root` and returns every valid case grouped by suite.
    ///
    /// Malformed fixtures never fail discovery; they are reported as warnings.
    /// Only a traversal error (e.g. missing root) is returned as `Err`.
    pub fn discover<P: AsRef<Path>>(&self, root: P) -> Result<Discovery> {
        let root = root.as_ref();
        let mut discovery = Discovery::default();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_dir() {
                continue;
            }
            let dir = entry.path();
            let Some(files) = leaf_files(dir)? else {
                continue;
            };
            trace!(dir = %dir.display(), files = files.len(), "leaf");

            let relative = dir.strip_prefix(root).unwrap_or(dir).to_path_buf();
            match self.make_test(dir, &relative, &files, &mut discovery.warnings) {
                Ok(case) => {
                    let suite = suite_name(root, dir);
                    debug!(suite = %suite, case = %case.name(), "discovered");
                    discovery.suites.entry(suite).or_default().push(case);
                }
                Err(reason) => {
                    discovery.skipped += 1;
                    discovery.warnings.push(DiscoveryWarning {
                        directory: relative,
                        kind: WarningKind::Skipped(reason),
                    });
                }
            }
        }

        for cases in discovery.suites.values_mut() {
            cases.sort();
        }
        Ok(discovery)
    }

    // =====================
    // Internal - Fixture Validation
    // =====================

    /// Builds a case from a leaf directory's files, or says why it cannot.
    fn make_test(
        &self,
        dir: &Path,
        relative: &Path,
        files: &[String],
        warnings: &mut Vec<DiscoveryWarning>,
    ) -> std::result::Result<TestCase, SkipReason> {
        let mut input = None;
        let mut output = None;
        let mut error = None;
        let mut source: Option<PathBuf> = None;
        let mut duplicate = None;

        for name in files {
            let path = dir.join(name);
            match name.as_str() {
                "out" | "output" => output = Some(read_fixture(&path)?),
                "in" | "input" => input = Some(read_fixture(&path)?),
                "error" => error = Some(read_fixture(&path)?),
                _ if self.is_source_file(name) => match source.clone() {
                    None => source = Some(path),
                    Some(first) => {
                        duplicate.get_or_insert(SkipReason::DuplicateSource {
                            first,
                            second: path,
                        });
                    }
                },
                _ => {}
            }
        }

        if input.is_some() {
            warnings.push(DiscoveryWarning {
                directory: relative.to_path_buf(),
                kind: WarningKind::InputNotSupported,
            });
        }
        if let Some(reason) = duplicate {
            return Err(reason);
        }
        if output.is_none() && error.is_none() {
            return Err(SkipReason::NoExpectedOutput);
        }
        let source_path = source.ok_or(SkipReason::NoSource)?;

        Ok(TestCase {
            directory: dir.to_path_buf(),
            input,
            expected_stdout: output,
            expected_stderr: error,
            source_path,
        })
    }
}

// =====================
// Helpers
// =====================

/// Sorted file names of `dir` if it is a leaf, `None` otherwise.
fn leaf_files(dir: &Path) -> Result<Option<Vec<String>>> {
    let read = fs::read_dir(dir).map_err(|e| {
        HarnessError::io(format!("Failed to list {}", dir.display()), e)
    })?;
    let mut files = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| {
            HarnessError::io(format!("Failed to list {}", dir.display()), e)
        })?;
        let path = entry.path();
        if path.is_dir() {
            return Ok(None);
        }
        if path.is_file() {
            files.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    if files.is_empty() {
        return Ok(None);
    }
    files.sort();
    Ok(Some(files))
}

fn read_fixture(path: &Path) -> std::result::Result<String, SkipReason> {
    fs::read_to_string(path).map_err(|e| SkipReason::Unreadable {
        file: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Path of the case directory's parent relative to the root, `/`-separated.
fn suite_name(root: &Path, case_dir: &Path) -> String {
    let parent = case_dir.parent().unwrap_or(case_dir);
    let relative = match parent.strip_prefix(root) {
        Ok(rel) => rel,
        Err(_) => return ROOT_SUITE.to_string(),
    };
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        ROOT_SUITE.to_string()
    } else {
        parts.join("/")
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
