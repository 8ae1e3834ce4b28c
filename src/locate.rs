//! Finds the executable under test.
//!
//! An explicit file path wins outright. Otherwise a fixed list of recursive glob
//! patterns is tried in order and the first pattern with any match is used.

use crate::errors::{HarnessError, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Search roots relative to the search base, in priority order.
const SEARCH_ROOTS: [&str; 3] = ["", "../build/", "../"];

/// How the harness was told to find the executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint {
    /// No positional argument.
    None,
    /// An existing file: used as-is.
    Path(PathBuf),
    /// Anything else: a directory name that narrows the search.
    Filter(String),
}

impl Hint {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Hint::None,
            Some(arg) if Path::new(arg).is_file() => Hint::Path(PathBuf::from(arg)),
            Some(arg) => Hint::Filter(arg.to_string()),
        }
    }
}

/// One pattern to try: the escaped base plus a case-insensitive tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPattern {
    /// Human-readable form, e.g. `./**/vaq-make`.
    pub display: String,
    /// What is handed to `glob`.
    pub glob: String,
}

/// Result of a successful search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub path: PathBuf,
    /// The pattern that matched, `None` when the path was given explicitly.
    pub pattern: Option<String>,
    /// More than one file matched; the first one was taken.
    pub ambiguous: bool,
}

/// Turns every ASCII letter into a `[xX]` class so `glob` matches it in either case.
pub fn case_insensitive(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 4);
    for ch in pattern.chars() {
        if ch.is_alphabetic() {
            out.push('[');
            out.extend(ch.to_lowercase());
            out.extend(ch.to_uppercase());
            out.push(']');
        } else {
            out.push(ch);
        }
    }
    out
}

pub struct ExecutableLocator {
    base: PathBuf,
    name: String,
}

impl ExecutableLocator {
    pub fn new(base: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            name: name.into(),
        }
    }

    /// Patterns in the order they are tried. A filter produces a narrowed copy of
    /// every pattern, tried before the unfiltered ones.
    pub fn patterns(&self, filter: Option<&str>) -> Vec<SearchPattern> {
        let base = self.base.to_string_lossy();
        let base = base.trim_end_matches('/');
        let escaped = Pattern::escape(base);

        let unfiltered = SEARCH_ROOTS.iter().map(|root| format!("{}**/{}", root, self.name));
        let tails: Vec<String> = match filter {
            Some(filter) => SEARCH_ROOTS
                .iter()
                .map(|root| format!("{}**/{}/**/{}", root, filter, self.name))
                .chain(unfiltered)
                .collect(),
            None => unfiltered.collect(),
        };

        tails
            .into_iter()
            .map(|tail| SearchPattern {
                display: format!("{}/{}", base, tail),
                glob: format!("{}/{}", escaped, case_insensitive(&tail)),
            })
            .collect()
    }

    /// Resolves the executable, trying `on_search` before each pattern.
    pub fn locate<F>(&self, hint: &Hint, mut on_search: F) -> Result<Located>
    where
        F: FnMut(&SearchPattern),
    {
        let filter = match hint {
            Hint::Path(path) => {
                return Ok(Located {
                    path: path.clone(),
                    pattern: None,
                    ambiguous: false,
                })
            }
            Hint::Filter(filter) => Some(filter.as_str()),
            Hint::None => None,
        };

        let patterns = self.patterns(filter);
        for pattern in &patterns {
            on_search(pattern);
            let matches = search(&pattern.glob)?;
            debug!(pattern = %pattern.display, matches = matches.len(), "searched");
            let ambiguous = matches.len() > 1;
            if let Some(path) = matches.into_iter().next() {
                return Ok(Located {
                    path,
                    pattern: Some(pattern.display.clone()),
                    ambiguous,
                });
            }
        }

        Err(HarnessError::ExecutableNotFound {
            patterns: patterns
                .iter()
                .map(|p| p.display.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// All regular files matching `pattern`, in `glob`'s order. Unreadable entries are skipped.
fn search(pattern: &str) -> Result<Vec<PathBuf>> {
    Ok(glob::glob(pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect())
}
