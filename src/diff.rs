//! Character-level divergence highlighting for failure reports.

use std::fmt;

/// A maximal run of characters that either match the expected text or diverge from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub divergent: bool,
}

/// `found`, split into alternating matching and divergent runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlighted {
    pub runs: Vec<Run>,
}

impl Highlighted {
    pub fn has_divergence(&self) -> bool {
        self.runs.iter().any(|run| run.divergent)
    }

    /// Renders the runs with the given start/end markers around divergent text.
    pub fn marked(&self, start: &str, end: &str) -> String {
        let mut out = String::new();
        for run in &self.runs {
            if run.divergent {
                out.push_str(start);
                out.push_str(&run.text);
                out.push_str(end);
            } else {
                out.push_str(&run.text);
            }
        }
        out
    }
}

impl fmt::Display for Highlighted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.marked("[[", "]]"))
    }
}

/// Walks `found` against `expected` index by index.
///
/// A character diverges when it differs from the expected character at the same
/// index, or when `found` has run past the end of `expected`. Comparison is by
/// position only; there is no realignment after an insertion.
pub fn highlight(expected: &str, found: &str) -> Highlighted {
    let expected: Vec<char> = expected.chars().collect();
    let mut runs: Vec<Run> = Vec::new();

    for (index, ch) in found.chars().enumerate() {
        let divergent = expected.get(index).map_or(true, |&e| e != ch);
        match runs.last_mut() {
            Some(run) if run.divergent == divergent => run.text.push(ch),
            _ => runs.push(Run {
                text: ch.to_string(),
                divergent,
            }),
        }
    }

    Highlighted { runs }
}
