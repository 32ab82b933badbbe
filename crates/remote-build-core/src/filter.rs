//! Compiled log filter.

use regex::Regex;

use crate::{Error, Result};

/// A compiled filter pattern. Lines the pattern does not match are hidden.
#[derive(Debug, Clone)]
pub struct LogFilter {
    regex: Regex,
}

impl LogFilter {
    /// Compile a filter pattern.
    ///
    /// Returns [`Error::FilterCompile`] for an invalid pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|e| Error::FilterCompile {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    /// The source pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether `line` stays visible (the pattern matches somewhere in it).
    pub fn is_visible(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

impl Default for LogFilter {
    /// Matches every non-empty line.
    fn default() -> Self {
        Self {
            regex: Regex::new(".").expect("literal pattern compiles"),
        }
    }
}
