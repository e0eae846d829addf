use regex::Regex;
use serde::Deserialize;
use std::fmt;

use crate::{ErrorKind, Result};

/// File extensions rewritten when no other set is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpe?g", "gif", "png", "bmp", "css", "js", "ico"];

/// The ordered set of file-extension patterns eligible for rewriting.
///
/// Each entry is a regular expression fragment matched right after the last
/// dot of an asset path, e.g. `jpe?g` matches both `.jpg` and `.jpeg`.
/// Patterns are validated when the set is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct Extensions(Vec<String>);

impl Extensions {
    /// Create a new extension set from the given patterns.
    ///
    /// Blank entries and duplicates are skipped and a leading `.` is
    /// dropped, so `".png"` and `"png"` are the same pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid regular expression.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut extensions: Vec<String> = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            let pattern = pattern.strip_prefix('.').unwrap_or(pattern);
            if pattern.is_empty() || extensions.iter().any(|e| e == pattern) {
                continue;
            }
            Regex::new(&format!("^(?:{pattern})$"))
                .map_err(|e| ErrorKind::InvalidExtension(pattern.to_string(), e))?;
            extensions.push(pattern.to_string());
        }
        Ok(Self(extensions))
    }

    /// Returns `true` if no extension is eligible, which turns every
    /// rewrite pass into a no-op.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of patterns
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the patterns in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// All patterns as one regex alternation, each wrapped in its own
    /// non-capturing group.
    pub(crate) fn alternation(&self) -> String {
        self.0
            .iter()
            .map(|pattern| format!("(?:{pattern})"))
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl Default for Extensions {
    fn default() -> Self {
        Self(DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect())
    }
}

impl TryFrom<Vec<String>> for Extensions {
    type Error = ErrorKind;

    fn try_from(patterns: Vec<String>) -> Result<Self> {
        Extensions::new(patterns)
    }
}

impl TryFrom<&[&str]> for Extensions {
    type Error = ErrorKind;

    fn try_from(patterns: &[&str]) -> Result<Self> {
        Extensions::new(patterns)
    }
}

impl fmt::Display for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(","))
    }
}
