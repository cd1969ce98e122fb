//! Path exclusion for changed files, applied before any content fetch.
//!
//! Two pattern forms, checked in file order:
//! - patterns ending in `/` are directory excludes matched as a literal
//!   prefix of the whole path;
//! - everything else is a whole-path wildcard where `*` matches any run of
//!   characters and `?` matches exactly one.
//!
//! Wildcard translation goes through `regex::escape`, so a pattern that is
//! not a meaningful glob still behaves as literal text instead of breaking
//! the filter.

use std::fs;
use std::path::Path;

use regex::Regex;
use tracing::debug;

/// Read-only set of ignore patterns. Safe for concurrent reads.
#[derive(Debug)]
pub struct IgnoreFilter {
    patterns: Vec<Pattern>,
}

#[derive(Debug)]
enum Pattern {
    /// `dir/` form: literal prefix over the whole path.
    DirPrefix(String),
    /// Wildcard form: anchored at both ends.
    Wildcard(Regex),
}

impl IgnoreFilter {
    /// Loads patterns from an optional pattern-list file, one per line in
    /// file order, blank lines dropped. A missing or unreadable file yields
    /// an empty filter that never ignores anything.
    pub fn from_file(path: &Path) -> Self {
        let lines = match fs::read_to_string(path) {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>(),
            Err(_) => Vec::new(),
        };
        let filter = Self::from_patterns(lines);
        debug!(
            path = %path.display(),
            patterns = filter.len(),
            "ignore filter loaded"
        );
        filter
    }

    /// Builds a filter from an ordered pattern list.
    pub fn from_patterns<I>(patterns: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                if p.ends_with('/') {
                    Pattern::DirPrefix(p)
                } else {
                    Pattern::Wildcard(wildcard_to_regex(&p))
                }
            })
            .collect();
        Self { patterns }
    }

    /// Whether a changed-file path is excluded from review.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| match pattern {
            Pattern::DirPrefix(prefix) => path.starts_with(prefix.as_str()),
            Pattern::Wildcard(re) => re.is_match(path),
        })
    }

    /// Number of loaded patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the filter carries no patterns at all.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Translates a wildcard pattern into an anchored regex. Escaping first
/// guarantees the result always compiles, whatever the input.
fn wildcard_to_regex(pattern: &str) -> Regex {
    let escaped = regex::escape(pattern)
        .replace(r"\*", ".*")
        .replace(r"\?", ".");
    Regex::new(&format!("^{escaped}$")).expect("escaped wildcard is a valid regex")
}
