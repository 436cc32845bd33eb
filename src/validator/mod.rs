//! Syntactic URL admission check.
//!
//! Accepts an optional `http`/`https` scheme, a dotted hostname whose last
//! label has at least two letters (or a dotted-quad IPv4 literal), and an
//! optional port, path, query and fragment. Letters and digits are ASCII
//! only. No network access happens here.

use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i-u)^(https?://)?",
        r"((([a-z\d]([a-z\d-]*[a-z\d])*)\.)+[a-z]{2,}|",
        r"((\d{1,3}\.){3}\d{1,3}))",
        r"(:\d+)?(/[-a-z\d%_.~+]*)*",
        r"(\?[;&a-z\d%_.~+=-]*)?",
        r"(#[-a-z\d_]*)?$",
    ))
    .expect("hardcoded URL pattern is valid")
});

/// Result of validating a batch of candidate URLs.
///
/// Both lists keep input order. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

impl Validation {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UrlValidator;

impl UrlValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check a single candidate after trimming surrounding whitespace.
    pub fn is_valid(&self, candidate: &str) -> bool {
        let candidate = candidate.trim();
        !candidate.is_empty() && URL_PATTERN.is_match(candidate)
    }

    /// Split candidates into accepted and rejected URLs.
    ///
    /// Accepted entries are stored trimmed; blank candidates are rejected.
    pub fn validate<I, S>(&self, candidates: I) -> Validation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.validate_rows(candidates.into_iter().map(Some))
    }

    /// Like [`validate`](Self::validate) for rows that may be missing
    /// entirely, as produced by loosely structured input files.
    pub fn validate_rows<I, S>(&self, rows: I) -> Validation
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut validation = Validation::default();

        for row in rows {
            match row {
                Some(candidate) => {
                    let raw = candidate.as_ref();
                    if self.is_valid(raw) {
                        validation.accepted.push(raw.trim().to_string());
                    } else {
                        validation.rejected.push(raw.to_string());
                    }
                }
                None => validation.rejected.push(String::new()),
            }
        }

        validation
    }
}
