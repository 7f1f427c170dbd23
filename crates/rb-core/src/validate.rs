//! Regex rule validation.
//!
//! `regex:` rules come straight from user input, so patterns are screened
//! before anything compiles them on the matching path. Static shape checks
//! run first and short-circuit; compilation is attempted only once they all
//! pass.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Longest accepted pattern.
pub const MAX_PATTERN_LEN: usize = 200;

/// A quantified group that is itself quantified, e.g. `(a+)+`.
static NESTED_QUANTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\([^)]*(?:\*|\+|\{\d+,?\d*\})[^)]*\)(?:\*|\+|\{\d+,?\d*\})")
        .expect("nested-quantifier pattern is a valid regex")
});

/// Why a pattern was rejected.
///
/// Display strings are surfaced verbatim by rule-authoring UIs; [`code`] is
/// the stable machine-readable form.
///
/// [`code`]: PatternIssue::code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PatternIssue {
    #[error("regex pattern is empty")]
    Empty,
    #[error("regex pattern is too long")]
    TooLong,
    #[error("regex contains nested quantifiers")]
    NestedQuantifier,
    #[error("regex contains a backreference")]
    Backreference,
    #[error("regex pattern is invalid")]
    InvalidRegex,
}

impl PatternIssue {
    /// Stable kebab-case identifier for UI and wire surfaces.
    pub fn code(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::TooLong => "too-long",
            Self::NestedQuantifier => "nested-quantifier",
            Self::Backreference => "backreference",
            Self::InvalidRegex => "invalid-regex",
        }
    }
}

fn has_backreference(pattern: &str) -> bool {
    pattern
        .as_bytes()
        .windows(2)
        .any(|pair| pair[0] == b'\\' && pair[1].is_ascii_digit())
}

/// Screen a `regex:` rule pattern.
///
/// Checks run in a fixed priority order and the first violation wins:
/// empty, too long, nested quantifier (catastrophic-backtracking guard),
/// backreference, failure to compile.
pub fn validate_regex_pattern(pattern: &str) -> Result<(), PatternIssue> {
    if pattern.is_empty() {
        return Err(PatternIssue::Empty);
    }
    if pattern.len() > MAX_PATTERN_LEN {
        return Err(PatternIssue::TooLong);
    }
    if NESTED_QUANTIFIER.is_match(pattern) {
        return Err(PatternIssue::NestedQuantifier);
    }
    if has_backreference(pattern) {
        return Err(PatternIssue::Backreference);
    }
    if Regex::new(pattern).is_err() {
        return Err(PatternIssue::InvalidRegex);
    }
    Ok(())
}
