//! Case-insensitive text matching for filter expressions.
//!
//! Every filter flag (`-q`, `-s`, `-r`, `-d`) compiles to one [`Pattern`]
//! at startup. An unspecified flag falls back to the match-any default,
//! which downstream code can detect via [`Pattern::is_match_any`] — the
//! recipient evaluator treats a missing delay reason differently
//! depending on whether a reason filter was actually requested.

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::{MailqfError, Result};

/// Expression used when the caller supplies no filter at all.
const MATCH_ANY: &str = ".";

/// A compiled case-insensitive regular expression plus its source text.
///
/// Matching is an unanchored substring search, per `postqueue` filtering
/// convention. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    source: String,
}

impl Pattern {
    /// Compile `expr` case-insensitively.
    ///
    /// Invalid regex syntax is a configuration error and must be surfaced
    /// before any record is processed.
    pub fn new(expr: &str) -> Result<Self> {
        let regex = RegexBuilder::new(expr)
            .case_insensitive(true)
            .build()
            .map_err(|source| MailqfError::InvalidPattern {
                pattern: expr.to_string(),
                source,
            })?;
        Ok(Self {
            regex,
            source: expr.to_string(),
        })
    }

    /// The default pattern: matches any non-empty candidate.
    pub fn match_any() -> Self {
        // "." is always valid regex syntax.
        Self::new(MATCH_ANY).unwrap_or_else(|_| unreachable!())
    }

    /// True when this pattern is the match-any default.
    pub fn is_match_any(&self) -> bool {
        self.source == MATCH_ANY
    }

    /// The original expression text, for diagnostics.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True iff `candidate` is non-empty and contains a match.
    pub fn matches(&self, candidate: &str) -> bool {
        if !candidate.is_empty() && self.regex.is_match(candidate) {
            return true;
        }
        debug!("\"{}\" does not match \"{}\"", candidate, self.source);
        false
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::match_any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_any_matches_anything_nonempty() {
        let p = Pattern::match_any();
        assert!(p.matches("eggs"));
        assert!(p.matches("x"));
    }

    #[test]
    fn test_empty_candidate_never_matches() {
        assert!(!Pattern::match_any().matches(""));
        assert!(!Pattern::new(".*").unwrap().matches(""));
    }

    #[test]
    fn test_substring_search_unanchored() {
        let p = Pattern::new("example").unwrap();
        assert!(p.matches("alice@example.org"));
    }

    #[test]
    fn test_anchored_mismatch() {
        let p = Pattern::new("^ham$").unwrap();
        assert!(!p.matches("eggs"));
        assert!(p.matches("ham"));
    }

    #[test]
    fn test_case_insensitive() {
        let p = Pattern::new("DEFERRED").unwrap();
        assert!(p.matches("deferred"));
        let p = Pattern::new(r"@Example\.NET$").unwrap();
        assert!(p.matches("ned@example.net"));
    }

    #[test]
    fn test_is_match_any() {
        assert!(Pattern::match_any().is_match_any());
        assert!(!Pattern::new(".*").unwrap().is_match_any());
        assert!(!Pattern::new("over quota").unwrap().is_match_any());
    }

    #[test]
    fn test_invalid_syntax_is_config_error() {
        let err = Pattern::new("[unclosed").unwrap_err();
        assert!(err.to_string().contains("Invalid filter pattern"));
    }

    #[test]
    fn test_source_preserved() {
        let p = Pattern::new(r"@example\.net$").unwrap();
        assert_eq!(p.source(), r"@example\.net$");
    }
}
