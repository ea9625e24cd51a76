//! Node name patterns declared by catalog packages

use regex::Regex;
use std::fmt;

use crate::error::PatternError;

/// A compiled `nodename_pattern`
///
/// Matching is an unanchored, case-sensitive search: the pattern only has
/// to match somewhere in the candidate unless it anchors itself.
#[derive(Clone)]
pub struct NodePattern {
    regex: Regex,
}

impl NodePattern {
    /// Compile a pattern, failing on invalid regex syntax
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|e| PatternError::new(pattern, &e))
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

impl fmt::Debug for NodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodePattern").field(&self.as_str()).finish()
    }
}
