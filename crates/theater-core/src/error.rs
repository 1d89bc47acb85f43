//! Error types for the match registry.
//!
//! Registry operations are mostly infallible: lookups that miss return
//! `false`/empty results. Creation is the one call that can refuse a
//! request, when a required parameter is absent.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// A required request parameter was not present.
    MissingParameter(&'static str),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::MissingParameter(key) => write!(f, "Missing parameter: {}", key),
        }
    }
}

impl std::error::Error for MatchError {}
