//! Name-search methods and queries.

use crate::ids::{EntityIdentifier, TypeTag};
use serde::{Deserialize, Serialize};

/// How a search pattern is matched against a candidate name.
///
/// All comparisons are case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMethod {
    /// Exact match.
    Is,
    /// Candidate starts with the pattern.
    StartsWith,
    /// Candidate ends with the pattern.
    EndsWith,
    /// Candidate contains the pattern anywhere.
    Contains,
}

impl SearchMethod {
    /// Returns true if `candidate` matches `pattern` under this method.
    #[must_use]
    pub fn matches(self, pattern: &str, candidate: &str) -> bool {
        match self {
            Self::Is => candidate == pattern,
            Self::StartsWith => candidate.starts_with(pattern),
            Self::EndsWith => candidate.ends_with(pattern),
            Self::Contains => candidate.contains(pattern),
        }
    }
}

/// A name search over the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The pattern to match names against.
    pub pattern: String,
    /// How the pattern is applied.
    pub method: SearchMethod,
    /// The leaf type of the entities (or groups-of-entities) wanted.
    pub leaf_type: TypeTag,
    /// When set, restricts results to the deep-member closure of this
    /// ancestor.
    pub scope_ancestor: Option<EntityIdentifier>,
}

impl SearchQuery {
    /// Creates an unscoped query.
    pub fn new(pattern: impl Into<String>, method: SearchMethod, leaf_type: TypeTag) -> Self {
        Self {
            pattern: pattern.into(),
            method,
            leaf_type,
            scope_ancestor: None,
        }
    }

    /// Restricts the query to descendants of `ancestor`.
    #[must_use]
    pub fn scoped_to(mut self, ancestor: EntityIdentifier) -> Self {
        self.scope_ancestor = Some(ancestor);
        self
    }
}
