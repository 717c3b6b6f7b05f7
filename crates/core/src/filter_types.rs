//! Structured filter specification for retrieval requests.
//!
//! A [`FilterSpec`] has `required` clauses (all must hold), `optional` clauses
//! (at least `min_optional_matches` must hold) and `excluded` clauses (none may
//! hold). Values are kept as untagged JSON until compiled by
//! [`crate::search::filter::compile`], which rejects malformed clauses.

use serde::{Deserialize, Serialize};

/// How a clause matches an attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMatch {
    /// Holds if the attribute equals the value (or, for a list attribute, contains it).
    Equals(serde_json::Value),
    /// Holds if the attribute intersects the value set.
    AnyOf(Vec<serde_json::Value>),
}

/// A single `(field, operator, value)` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldClause {
    pub field: String,
    #[serde(flatten)]
    pub matcher: FieldMatch,
}

impl FieldClause {
    /// `field == value`
    pub fn equals(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            matcher: FieldMatch::Equals(value.into()),
        }
    }

    /// `field ∩ values ≠ ∅`
    pub fn any_of<V, I>(field: impl Into<String>, values: I) -> Self
    where
        V: Into<serde_json::Value>,
        I: IntoIterator<Item = V>,
    {
        Self {
            field: field.into(),
            matcher: FieldMatch::AnyOf(values.into_iter().map(Into::into).collect()),
        }
    }
}

/// Filter specification supplied by the caller (or by a filter policy).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub required: Vec<FieldClause>,
    #[serde(default)]
    pub optional: Vec<FieldClause>,
    #[serde(default)]
    pub excluded: Vec<FieldClause>,
    #[serde(default)]
    pub min_optional_matches: usize,
}

impl FilterSpec {
    /// Adds a required clause.
    pub fn require(mut self, clause: FieldClause) -> Self {
        self.required.push(clause);
        self
    }

    /// Adds an optional clause.
    pub fn prefer(mut self, clause: FieldClause) -> Self {
        self.optional.push(clause);
        self
    }

    /// Adds an excluded clause.
    pub fn exclude(mut self, clause: FieldClause) -> Self {
        self.excluded.push(clause);
        self
    }

    /// Sets the minimum number of optional clauses that must hold.
    pub fn min_optional(mut self, n: usize) -> Self {
        self.min_optional_matches = n;
        self
    }

    /// `true` when the spec constrains nothing.
    pub fn is_empty(&self) -> bool {
        self.required.is_empty()
            && self.excluded.is_empty()
            && (self.optional.is_empty() || self.min_optional_matches == 0)
    }
}
