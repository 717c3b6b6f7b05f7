//! Core document types for hybridsearch.
//!
//! A `Document` is an immutable passage produced by the ingestion pipeline:
//! a stable id, the text used for both embedding and lexical scoring, and a
//! map of filterable attributes. Attribute values are scalars or lists of
//! scalars (e.g. `equipment = ["dumbbell", "bands"]`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Stable document identifier, shared by the vector store and the lexical index.
pub type DocId = String;

/// Attribute map attached to a document.
pub type Attributes = HashMap<String, AttributeValue>;

/// A single scalar attribute value.
///
/// Uses the default externally-tagged serde representation for bincode compatibility.
/// Conversion to/from untagged JSON happens at the vector-store boundary
/// via [`Scalar::from_json`] and [`Scalar::to_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// Boolean value (`true` / `false`).
    Boolean(bool),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit floating-point number.
    Float(f64),
    /// UTF-8 string.
    String(String),
}

impl Scalar {
    /// Equality used by filter clauses. Integers and floats compare numerically.
    pub fn matches(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::String(a), Scalar::String(b)) => a == b,
            (Scalar::Boolean(a), Scalar::Boolean(b)) => a == b,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            (Scalar::Integer(i), Scalar::Float(f)) | (Scalar::Float(f), Scalar::Integer(i)) => {
                (*i as f64 - f).abs() < f64::EPSILON
            }
            (Scalar::Float(a), Scalar::Float(b)) => (a - b).abs() < f64::EPSILON,
            _ => false,
        }
    }

    /// Converts a JSON scalar. Returns `None` for null, arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Scalar::Boolean(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Scalar::Integer)
                .or_else(|| n.as_f64().map(Scalar::Float)),
            serde_json::Value::String(s) => Some(Scalar::String(s.clone())),
            _ => None,
        }
    }

    /// Converts to an untagged JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Boolean(b) => serde_json::Value::Bool(*b),
            Scalar::Integer(i) => serde_json::Value::from(*i),
            Scalar::Float(f) => serde_json::Value::from(*f),
            Scalar::String(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Integer(i)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Boolean(b)
    }
}

/// An attribute value: a scalar or a list of scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Scalar(Scalar),
    List(Vec<Scalar>),
}

impl AttributeValue {
    /// Iterates over the scalar(s) held by this value.
    pub fn scalars(&self) -> impl Iterator<Item = &Scalar> + '_ {
        let slice: &[Scalar] = match self {
            AttributeValue::Scalar(s) => std::slice::from_ref(s),
            AttributeValue::List(items) => items,
        };
        slice.iter()
    }

    /// `true` if any held scalar matches `value`.
    pub fn contains(&self, value: &Scalar) -> bool {
        self.scalars().any(|s| s.matches(value))
    }

    /// Converts a JSON payload value. Nested arrays and objects are skipped;
    /// returns `None` when nothing usable remains.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Array(items) => {
                let scalars: Vec<Scalar> = items.iter().filter_map(Scalar::from_json).collect();
                if scalars.is_empty() {
                    None
                } else {
                    Some(AttributeValue::List(scalars))
                }
            }
            other => Scalar::from_json(other).map(AttributeValue::Scalar),
        }
    }
}

impl From<Scalar> for AttributeValue {
    fn from(s: Scalar) -> Self {
        AttributeValue::Scalar(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Scalar(Scalar::from(s))
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(items: Vec<&str>) -> Self {
        AttributeValue::List(items.into_iter().map(Scalar::from).collect())
    }
}

/// Converts a JSON object payload into an attribute map, skipping `skip_key`
/// (typically the text payload key) and values that are not scalar or list-of-scalar.
pub fn attributes_from_json(
    payload: &serde_json::Map<String, serde_json::Value>,
    skip_key: &str,
) -> Attributes {
    payload
        .iter()
        .filter(|(k, _)| k.as_str() != skip_key)
        .filter_map(|(k, v)| AttributeValue::from_json(v).map(|av| (k.clone(), av)))
        .collect()
}

/// An indexed passage.
///
/// Documents are created by the ingestion collaborator and never mutated by
/// the retrieval core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier.
    pub id: DocId,
    /// Passage body, indexed by BM25 and embedded by the vector pipeline.
    pub text: String,
    /// Filterable attributes (domain, type, level, equipment, muscle group, ...).
    pub attributes: Attributes,
}

impl Document {
    /// Creates a document.
    pub fn new(id: impl Into<DocId>, text: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            attributes,
        }
    }
}
