//! Predicate compiler for filter specifications.
//!
//! [`compile`] turns a [`FilterSpec`] into a vector-store-native predicate
//! ([`NativePredicate`], serialized in the store's `must` / `must_not` /
//! `min_should` filter dialect) and an in-process [`AttributePredicate`] used to
//! post-filter lexical results. Both are derived from the same validated
//! clauses, so they accept the same documents.

use crate::document::{Attributes, Scalar};
use crate::error::{Result, RetrievalError};
use crate::filter_types::{FieldClause, FieldMatch, FilterSpec};
use serde::Serialize;

/// A validated clause with typed values.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledMatch {
    Equals(Scalar),
    AnyOf(Vec<Scalar>),
}

/// A validated `(field, match)` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledClause {
    pub field: String,
    pub matcher: CompiledMatch,
}

impl CompiledClause {
    /// Evaluates the clause. A missing attribute never holds.
    pub fn holds(&self, attributes: &Attributes) -> bool {
        let Some(value) = attributes.get(&self.field) else {
            return false;
        };
        match &self.matcher {
            CompiledMatch::Equals(expected) => value.contains(expected),
            CompiledMatch::AnyOf(set) => set.iter().any(|s| value.contains(s)),
        }
    }

    fn to_native(&self) -> NativeCondition {
        let matcher = match &self.matcher {
            CompiledMatch::Equals(s) => NativeMatch::Value { value: s.to_json() },
            CompiledMatch::AnyOf(set) => NativeMatch::Any {
                any: set.iter().map(Scalar::to_json).collect(),
            },
        };
        NativeCondition {
            key: self.field.clone(),
            matcher,
        }
    }
}

/// In-process predicate: `attributes → bool`.
///
/// Holds when all required clauses hold, no excluded clause holds, and at least
/// `min_optional_matches` optional clauses hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributePredicate {
    required: Vec<CompiledClause>,
    optional: Vec<CompiledClause>,
    excluded: Vec<CompiledClause>,
    min_optional_matches: usize,
}

impl AttributePredicate {
    /// Evaluates the predicate against a document's attributes.
    pub fn matches(&self, attributes: &Attributes) -> bool {
        if !self.required.iter().all(|c| c.holds(attributes)) {
            return false;
        }
        if self.excluded.iter().any(|c| c.holds(attributes)) {
            return false;
        }
        if self.min_optional_matches == 0 {
            return true;
        }
        self.optional.iter().filter(|c| c.holds(attributes)).count() >= self.min_optional_matches
    }

    /// `true` when the predicate accepts every attribute map.
    pub fn is_always_true(&self) -> bool {
        self.required.is_empty() && self.excluded.is_empty() && self.min_optional_matches == 0
    }
}

/// Match expression in the vector store's filter dialect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NativeMatch {
    Value { value: serde_json::Value },
    Any { any: Vec<serde_json::Value> },
}

/// Field condition in the vector store's filter dialect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeCondition {
    pub key: String,
    #[serde(rename = "match")]
    pub matcher: NativeMatch,
}

/// "At least `min_count` of `conditions`" in the vector store's filter dialect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinShould {
    pub conditions: Vec<NativeCondition>,
    pub min_count: usize,
}

/// Vector-store-native predicate. An empty predicate means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NativePredicate {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<NativeCondition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<NativeCondition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_should: Option<MinShould>,
}

impl NativePredicate {
    /// `true` when no condition is set (the no-op filter).
    pub fn is_empty(&self) -> bool {
        self.must.is_empty() && self.must_not.is_empty() && self.min_should.is_none()
    }
}

/// Output of [`compile`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilter {
    pub native: NativePredicate,
    pub predicate: AttributePredicate,
}

fn compile_clause(clause: &FieldClause) -> Result<CompiledClause> {
    if clause.field.trim().is_empty() {
        return Err(RetrievalError::InvalidFilterSpec(
            "clause has an empty field name".to_string(),
        ));
    }
    let to_scalar = |value: &serde_json::Value| {
        Scalar::from_json(value).ok_or_else(|| {
            RetrievalError::InvalidFilterSpec(format!(
                "field '{}': value {} is not a scalar",
                clause.field, value
            ))
        })
    };
    let matcher = match &clause.matcher {
        FieldMatch::Equals(value) => CompiledMatch::Equals(to_scalar(value)?),
        FieldMatch::AnyOf(values) => {
            if values.is_empty() {
                return Err(RetrievalError::InvalidFilterSpec(format!(
                    "field '{}': any_of requires at least one value",
                    clause.field
                )));
            }
            CompiledMatch::AnyOf(values.iter().map(to_scalar).collect::<Result<_>>()?)
        }
    };
    Ok(CompiledClause {
        field: clause.field.clone(),
        matcher,
    })
}

fn compile_all(clauses: &[FieldClause]) -> Result<Vec<CompiledClause>> {
    clauses.iter().map(compile_clause).collect()
}

/// Compiles a filter spec into a native and an in-process predicate.
///
/// `min_optional_matches` is forced to 0 when `optional` is empty; otherwise a
/// value above `optional.len()` is rejected. No I/O happens here.
pub fn compile(spec: &FilterSpec) -> Result<CompiledFilter> {
    let min_optional_matches = if spec.optional.is_empty() {
        0
    } else if spec.min_optional_matches > spec.optional.len() {
        return Err(RetrievalError::InvalidFilterSpec(format!(
            "min_optional_matches {} exceeds optional clause count {}",
            spec.min_optional_matches,
            spec.optional.len()
        )));
    } else {
        spec.min_optional_matches
    };

    let required = compile_all(&spec.required)?;
    let optional = compile_all(&spec.optional)?;
    let excluded = compile_all(&spec.excluded)?;

    let native = NativePredicate {
        must: required.iter().map(CompiledClause::to_native).collect(),
        must_not: excluded.iter().map(CompiledClause::to_native).collect(),
        min_should: (min_optional_matches > 0).then(|| MinShould {
            conditions: optional.iter().map(CompiledClause::to_native).collect(),
            min_count: min_optional_matches,
        }),
    };

    Ok(CompiledFilter {
        native,
        predicate: AttributePredicate {
            required,
            optional,
            excluded,
            min_optional_matches,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::AttributeValue;
    use crate::error::ErrorKind;
    use proptest::prelude::*;
    use serde_json::json;

    fn attrs(pairs: Vec<(&str, AttributeValue)>) -> Attributes {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn example_spec() -> FilterSpec {
        FilterSpec::default()
            .require(FieldClause::equals("domain", "exercise"))
            .prefer(FieldClause::any_of("equipment", ["dumbbell", "bands"]))
            .min_optional(1)
    }

    #[test]
    fn test_empty_spec_is_noop() {
        let compiled = compile(&FilterSpec::default()).unwrap();
        assert!(compiled.native.is_empty());
        assert!(compiled.predicate.is_always_true());
        assert!(compiled.predicate.matches(&Attributes::new()));
        assert_eq!(serde_json::to_value(&compiled.native).unwrap(), json!({}));
    }

    #[test]
    fn test_required_and_optional() {
        let compiled = compile(&example_spec()).unwrap();
        let ok = attrs(vec![
            ("domain", "exercise".into()),
            ("equipment", vec!["mat", "bands"].into()),
        ]);
        let no_equipment = attrs(vec![("domain", "exercise".into()), ("equipment", "none".into())]);
        let wrong_domain = attrs(vec![("domain", "logic".into()), ("equipment", "dumbbell".into())]);
        assert!(compiled.predicate.matches(&ok));
        assert!(!compiled.predicate.matches(&no_equipment));
        assert!(!compiled.predicate.matches(&wrong_domain));
    }

    #[test]
    fn test_excluded_clause() {
        let spec = FilterSpec::default().exclude(FieldClause::equals("level", "Confirmé"));
        let compiled = compile(&spec).unwrap();
        assert!(!compiled
            .predicate
            .matches(&attrs(vec![("level", "Confirmé".into())])));
        assert!(compiled.predicate.matches(&attrs(vec![("level", "Débutant".into())])));
        // A missing attribute cannot hold, so it is not excluded.
        assert!(compiled.predicate.matches(&Attributes::new()));
    }

    #[test]
    fn test_equals_on_list_attribute_matches_element() {
        let spec = FilterSpec::default().require(FieldClause::equals("muscles", "biceps"));
        let compiled = compile(&spec).unwrap();
        assert!(compiled
            .predicate
            .matches(&attrs(vec![("muscles", vec!["biceps", "avant-bras"].into())])));
    }

    #[test]
    fn test_numeric_equals() {
        let spec = FilterSpec::default().require(FieldClause::equals("week", 3));
        let compiled = compile(&spec).unwrap();
        let a = attrs(vec![("week", AttributeValue::Scalar(Scalar::Float(3.0)))]);
        assert!(compiled.predicate.matches(&a));
    }

    #[test]
    fn test_native_predicate_shape() {
        let spec = example_spec().exclude(FieldClause::equals("type", "meso_ref"));
        let compiled = compile(&spec).unwrap();
        assert_eq!(
            serde_json::to_value(&compiled.native).unwrap(),
            json!({
                "must": [{"key": "domain", "match": {"value": "exercise"}}],
                "must_not": [{"key": "type", "match": {"value": "meso_ref"}}],
                "min_should": {
                    "conditions": [{"key": "equipment", "match": {"any": ["dumbbell", "bands"]}}],
                    "min_count": 1
                }
            })
        );
    }

    #[test]
    fn test_min_optional_zero_omits_optional_from_native() {
        let spec = FilterSpec::default().prefer(FieldClause::equals("zone", "bras"));
        let compiled = compile(&spec).unwrap();
        assert!(compiled.native.is_empty());
        assert!(compiled.predicate.matches(&Attributes::new()));
    }

    #[test]
    fn test_min_optional_forced_to_zero_without_optional() {
        let spec = FilterSpec::default().min_optional(2);
        let compiled = compile(&spec).unwrap();
        assert!(compiled.predicate.is_always_true());
    }

    #[test]
    fn test_min_optional_exceeding_count_rejected() {
        let spec = FilterSpec::default()
            .prefer(FieldClause::equals("zone", "bras"))
            .min_optional(2);
        let err = compile(&spec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidFilterSpec);
    }

    #[test]
    fn test_malformed_clauses_rejected() {
        let empty_field = FilterSpec::default().require(FieldClause::equals("", "x"));
        let empty_any = FilterSpec::default().require(FieldClause::any_of("zone", Vec::<String>::new()));
        let object_value = FilterSpec::default().require(FieldClause::equals("zone", json!({"a": 1})));
        for spec in [empty_field, empty_any, object_value] {
            assert_eq!(compile(&spec).unwrap_err().kind(), ErrorKind::InvalidFilterSpec);
        }
    }

    // ── Property: predicate equals the reference truth table ─────────

    const FIELDS: [&str; 3] = ["domain", "equipment", "level"];
    const VALUES: [&str; 4] = ["a", "b", "c", "d"];

    fn arb_clause() -> impl Strategy<Value = FieldClause> {
        (0..FIELDS.len(), prop::collection::vec(0..VALUES.len(), 1..3), any::<bool>()).prop_map(
            |(f, vals, equals)| {
                if equals {
                    FieldClause::equals(FIELDS[f], VALUES[vals[0]])
                } else {
                    FieldClause::any_of(FIELDS[f], vals.into_iter().map(|v| VALUES[v]))
                }
            },
        )
    }

    fn arb_spec() -> impl Strategy<Value = FilterSpec> {
        (
            prop::collection::vec(arb_clause(), 0..3),
            prop::collection::vec(arb_clause(), 0..4),
            prop::collection::vec(arb_clause(), 0..2),
            0usize..4,
        )
            .prop_map(|(required, optional, excluded, min)| {
                let min_optional_matches = min.min(optional.len());
                FilterSpec {
                    required,
                    optional,
                    excluded,
                    min_optional_matches,
                }
            })
    }

    fn arb_attrs() -> impl Strategy<Value = Attributes> {
        prop::collection::vec(
            (0..FIELDS.len(), prop::collection::vec(0..VALUES.len(), 1..3)),
            0..3,
        )
        .prop_map(|entries| {
            entries
                .into_iter()
                .map(|(f, vals)| {
                    let value = if vals.len() == 1 {
                        AttributeValue::from(VALUES[vals[0]])
                    } else {
                        AttributeValue::from(vals.into_iter().map(|v| VALUES[v]).collect::<Vec<_>>())
                    };
                    (FIELDS[f].to_string(), value)
                })
                .collect()
        })
    }

    fn reference_holds(clause: &FieldClause, attributes: &Attributes) -> bool {
        let Some(value) = attributes.get(&clause.field) else {
            return false;
        };
        let present: Vec<String> = value
            .scalars()
            .filter_map(|s| match s {
                Scalar::String(s) => Some(s.clone()),
                _ => None,
            })
            .collect();
        match &clause.matcher {
            FieldMatch::Equals(v) => present.iter().any(|p| Some(p.as_str()) == v.as_str()),
            FieldMatch::AnyOf(vs) => vs
                .iter()
                .any(|v| present.iter().any(|p| Some(p.as_str()) == v.as_str())),
        }
    }

    proptest! {
        #[test]
        fn prop_predicate_matches_truth_table(spec in arb_spec(), attributes in arb_attrs()) {
            let compiled = compile(&spec).unwrap();
            let all_required = spec.required.iter().all(|c| reference_holds(c, &attributes));
            let any_excluded = spec.excluded.iter().any(|c| reference_holds(c, &attributes));
            let optional_hits = spec.optional.iter().filter(|c| reference_holds(c, &attributes)).count();
            let expected = all_required && !any_excluded && optional_hits >= spec.min_optional_matches;
            prop_assert_eq!(compiled.predicate.matches(&attributes), expected);
        }
    }
}
