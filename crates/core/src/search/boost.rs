//! Query-inferred preference boost.
//!
//! A [`PreferenceVocabulary`] maps trigger phrases found in the query to an
//! attribute value. Fused candidates whose attributes contain an inferred value
//! receive a small fixed bonus, then the list is re-sorted.

use crate::config;
use crate::document::{Attributes, Scalar};
use crate::search::types::{sort_candidates, Candidate};
use serde::{Deserialize, Serialize};

/// One vocabulary entry: if any trigger occurs in the query, prefer `field = value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRule {
    pub field: String,
    pub value: String,
    pub triggers: Vec<String>,
}

impl PreferenceRule {
    fn new(field: &str, value: &str, triggers: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
            triggers: triggers.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// An inferred `field = value` preference.
#[derive(Debug, Clone, PartialEq)]
pub struct Preference {
    pub field: String,
    pub value: Scalar,
}

/// Trigger vocabulary used to infer preferences from query text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceVocabulary {
    rules: Vec<PreferenceRule>,
}

impl Default for PreferenceVocabulary {
    /// Equipment vocabulary, French and English.
    fn default() -> Self {
        let f = config::EQUIPMENT_FIELD;
        Self {
            rules: vec![
                PreferenceRule::new(f, "full_gym", &["barre", "rack", "machine", "poulie", "barbell"]),
                PreferenceRule::new(f, "dumbbell", &["haltère", "haltere", "dumbbell", "kettlebell"]),
                PreferenceRule::new(f, "bands", &["élastique", "elastique", "resistance band"]),
                PreferenceRule::new(f, "mat", &["tapis", "yoga mat"]),
                PreferenceRule::new(
                    f,
                    "none",
                    &["sans matériel", "sans materiel", "poids du corps", "bodyweight", "no equipment"],
                ),
            ],
        }
    }
}

impl PreferenceVocabulary {
    /// Builds a vocabulary from explicit rules.
    pub fn new(rules: Vec<PreferenceRule>) -> Self {
        Self { rules }
    }

    /// A vocabulary that never infers anything.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rules(&self) -> &[PreferenceRule] {
        &self.rules
    }

    /// Case-insensitive substring match of each trigger against the query.
    /// Each rule contributes at most one preference.
    pub fn infer(&self, query: &str) -> Vec<Preference> {
        let query = query.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| {
                rule.triggers
                    .iter()
                    .any(|t| !t.is_empty() && query.contains(&t.to_lowercase()))
            })
            .map(|rule| Preference {
                field: rule.field.clone(),
                value: Scalar::String(rule.value.clone()),
            })
            .collect()
    }
}

/// `true` if the attributes contain any of the preferences.
pub fn matches_any(attributes: &Attributes, preferences: &[Preference]) -> bool {
    preferences.iter().any(|p| {
        attributes
            .get(&p.field)
            .is_some_and(|value| value.contains(&p.value))
    })
}

/// Adds `bonus` once to each candidate matching at least one preference, then
/// re-sorts. Returns the number of boosted candidates.
///
/// `attributes_of` resolves a candidate's attributes; unresolved candidates are
/// left untouched.
pub fn apply_preference_boost<'a, F>(
    candidates: &mut [Candidate],
    preferences: &[Preference],
    bonus: f32,
    attributes_of: F,
) -> usize
where
    F: Fn(&str) -> Option<&'a Attributes>,
{
    if preferences.is_empty() || bonus == 0.0 {
        return 0;
    }
    let mut boosted = 0;
    for candidate in candidates.iter_mut() {
        let hit = attributes_of(&candidate.doc_id).is_some_and(|attrs| matches_any(attrs, preferences));
        if hit {
            candidate.fused_score += bonus;
            candidate.final_score += bonus;
            boosted += 1;
        }
    }
    if boosted > 0 {
        sort_candidates(candidates);
    }
    boosted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::AttributeValue;
    use std::collections::HashMap;

    fn candidate(id: &str, score: f32) -> Candidate {
        let mut c = Candidate::new(id.to_string());
        c.fused_score = score;
        c.final_score = score;
        c
    }

    #[test]
    fn test_infer_equipment_french() {
        let vocab = PreferenceVocabulary::default();
        let prefs = vocab.infer("Séance avec HALTÈRES pour les bras");
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].field, "equipment");
        assert_eq!(prefs[0].value, Scalar::from("dumbbell"));
    }

    #[test]
    fn test_infer_multiple_and_none() {
        let vocab = PreferenceVocabulary::default();
        let prefs = vocab.infer("kettlebell ou tapis");
        let values: Vec<_> = prefs.iter().map(|p| p.value.clone()).collect();
        assert_eq!(values, vec![Scalar::from("dumbbell"), Scalar::from("mat")]);
        assert!(vocab.infer("programme cardio débutant").is_empty());
        assert!(PreferenceVocabulary::empty().infer("haltère").is_empty());
    }

    #[test]
    fn test_sans_materiel_does_not_trigger_mat() {
        let prefs = PreferenceVocabulary::default().infer("exercices sans matériel");
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].value, Scalar::from("none"));
    }

    #[test]
    fn test_boost_reorders_near_ties() {
        let mut attrs: HashMap<String, Attributes> = HashMap::new();
        attrs.insert(
            "b".into(),
            HashMap::from([("equipment".to_string(), AttributeValue::from(vec!["dumbbell", "mat"]))]),
        );
        attrs.insert(
            "a".into(),
            HashMap::from([("equipment".to_string(), AttributeValue::from("none"))]),
        );
        let mut candidates = vec![candidate("a", 0.0330), candidate("b", 0.0325), candidate("c", 0.02)];
        let prefs = PreferenceVocabulary::default().infer("haltères");
        let boosted = apply_preference_boost(&mut candidates, &prefs, 0.01, |id| attrs.get(id));
        assert_eq!(boosted, 1);
        assert_eq!(candidates[0].doc_id, "b");
        assert!((candidates[0].final_score - 0.0425).abs() < 1e-6);
        assert_eq!(candidates[1].doc_id, "a");
    }

    #[test]
    fn test_boost_without_preferences_is_noop() {
        let mut candidates = vec![candidate("a", 0.5), candidate("b", 0.4)];
        let before = candidates.clone();
        assert_eq!(apply_preference_boost(&mut candidates, &[], 0.01, |_| None), 0);
        assert_eq!(candidates, before);
    }

    #[test]
    fn test_vocabulary_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            preferences: PreferenceVocabulary,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
            [[preferences]]
            field = "equipment"
            value = "bands"
            triggers = ["élastique"]
            "#,
        )
        .unwrap();
        assert_eq!(parsed.preferences.rules().len(), 1);
        assert_eq!(parsed.preferences.infer("élastique")[0].value, Scalar::from("bands"));
    }
}
