//! Filter policy boundary.
//!
//! Turning free text (and a user profile) into a [`FilterSpec`] is domain
//! taxonomy work that lives outside the engine. Implementations plug in here.

use hybridsearch_core::{Attributes, FilterSpec};

/// Opaque per-user attributes (level, available equipment, goals, ...).
pub type UserProfile = Attributes;

/// Derives a filter specification from the raw query and the caller's profile.
pub trait FilterPolicy: Send + Sync {
    fn text_to_filter_spec(&self, query: &str, profile: &UserProfile) -> FilterSpec;
}

/// Never filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFilterPolicy;

impl FilterPolicy for NoFilterPolicy {
    fn text_to_filter_spec(&self, _query: &str, _profile: &UserProfile) -> FilterSpec {
        FilterSpec::default()
    }
}

impl<F> FilterPolicy for F
where
    F: Fn(&str, &UserProfile) -> FilterSpec + Send + Sync,
{
    fn text_to_filter_spec(&self, query: &str, profile: &UserProfile) -> FilterSpec {
        self(query, profile)
    }
}
