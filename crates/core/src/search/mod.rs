//! Search pipeline pieces: predicate compilation, fusion, preference boost and
//! threshold policy.

pub mod boost;
pub mod filter;
pub mod hybrid;
pub mod threshold;
pub mod types;

pub use boost::{apply_preference_boost, Preference, PreferenceRule, PreferenceVocabulary};
pub use filter::{compile, AttributePredicate, CompiledFilter, NativePredicate};
pub use hybrid::{fuse, rrf_fusion, weighted_fusion, FusionMethod, FusionStrategy};
pub use threshold::apply_threshold;
pub use types::{sort_candidates, Candidate, RetrievalOutcome, RetrievalResult, ScoredDocument};
