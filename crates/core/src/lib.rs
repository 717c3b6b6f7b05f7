//! # hybridsearch-core
//!
//! Synchronous building blocks for hybrid document retrieval: BM25 lexical
//! index, predicate compilation, dense/sparse fusion, preference boost and
//! threshold policy, plus checksummed snapshot persistence.
//!
//! This crate performs no network I/O and has no async dependencies; the
//! retrieval controller and backend adapters live in `hybridsearch-engine`.

/// BM25 full-text search: inverted index, Okapi BM25 scoring, and tokenizer.
pub mod bm25;
/// Global configuration constants: limits, defaults, and tuning parameters.
pub mod config;
/// Core document types: `Document`, `Scalar` and `AttributeValue`.
pub mod document;
/// Error taxonomy shared across the workspace.
pub mod error;
/// Filter specification types supplied by callers.
pub mod filter_types;
/// Search primitives: predicate compiler, fusion, boost, thresholds and result types.
pub mod search;
/// Storage layer: lexical snapshot and disk persistence.
pub mod storage;

pub use document::{AttributeValue, Attributes, DocId, Document, Scalar};
pub use error::{ErrorKind, Result, RetrievalError};
pub use filter_types::{FieldClause, FieldMatch, FilterSpec};
pub use search::{
    Candidate, FusionMethod, FusionStrategy, RetrievalOutcome, RetrievalResult, ScoredDocument,
};
pub use storage::LexicalSnapshot;
