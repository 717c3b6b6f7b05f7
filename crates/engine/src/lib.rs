//! hybridsearch-engine: async retrieval pipeline for hybridsearch.
//!
//! Wires the synchronous primitives of `hybridsearch-core` to external
//! backends (vector store, embedding model, cross-encoder) and runs the
//! adaptive retrieval state machine. Core ranking logic lives in
//! `hybridsearch-core`.

/// Backend traits and HTTP adapters.
pub mod backend;
/// Adaptive retrieval controller.
pub mod controller;
/// Hot-swappable lexical index handle.
pub mod index;
/// Metrics recording through the `metrics` facade.
pub mod metrics;
/// Filter policy boundary.
pub mod policy;
/// Optional cross-encoder rerank stage.
pub mod rerank;
/// Runtime settings loaded from TOML.
pub mod settings;

pub use controller::{AdaptiveRetriever, RetrievalRequest};
pub use index::LexicalIndexHandle;
pub use settings::EngineSettings;
