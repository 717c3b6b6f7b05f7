//! External backend boundaries.
//!
//! The controller talks to every external service through one of these
//! traits, so tests and alternative providers can be swapped in. Adapters
//! perform a single attempt per call and never retry; failures surface as
//! [`RetrievalError::BackendUnavailable`](hybridsearch_core::RetrievalError).

use async_trait::async_trait;
use hybridsearch_core::search::NativePredicate;
use hybridsearch_core::{DocId, Document, Result, RetrievalError};

/// OpenAI-compatible embeddings client.
pub mod embedding;
/// HTTP cross-encoder (`/rerank`) client.
pub mod cross_encoder;
/// Qdrant REST adapter.
pub mod qdrant;

pub use cross_encoder::HttpCrossEncoder;
pub use embedding::HttpEmbedder;
pub use qdrant::QdrantStore;

/// Approximate-nearest-neighbor store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Filtered top-k similarity search. Returns `(id, similarity)` pairs that
    /// already satisfy `filter`, most similar first.
    async fn search(
        &self,
        vector: &[f32],
        filter: &NativePredicate,
        top_k: usize,
        ef_search: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<(DocId, f32)>>;

    /// Batched document lookup. Unknown ids are omitted from the result.
    async fn fetch(&self, ids: &[DocId]) -> Result<Vec<Document>>;
}

/// Full-corpus source used to build the lexical snapshot.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn scroll_all(&self) -> Result<Vec<Document>>;
}

/// Text → fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Expected vector length.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Joint (query, passage) relevance scorer.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    /// One score per text, in input order.
    async fn score(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>>;
}

/// Maps a transport error to `BackendUnavailable`.
pub(crate) fn unavailable(backend: &'static str) -> impl Fn(reqwest::Error) -> RetrievalError {
    move |e| RetrievalError::backend(backend, e)
}
