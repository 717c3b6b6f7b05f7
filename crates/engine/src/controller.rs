//! Adaptive retrieval controller.
//!
//! Runs one retrieval attempt per request:
//! dense and sparse search (concurrently) → fusion → preference boost →
//! optional rerank → threshold filter. When the filtered dense search
//! under-delivers, a single relaxed dense search without the native filter is
//! issued. Every external call is bounded by the stage timeout and aborted by
//! the request's cancellation token. BM25 scoring runs on the blocking pool.

use crate::backend::{CrossEncoder, Embedder, HttpCrossEncoder, HttpEmbedder, QdrantStore, VectorStore};
use crate::index::LexicalIndexHandle;
use crate::metrics;
use crate::policy::{FilterPolicy, UserProfile};
use crate::rerank::RerankStage;
use crate::settings::{EngineSettings, RetrievalSettings};
use hybridsearch_core::config;
use hybridsearch_core::search::{
    apply_preference_boost, apply_threshold, compile, fuse, Candidate, NativePredicate,
    PreferenceVocabulary, RetrievalResult, ScoredDocument,
};
use hybridsearch_core::{DocId, Document, FilterSpec, Result, RetrievalError};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// One retrieval request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalRequest {
    pub query: String,
    pub filter: FilterSpec,
    /// Overrides the configured `top_k` when set.
    pub top_k: Option<usize>,
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

/// Runs `fut` with a timeout, racing it against `cancel`.
pub(crate) async fn guarded<T, F>(
    stage: &'static str,
    limit: Duration,
    cancel: &CancellationToken,
    fut: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RetrievalError::Cancelled),
        outcome = tokio::time::timeout(limit, fut) => match outcome {
            Ok(result) => result,
            Err(_) => Err(RetrievalError::Timeout { stage, after: limit }),
        },
    }
}

/// Hybrid retriever holding its backends for its whole lifetime.
pub struct AdaptiveRetriever {
    settings: RetrievalSettings,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    index: Arc<LexicalIndexHandle>,
    reranker: Option<RerankStage>,
    preferences: PreferenceVocabulary,
}

impl AdaptiveRetriever {
    pub fn new(
        settings: RetrievalSettings,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        index: Arc<LexicalIndexHandle>,
    ) -> Self {
        Self {
            settings,
            embedder,
            store,
            index,
            reranker: None,
            preferences: PreferenceVocabulary::default(),
        }
    }

    /// Wires the HTTP adapters described by `settings`.
    pub fn from_settings(settings: &EngineSettings, index: Arc<LexicalIndexHandle>) -> Result<Self> {
        settings.validate()?;
        let timeout = settings.retrieval.stage_timeout();
        let store = Arc::new(QdrantStore::new(&settings.vector_store, timeout)?);
        let embedder = Arc::new(HttpEmbedder::new(&settings.embedding, timeout)?);
        let mut retriever = Self::new(settings.retrieval.clone(), embedder, store, index)
            .with_preferences(settings.preferences.clone());
        if settings.retrieval.rerank {
            let encoder = Arc::new(HttpCrossEncoder::new(&settings.reranker, timeout)?);
            retriever = retriever.with_reranker(encoder);
        }
        Ok(retriever)
    }

    /// Installs the cross-encoder. It runs only while `settings.rerank` is set.
    pub fn with_reranker(mut self, encoder: Arc<dyn CrossEncoder>) -> Self {
        self.reranker = Some(RerankStage::new(
            encoder,
            self.settings.rerank_top_n,
            self.settings.rerank_blend,
            self.settings.stage_timeout(),
        ));
        self
    }

    pub fn with_preferences(mut self, preferences: PreferenceVocabulary) -> Self {
        self.preferences = preferences;
        self
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub fn index(&self) -> &Arc<LexicalIndexHandle> {
        &self.index
    }

    /// Retrieves ranked documents for `request`.
    ///
    /// An empty result is reported as `InsufficientEvidence`, never as an error.
    pub async fn retrieve(
        &self,
        request: &RetrievalRequest,
        cancel: &CancellationToken,
    ) -> Result<RetrievalResult> {
        let request_id = Uuid::new_v4();
        let strategy = self.settings.fusion_strategy();
        let span = tracing::info_span!(
            "retrieve",
            %request_id,
            strict = self.settings.strict,
            fusion = strategy.label()
        );
        let started = Instant::now();
        let result = self.run(request, cancel).instrument(span).await;

        let outcome = match &result {
            Ok(r) if r.is_empty() => "insufficient_evidence",
            Ok(_) => "answered",
            Err(e) => e.kind().as_str(),
        };
        metrics::record_request(self.settings.strict, outcome, started.elapsed());
        result
    }

    /// Applies `policy` to build the filter, then retrieves.
    pub async fn retrieve_with_policy(
        &self,
        query: &str,
        profile: &UserProfile,
        policy: &dyn FilterPolicy,
        top_k: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<RetrievalResult> {
        let request = RetrievalRequest {
            query: query.to_string(),
            filter: policy.text_to_filter_spec(query, profile),
            top_k,
        };
        self.retrieve(&request, cancel).await
    }

    async fn run(&self, request: &RetrievalRequest, cancel: &CancellationToken) -> Result<RetrievalResult> {
        let s = &self.settings;
        let compiled = compile(&request.filter)?;
        if cancel.is_cancelled() {
            return Err(RetrievalError::Cancelled);
        }
        let snapshot = self.index.snapshot()?;

        let top_k = request
            .top_k
            .filter(|&k| k > 0)
            .unwrap_or(s.top_k)
            .min(config::MAX_TOP_K);
        let dense_k = top_k * s.dense_multiplier;
        let sparse_k = top_k * s.sparse_multiplier;
        let timeout = s.stage_timeout();

        let dense_stage = async {
            let vector = guarded("embedding", timeout, cancel, self.embedder.embed(&request.query)).await?;
            if vector.len() != self.embedder.dimension() {
                return Err(RetrievalError::EmbeddingDimension {
                    expected: self.embedder.dimension(),
                    actual: vector.len(),
                });
            }
            let hits = guarded(
                "dense search",
                timeout,
                cancel,
                self.store
                    .search(&vector, &compiled.native, dense_k, s.ef_search, s.dense_score_threshold),
            )
            .await;
            Ok::<_, RetrievalError>((vector, hits))
        };
        let sparse_stage = {
            let snapshot = snapshot.clone();
            let query = request.query.clone();
            let predicate = compiled.predicate.clone();
            let scoring = tokio::task::spawn_blocking(move || snapshot.search(&query, sparse_k, &predicate));
            guarded("sparse search", timeout, cancel, async move {
                scoring
                    .await
                    .map_err(|e| RetrievalError::backend("lexical index", e))
            })
        };

        let (dense_outcome, sparse_outcome) = tokio::join!(dense_stage, sparse_stage);
        if cancel.is_cancelled() {
            return Err(RetrievalError::Cancelled);
        }
        let (vector, dense_result) = dense_outcome?;
        let sparse = match sparse_outcome {
            Ok(hits) => hits,
            Err(RetrievalError::Cancelled) => return Err(RetrievalError::Cancelled),
            Err(e) => {
                tracing::warn!("Lexical search failed, continuing with dense results only: {}", e);
                Vec::new()
            }
        };

        let sparse_was_empty = sparse.is_empty();
        if sparse_was_empty {
            metrics::record_sparse_empty();
        }

        let mut relaxed = false;
        let mut score_threshold = s.score_threshold;
        let dense = match dense_result {
            Ok(hits) if hits.len() < s.min_results => {
                relaxed = true;
                metrics::record_relaxation();
                score_threshold = score_threshold.map(|t| t * s.relax_factor);
                self.relaxed_dense(&vector, hits, dense_k, cancel).await?
            }
            Ok(hits) => hits,
            Err(RetrievalError::Cancelled) => return Err(RetrievalError::Cancelled),
            Err(e) if sparse_was_empty => return Err(e),
            Err(e) => {
                tracing::warn!("Dense search failed, continuing with lexical results only: {}", e);
                metrics::record_dense_failure();
                Vec::new()
            }
        };
        tracing::debug!(
            "Stage results: dense={} sparse={} relaxed={}",
            dense.len(),
            sparse.len(),
            relaxed
        );

        let mut candidates = fuse(&dense, &sparse, s.fusion_strategy());
        if candidates.is_empty() {
            return Ok(self.exhausted(sparse_was_empty, relaxed));
        }

        let documents = self.hydrate(&candidates, &snapshot, cancel).await?;
        candidates.retain(|c| documents.contains_key(&c.doc_id));

        let preferences = self.preferences.infer(&request.query);
        let boosted = apply_preference_boost(&mut candidates, &preferences, s.preference_bonus, |id| {
            documents.get(id).map(|d| &d.attributes)
        });
        if boosted > 0 {
            tracing::debug!("Preference boost applied to {} candidates", boosted);
        }

        if s.rerank {
            if let Some(stage) = &self.reranker {
                candidates = stage.rerank(&request.query, candidates, &documents, cancel).await?;
            }
        }

        let mut kept = apply_threshold(candidates, score_threshold, s.min_results);
        kept.truncate(top_k.max(s.min_results));

        let hits: Vec<ScoredDocument> = kept
            .iter()
            .filter_map(|c| {
                documents
                    .get(&c.doc_id)
                    .map(|doc| ScoredDocument::from_candidate(doc.clone(), c))
            })
            .collect();
        if hits.is_empty() {
            return Ok(self.exhausted(sparse_was_empty, relaxed));
        }
        tracing::debug!("Returning {} results", hits.len());
        Ok(RetrievalResult::new(hits, sparse_was_empty, relaxed))
    }

    /// The single relaxation: same vector, no native filter, lowered dense
    /// threshold. Keeps the first results if the relaxed search fails or
    /// returns fewer hits.
    async fn relaxed_dense(
        &self,
        vector: &[f32],
        first: Vec<(DocId, f32)>,
        dense_k: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<(DocId, f32)>> {
        let s = &self.settings;
        tracing::info!(
            "Filtered dense search returned {} < {} results, relaxing filter",
            first.len(),
            s.min_results
        );
        let threshold = s.dense_score_threshold.map(|t| t * s.relax_factor);
        let unfiltered = NativePredicate::default();
        let outcome = guarded(
            "relaxed dense search",
            s.stage_timeout(),
            cancel,
            self.store.search(vector, &unfiltered, dense_k, s.ef_search, threshold),
        )
        .await;
        match outcome {
            Ok(hits) if hits.len() > first.len() => Ok(hits),
            Ok(_) => Ok(first),
            Err(RetrievalError::Cancelled) => Err(RetrievalError::Cancelled),
            Err(e) => {
                tracing::warn!("Relaxed dense search failed, keeping filtered results: {}", e);
                Ok(first)
            }
        }
    }

    /// Resolves candidate documents from the snapshot cache, then fetches the
    /// remainder from the vector store in one batch. A failed fetch is an error
    /// only when no candidate could be resolved at all.
    async fn hydrate(
        &self,
        candidates: &[Candidate],
        snapshot: &hybridsearch_core::LexicalSnapshot,
        cancel: &CancellationToken,
    ) -> Result<HashMap<DocId, Arc<Document>>> {
        let mut documents: HashMap<DocId, Arc<Document>> = HashMap::with_capacity(candidates.len());
        let mut missing: Vec<DocId> = Vec::new();
        for c in candidates {
            match snapshot.document(&c.doc_id) {
                Some(doc) => {
                    documents.insert(c.doc_id.clone(), doc.clone());
                }
                None => missing.push(c.doc_id.clone()),
            }
        }
        if missing.is_empty() {
            return Ok(documents);
        }

        let fetched = guarded(
            "fetch",
            self.settings.stage_timeout(),
            cancel,
            self.store.fetch(&missing),
        )
        .await;
        match fetched {
            Ok(docs) => {
                for doc in docs {
                    documents.insert(doc.id.clone(), Arc::new(doc));
                }
            }
            Err(RetrievalError::Cancelled) => return Err(RetrievalError::Cancelled),
            Err(e) if documents.is_empty() => return Err(e),
            Err(e) => tracing::warn!("Document fetch failed, keeping cached documents: {}", e),
        }
        let dropped = missing.iter().filter(|id| !documents.contains_key(*id)).count();
        if dropped > 0 {
            tracing::warn!("Dropped {} candidates that could not be hydrated", dropped);
        }
        Ok(documents)
    }

    fn exhausted(&self, sparse_was_empty: bool, relaxed: bool) -> RetrievalResult {
        if self.settings.strict {
            tracing::info!(
                "Strict mode: no sufficiently relevant results (relaxed={}, sparse_was_empty={})",
                relaxed,
                sparse_was_empty
            );
        } else {
            tracing::debug!(
                "No results after retrieval (relaxed={}, sparse_was_empty={})",
                relaxed,
                sparse_was_empty
            );
        }
        RetrievalResult::new(Vec::new(), sparse_was_empty, relaxed)
    }
}
