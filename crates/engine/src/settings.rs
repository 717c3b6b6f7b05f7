//! Runtime settings.
//!
//! Every field defaults from `hybridsearch_core::config`, so an empty TOML
//! document is a valid configuration. Settings are passed explicitly to the
//! controller and adapters; nothing is read from process-wide state.

use hybridsearch_core::config;
use hybridsearch_core::search::{FusionMethod, FusionStrategy, PreferenceVocabulary};
use hybridsearch_core::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retrieval pipeline tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Results requested when a request does not specify `top_k`.
    pub top_k: usize,
    /// Dense search fetches `top_k * dense_multiplier` candidates.
    pub dense_multiplier: usize,
    /// Lexical search fetches `top_k * sparse_multiplier` candidates.
    pub sparse_multiplier: usize,
    pub fusion: FusionMethod,
    pub rrf_k: f32,
    /// Dense weight α for weighted fusion.
    pub fusion_weight: f32,
    /// Final score threshold applied after fusion (and rerank).
    pub score_threshold: Option<f32>,
    /// Similarity floor passed to the vector store.
    pub dense_score_threshold: Option<f32>,
    /// Multiplier applied to both thresholds on the relaxed attempt.
    pub relax_factor: f32,
    pub min_results: usize,
    /// Strict mode only changes logging and telemetry on exhaustion.
    pub strict: bool,
    pub rerank: bool,
    pub rerank_top_n: usize,
    /// Weight of the cross-encoder score in the blended score.
    pub rerank_blend: f32,
    pub preference_bonus: f32,
    pub ef_search: usize,
    /// Per-stage timeout for embedding, dense search, fetch and rerank calls.
    pub stage_timeout_ms: u64,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: config::DEFAULT_TOP_K,
            dense_multiplier: config::DEFAULT_DENSE_MULTIPLIER,
            sparse_multiplier: config::DEFAULT_SPARSE_MULTIPLIER,
            fusion: FusionMethod::Rrf,
            rrf_k: config::RRF_K,
            fusion_weight: config::DEFAULT_FUSION_WEIGHT,
            score_threshold: None,
            dense_score_threshold: None,
            relax_factor: config::DEFAULT_RELAX_FACTOR,
            min_results: config::DEFAULT_MIN_RESULTS,
            strict: false,
            rerank: false,
            rerank_top_n: config::DEFAULT_RERANK_TOP_N,
            rerank_blend: config::DEFAULT_RERANK_BLEND,
            preference_bonus: config::DEFAULT_PREFERENCE_BONUS,
            ef_search: config::DEFAULT_EF_SEARCH,
            stage_timeout_ms: config::DEFAULT_STAGE_TIMEOUT_MS,
        }
    }
}

impl RetrievalSettings {
    pub fn fusion_strategy(&self) -> FusionStrategy {
        match self.fusion {
            FusionMethod::Rrf => FusionStrategy::Rrf { k: self.rrf_k },
            FusionMethod::Weighted => FusionStrategy::Weighted {
                alpha: self.fusion_weight,
            },
        }
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub url: String,
    pub collection: String,
    pub api_key: Option<String>,
    /// Payload key holding the passage text.
    pub text_key: String,
    /// Page size used when scrolling the whole collection.
    pub scroll_batch: usize,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            collection: "corpus".to_string(),
            api_key: None,
            text_key: "text".to_string(),
            scroll_batch: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of an OpenAI-compatible embeddings endpoint.
    pub url: String,
    pub model: String,
    pub dimension: usize,
    pub api_key: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080/v1".to_string(),
            model: "sentence-transformers/all-mpnet-base-v2".to_string(),
            dimension: 768,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankerSettings {
    /// Base URL of a `/rerank` cross-encoder endpoint.
    pub url: String,
    pub model: String,
}

impl Default for RerankerSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8081".to_string(),
            model: "cross-encoder/ms-marco-MiniLM-L-6-v2".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalSettings {
    pub snapshot_path: PathBuf,
    /// Bound on one snapshot load, persist or build.
    pub io_timeout_ms: u64,
}

impl Default for LexicalSettings {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("./data/lexical.hsl"),
            io_timeout_ms: config::DEFAULT_SNAPSHOT_IO_TIMEOUT_MS,
        }
    }
}

impl LexicalSettings {
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub retrieval: RetrievalSettings,
    pub vector_store: VectorStoreSettings,
    pub embedding: EmbeddingSettings,
    pub reranker: RerankerSettings,
    pub lexical: LexicalSettings,
    pub preferences: PreferenceVocabulary,
}

fn invalid(msg: impl Into<String>) -> RetrievalError {
    RetrievalError::InvalidConfig(msg.into())
}

impl EngineSettings {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: EngineSettings = toml::from_str(text).map_err(|e| invalid(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| invalid(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Rejects out-of-range values.
    pub fn validate(&self) -> Result<()> {
        let r = &self.retrieval;
        if r.top_k == 0 || r.top_k > config::MAX_TOP_K {
            return Err(invalid(format!(
                "retrieval.top_k must be in 1..={}, got {}",
                config::MAX_TOP_K,
                r.top_k
            )));
        }
        if r.dense_multiplier == 0 || r.sparse_multiplier == 0 {
            return Err(invalid("retrieval candidate multipliers must be > 0"));
        }
        if !(0.0..=1.0).contains(&r.fusion_weight) {
            return Err(invalid(format!(
                "retrieval.fusion_weight must be in [0, 1], got {}",
                r.fusion_weight
            )));
        }
        if r.rrf_k.is_nan() || r.rrf_k <= 0.0 {
            return Err(invalid(format!("retrieval.rrf_k must be > 0, got {}", r.rrf_k)));
        }
        if !(0.0..=1.0).contains(&r.rerank_blend) {
            return Err(invalid(format!(
                "retrieval.rerank_blend must be in [0, 1], got {}",
                r.rerank_blend
            )));
        }
        if r.relax_factor.is_nan() || r.relax_factor <= 0.0 || r.relax_factor > 1.0 {
            return Err(invalid(format!(
                "retrieval.relax_factor must be in (0, 1], got {}",
                r.relax_factor
            )));
        }
        if r.min_results == 0 {
            return Err(invalid("retrieval.min_results must be > 0"));
        }
        if r.rerank && r.rerank_top_n == 0 {
            return Err(invalid("retrieval.rerank_top_n must be > 0 when rerank is enabled"));
        }
        if r.ef_search == 0 {
            return Err(invalid("retrieval.ef_search must be > 0"));
        }
        if r.stage_timeout_ms == 0 {
            return Err(invalid("retrieval.stage_timeout_ms must be > 0"));
        }
        if !r.preference_bonus.is_finite() || r.preference_bonus < 0.0 {
            return Err(invalid("retrieval.preference_bonus must be a non-negative number"));
        }
        if self.embedding.dimension == 0 || self.embedding.dimension > config::MAX_DIMENSION {
            return Err(invalid(format!(
                "embedding.dimension must be in 1..={}, got {}",
                config::MAX_DIMENSION,
                self.embedding.dimension
            )));
        }
        if self.vector_store.collection.trim().is_empty() {
            return Err(invalid("vector_store.collection must not be empty"));
        }
        if self.vector_store.scroll_batch == 0 {
            return Err(invalid("vector_store.scroll_batch must be > 0"));
        }
        if self.lexical.io_timeout_ms == 0 {
            return Err(invalid("lexical.io_timeout_ms must be > 0"));
        }
        Ok(())
    }
}
