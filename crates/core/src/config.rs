//! Global configuration constants for hybridsearch.
//!
//! Tuning parameters and validation limits shared by the lexical index, the
//! fusion engine and the retrieval controller. Runtime configuration is
//! loaded by `hybridsearch-engine` and falls back to these values.

/// BM25 Okapi term frequency saturation parameter.
///
/// Controls how quickly term frequency saturates. Higher values allow TF to grow more.
/// Standard value is 1.2 (range: 1.0–2.0).
pub const BM25_K1: f32 = 1.2;

/// BM25 Okapi document length normalization parameter.
///
/// 0.0 = no normalization, 1.0 = full normalization. Standard value is 0.75.
pub const BM25_B: f32 = 0.75;

/// Reciprocal Rank Fusion (RRF) constant `k`.
///
/// Used in the formula `1 / (k + rank)` to combine ranked lists.
/// Standard value is 60.0 (from the original RRF paper).
pub const RRF_K: f32 = 60.0;

/// Dense-search weight `α` for weighted score fusion.
///
/// Final score is `α · dense_norm + (1 - α) · sparse_norm`.
pub const DEFAULT_FUSION_WEIGHT: f32 = 0.6;

/// Weight of the cross-encoder score when blending with the fusion score.
pub const DEFAULT_RERANK_BLEND: f32 = 0.7;

/// Number of top fused candidates sent to the cross-encoder.
pub const DEFAULT_RERANK_TOP_N: usize = 20;

/// Minimum number of results the threshold step tries to preserve.
pub const DEFAULT_MIN_RESULTS: usize = 3;

/// Default number of results returned to the caller.
pub const DEFAULT_TOP_K: usize = 5;

/// Dense candidates fetched per requested result.
pub const DEFAULT_DENSE_MULTIPLIER: usize = 2;

/// Sparse candidates fetched per requested result.
pub const DEFAULT_SPARSE_MULTIPLIER: usize = 2;

/// Factor applied to score thresholds during the single relaxation attempt.
pub const DEFAULT_RELAX_FACTOR: f32 = 0.5;

/// Bonus added to a fused candidate matching an inferred query preference.
pub const DEFAULT_PREFERENCE_BONUS: f32 = 0.01;

/// Default `ef` parameter forwarded to the vector store's HNSW search.
pub const DEFAULT_EF_SEARCH: usize = 128;

/// Default per-stage timeout for external calls, in milliseconds.
pub const DEFAULT_STAGE_TIMEOUT_MS: u64 = 5_000;

/// Default bound on one snapshot load, persist or build, in milliseconds.
pub const DEFAULT_SNAPSHOT_IO_TIMEOUT_MS: u64 = 120_000;

/// Maximum number of results (`top_k`) per retrieval request.
pub const MAX_TOP_K: usize = 1_000;

/// Maximum allowed embedding dimension.
pub const MAX_DIMENSION: usize = 4096;

/// Magic bytes written before the CRC32 footer of a lexical snapshot.
pub const SNAPSHOT_MAGIC: &[u8; 4] = b"HSL1";

/// Attribute field carrying equipment tags, used by the preference boost.
pub const EQUIPMENT_FIELD: &str = "equipment";
