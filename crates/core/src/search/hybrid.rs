//! Hybrid search fusion strategies.
//!
//! Combines dense (vector) and sparse (BM25) result lists into a single ranked
//! list of [`Candidate`]s. Two strategies are available:
//! - **RRF** (Reciprocal Rank Fusion): rank-based combination
//! - **Weighted**: score-based combination with min-max normalization and alpha weighting
//!
//! Both are pure and deterministic: ties are broken by document id.

use crate::config;
use crate::document::DocId;
use crate::search::types::{sort_candidates, Candidate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fusion strategy selector used in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionMethod {
    #[default]
    Rrf,
    Weighted,
}

/// Fusion strategy with its parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FusionStrategy {
    /// `score(d) = Σ 1 / (k + rank_i(d))`, ranks starting at 1.
    Rrf { k: f32 },
    /// `score(d) = alpha · norm_dense(d) + (1 - alpha) · norm_sparse(d)`.
    Weighted { alpha: f32 },
}

impl Default for FusionStrategy {
    fn default() -> Self {
        FusionStrategy::Rrf { k: config::RRF_K }
    }
}

impl FusionStrategy {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            FusionStrategy::Rrf { .. } => "rrf",
            FusionStrategy::Weighted { .. } => "weighted",
        }
    }
}

#[derive(Clone, Copy)]
enum Source {
    Dense,
    Sparse,
}

/// Adds `contribution` for `id` unless this source already scored it
/// (only the first occurrence of a document in a list counts).
fn accumulate(
    acc: &mut HashMap<DocId, Candidate>,
    id: &DocId,
    raw: f32,
    contribution: f32,
    source: Source,
) {
    let candidate = acc
        .entry(id.clone())
        .or_insert_with(|| Candidate::new(id.clone()));
    let slot = match source {
        Source::Dense => &mut candidate.dense_score,
        Source::Sparse => &mut candidate.sparse_score,
    };
    if slot.is_some() {
        return;
    }
    *slot = Some(raw);
    candidate.fused_score += contribution;
}

fn finish(acc: HashMap<DocId, Candidate>) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = acc
        .into_values()
        .map(|mut c| {
            c.final_score = c.fused_score;
            c
        })
        .collect();
    sort_candidates(&mut candidates);
    candidates
}

/// Reciprocal Rank Fusion: combines ranked lists.
/// A document present in only one list still receives its partial score.
pub fn rrf_fusion(dense: &[(DocId, f32)], sparse: &[(DocId, f32)], rrf_k: f32) -> Vec<Candidate> {
    let mut acc: HashMap<DocId, Candidate> = HashMap::with_capacity(dense.len() + sparse.len());

    for (rank, (id, raw)) in dense.iter().enumerate() {
        accumulate(&mut acc, id, *raw, 1.0 / (rrf_k + rank as f32 + 1.0), Source::Dense);
    }
    for (rank, (id, raw)) in sparse.iter().enumerate() {
        accumulate(&mut acc, id, *raw, 1.0 / (rrf_k + rank as f32 + 1.0), Source::Sparse);
    }

    finish(acc)
}

/// Linear combination with per-list min-max normalization.
///
/// An empty list contributes 0 to every document; a list whose scores are all
/// equal normalizes to 1.0.
pub fn weighted_fusion(dense: &[(DocId, f32)], sparse: &[(DocId, f32)], alpha: f32) -> Vec<Candidate> {
    let mut acc: HashMap<DocId, Candidate> = HashMap::with_capacity(dense.len() + sparse.len());

    if let Some((min_d, max_d)) = min_max(dense) {
        let range = max_d - min_d;
        for (id, score) in dense {
            let norm = if range < f32::EPSILON {
                1.0
            } else {
                (score - min_d) / range
            };
            accumulate(&mut acc, id, *score, alpha * norm, Source::Dense);
        }
    }

    if let Some((min_s, max_s)) = min_max(sparse) {
        let range = max_s - min_s;
        for (id, score) in sparse {
            let norm = if range < f32::EPSILON {
                1.0
            } else {
                (score - min_s) / range
            };
            accumulate(&mut acc, id, *score, (1.0 - alpha) * norm, Source::Sparse);
        }
    }

    finish(acc)
}

/// Fuses dense and sparse lists with the given strategy.
pub fn fuse(
    dense: &[(DocId, f32)],
    sparse: &[(DocId, f32)],
    strategy: FusionStrategy,
) -> Vec<Candidate> {
    match strategy {
        FusionStrategy::Rrf { k } => rrf_fusion(dense, sparse, k),
        FusionStrategy::Weighted { alpha } => weighted_fusion(dense, sparse, alpha),
    }
}

/// Single-pass min/max computation.
fn min_max(results: &[(DocId, f32)]) -> Option<(f32, f32)> {
    if results.is_empty() {
        return None;
    }
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for (_, s) in results {
        min = min.min(*s);
        max = max.max(*s);
    }
    Some((min, max))
}
