//! Optional cross-encoder rerank stage.
//!
//! Scores the top-N fused candidates jointly with the query and blends:
//! `final = blend · rerank + (1 - blend) · fused`. Candidates beyond the top-N
//! keep their fusion order after the reranked block. A failing or slow scorer
//! skips the stage; only cancellation propagates.

use crate::backend::CrossEncoder;
use crate::controller::guarded;
use crate::metrics;
use hybridsearch_core::search::{sort_candidates, Candidate};
use hybridsearch_core::{DocId, Document, Result, RetrievalError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct RerankStage {
    encoder: Arc<dyn CrossEncoder>,
    top_n: usize,
    blend: f32,
    timeout: Duration,
}

impl RerankStage {
    pub fn new(encoder: Arc<dyn CrossEncoder>, top_n: usize, blend: f32, timeout: Duration) -> Self {
        Self {
            encoder,
            top_n,
            blend,
            timeout,
        }
    }

    /// Reranks `candidates` (sorted by fusion score). On scorer failure the
    /// input order is returned unchanged.
    pub async fn rerank(
        &self,
        query: &str,
        mut candidates: Vec<Candidate>,
        documents: &HashMap<DocId, Arc<Document>>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Candidate>> {
        let n = self.top_n.min(candidates.len());
        if n == 0 {
            return Ok(candidates);
        }
        let texts: Vec<&str> = candidates[..n]
            .iter()
            .map(|c| documents.get(&c.doc_id).map(|d| d.text.as_str()).unwrap_or(""))
            .collect();

        let scored = guarded("rerank", self.timeout, cancel, self.encoder.score(query, &texts)).await;
        let scores = match scored {
            Ok(scores) if scores.len() == n => scores,
            Ok(scores) => {
                tracing::warn!(
                    "Reranker returned {} scores for {} texts, keeping fusion order",
                    scores.len(),
                    n
                );
                metrics::record_rerank_failure();
                return Ok(candidates);
            }
            Err(RetrievalError::Cancelled) => return Err(RetrievalError::Cancelled),
            Err(e) => {
                tracing::warn!("Reranker unavailable, keeping fusion order: {}", e);
                metrics::record_rerank_failure();
                return Ok(candidates);
            }
        };

        for (candidate, score) in candidates[..n].iter_mut().zip(scores) {
            candidate.rerank_score = Some(score);
            candidate.final_score = self.blend * score + (1.0 - self.blend) * candidate.fused_score;
        }
        sort_candidates(&mut candidates[..n]);
        tracing::debug!("Reranked top {} of {} candidates", n, candidates.len());
        Ok(candidates)
    }
}
