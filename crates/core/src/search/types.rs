//! Candidate and result types for retrieval requests.

use crate::document::{DocId, Document};
use std::cmp::Ordering;
use std::sync::Arc;

/// A fused candidate, produced fresh per request and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub doc_id: DocId,
    /// Raw dense similarity, if the dense list contained this document.
    pub dense_score: Option<f32>,
    /// Raw BM25 score, if the sparse list contained this document.
    pub sparse_score: Option<f32>,
    /// Fusion score, including any preference bonus.
    pub fused_score: f32,
    /// Cross-encoder score, when the rerank stage scored this candidate.
    pub rerank_score: Option<f32>,
    /// Ranking score at the current stage: `fused_score` until reranked.
    pub final_score: f32,
}

impl Candidate {
    pub(crate) fn new(doc_id: DocId) -> Self {
        Self {
            doc_id,
            dense_score: None,
            sparse_score: None,
            fused_score: 0.0,
            rerank_score: None,
            final_score: 0.0,
        }
    }
}

/// Sorts by descending `final_score`, ties broken by ascending `doc_id`.
pub fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
}

/// A document with its final score and the per-stage scores that produced it.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    /// The matched document (shared reference).
    pub document: Arc<Document>,
    /// Final score (fusion score, or blended rerank score).
    pub score: f32,
    pub dense_score: Option<f32>,
    pub sparse_score: Option<f32>,
    pub rerank_score: Option<f32>,
}

impl ScoredDocument {
    /// Pairs a hydrated document with its candidate scores.
    pub fn from_candidate(document: Arc<Document>, candidate: &Candidate) -> Self {
        Self {
            document,
            score: candidate.final_score,
            dense_score: candidate.dense_score,
            sparse_score: candidate.sparse_score,
            rerank_score: candidate.rerank_score,
        }
    }
}

/// Whether the request produced usable evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalOutcome {
    /// Non-empty, scored result list.
    Answered,
    /// No sufficiently relevant results. Not an error.
    InsufficientEvidence,
}

/// Ordered result of one retrieval request.
#[derive(Debug, Clone)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredDocument>,
    /// The lexical stage contributed zero candidates.
    pub sparse_was_empty: bool,
    /// The single relaxation attempt ran for this request.
    pub relaxed: bool,
    pub outcome: RetrievalOutcome,
}

impl RetrievalResult {
    /// Builds a result; the outcome follows from whether `hits` is empty.
    pub fn new(hits: Vec<ScoredDocument>, sparse_was_empty: bool, relaxed: bool) -> Self {
        let outcome = if hits.is_empty() {
            RetrievalOutcome::InsufficientEvidence
        } else {
            RetrievalOutcome::Answered
        };
        Self {
            hits,
            sparse_was_empty,
            relaxed,
            outcome,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Document ids in rank order.
    pub fn doc_ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.document.id.as_str()).collect()
    }
}
