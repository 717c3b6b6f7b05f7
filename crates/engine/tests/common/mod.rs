//! In-memory backends for controller tests.

#![allow(dead_code)]

use async_trait::async_trait;
use hybridsearch_core::search::NativePredicate;
use hybridsearch_core::{Attributes, DocId, Document, LexicalSnapshot, Result, RetrievalError};
use hybridsearch_engine::backend::{CrossEncoder, Embedder, VectorStore};
use hybridsearch_engine::settings::RetrievalSettings;
use hybridsearch_engine::{AdaptiveRetriever, LexicalIndexHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DIM: usize = 4;

pub fn doc(id: &str, text: &str, attrs: Vec<(&str, hybridsearch_core::AttributeValue)>) -> Document {
    let attributes: Attributes = attrs.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    Document::new(id, text, attributes)
}

pub fn hits(items: &[(&str, f32)]) -> Vec<(DocId, f32)> {
    items.iter().map(|(id, s)| (id.to_string(), *s)).collect()
}

/// Small exercise corpus used by most scenarios.
pub fn corpus() -> Vec<Document> {
    vec![
        doc(
            "d1",
            "gainage planche abdominaux",
            vec![("domain", "exercise".into()), ("equipment", "dumbbell".into())],
        ),
        doc(
            "d2",
            "squat goblet haltère squat jambes",
            vec![("domain", "exercise".into()), ("equipment", vec!["dumbbell", "mat"].into())],
        ),
        doc(
            "d3",
            "squat fentes jambes",
            vec![("domain", "exercise".into()), ("equipment", "bands".into())],
        ),
        doc(
            "d4",
            "pompes pectoraux triceps",
            vec![("domain", "exercise".into()), ("equipment", "none".into())],
        ),
        doc(
            "n1",
            "protéines récupération après la séance",
            vec![("domain", "nutrition".into())],
        ),
    ]
}

pub fn index_of(docs: Vec<Document>) -> Arc<LexicalIndexHandle> {
    Arc::new(LexicalIndexHandle::from_snapshot(LexicalSnapshot::build(docs)))
}

#[derive(Default)]
pub struct FakeEmbedder {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub wrong_dimension: bool,
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn dimension(&self) -> usize {
        DIM
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RetrievalError::backend("embedding model", "connection refused"));
        }
        let len = if self.wrong_dimension { DIM + 1 } else { DIM };
        let seed = text.len() as f32;
        Ok((0..len).map(|i| (seed + i as f32) / 100.0).collect())
    }
}

/// Vector store with separate answers for filtered and unfiltered searches.
#[derive(Default)]
pub struct FakeStore {
    pub filtered: Vec<(DocId, f32)>,
    pub unfiltered: Vec<(DocId, f32)>,
    pub remote_docs: HashMap<DocId, Document>,
    pub fail_search: bool,
    pub fail_fetch: bool,
    pub delay: Option<Duration>,
    /// One entry per search call: was the native filter empty?
    pub search_log: Mutex<Vec<bool>>,
    pub thresholds: Mutex<Vec<Option<f32>>>,
    pub fetch_log: Mutex<Vec<Vec<DocId>>>,
}

impl FakeStore {
    pub fn search_calls(&self) -> usize {
        self.search_log.lock().len()
    }
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn search(
        &self,
        _vector: &[f32],
        filter: &NativePredicate,
        top_k: usize,
        _ef_search: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<(DocId, f32)>> {
        self.search_log.lock().push(filter.is_empty());
        self.thresholds.lock().push(score_threshold);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_search {
            return Err(RetrievalError::backend("vector store", "503 Service Unavailable"));
        }
        let source = if filter.is_empty() { &self.unfiltered } else { &self.filtered };
        Ok(source.iter().take(top_k).cloned().collect())
    }

    async fn fetch(&self, ids: &[DocId]) -> Result<Vec<Document>> {
        self.fetch_log.lock().push(ids.to_vec());
        if self.fail_fetch {
            return Err(RetrievalError::backend("vector store", "fetch failed"));
        }
        Ok(ids.iter().filter_map(|id| self.remote_docs.get(id).cloned()).collect())
    }
}

/// Scores texts from a fixed table; unknown texts score 0.
#[derive(Default)]
pub struct FakeEncoder {
    pub scores: HashMap<String, f32>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[async_trait]
impl CrossEncoder for FakeEncoder {
    async fn score(&self, _query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RetrievalError::backend("reranker", "model not loaded"));
        }
        Ok(texts
            .iter()
            .map(|t| self.scores.get(*t).copied().unwrap_or(0.0))
            .collect())
    }
}

pub fn retriever(
    settings: RetrievalSettings,
    embedder: Arc<FakeEmbedder>,
    store: Arc<FakeStore>,
    index: Arc<LexicalIndexHandle>,
) -> AdaptiveRetriever {
    AdaptiveRetriever::new(settings, embedder, store, index)
}
