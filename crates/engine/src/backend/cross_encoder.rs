//! Cross-encoder client for a `/rerank` endpoint (text-embeddings-inference
//! style). The server returns `(index, score)` pairs sorted by score; they are
//! put back in input order here.

use crate::backend::{unavailable, CrossEncoder};
use crate::settings::RerankerSettings;
use async_trait::async_trait;
use hybridsearch_core::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BACKEND: &str = "reranker";

pub struct HttpCrossEncoder {
    client: reqwest::Client,
    url: String,
    model: String,
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    texts: &'a [&'a str],
    truncate: bool,
}

#[derive(Deserialize)]
struct RankedText {
    index: usize,
    score: f32,
}

impl HttpCrossEncoder {
    pub fn new(settings: &RerankerSettings, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::InvalidConfig(format!("reranker client: {}", e)))?;
        Ok(Self {
            client,
            url: format!("{}/rerank", settings.url.trim_end_matches('/')),
            model: settings.model.clone(),
        })
    }
}

#[async_trait]
impl CrossEncoder for HttpCrossEncoder {
    async fn score(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let resp = self
            .client
            .post(&self.url)
            .json(&RerankRequest {
                model: &self.model,
                query,
                texts,
                truncate: true,
            })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(unavailable(BACKEND))?;
        let ranked: Vec<RankedText> = resp.json().await.map_err(unavailable(BACKEND))?;

        let mut scores: Vec<Option<f32>> = vec![None; texts.len()];
        for r in ranked {
            match scores.get_mut(r.index) {
                Some(slot) => *slot = Some(r.score),
                None => {
                    return Err(RetrievalError::backend(
                        BACKEND,
                        format!("index {} out of range for {} texts", r.index, texts.len()),
                    ))
                }
            }
        }
        scores
            .into_iter()
            .enumerate()
            .map(|(i, s)| s.ok_or_else(|| RetrievalError::backend(BACKEND, format!("no score for text {}", i))))
            .collect()
    }
}
