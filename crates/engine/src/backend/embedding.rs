//! Embeddings over an OpenAI-compatible `/embeddings` endpoint.

use crate::backend::{unavailable, Embedder};
use crate::settings::EmbeddingSettings;
use async_trait::async_trait;
use hybridsearch_core::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const BACKEND: &str = "embedding model";

pub struct HttpEmbedder {
    client: reqwest::Client,
    url: String,
    model: String,
    dimension: usize,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl HttpEmbedder {
    pub fn new(settings: &EmbeddingSettings, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::InvalidConfig(format!("embedding client: {}", e)))?;
        Ok(Self {
            client,
            url: format!("{}/embeddings", settings.url.trim_end_matches('/')),
            model: settings.model.clone(),
            dimension: settings.dimension,
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut request = self.client.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let resp = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(unavailable(BACKEND))?;
        let body: EmbeddingResponse = resp.json().await.map_err(unavailable(BACKEND))?;

        let vector = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| RetrievalError::backend(BACKEND, "response contained no embedding"))?;
        if vector.len() != self.dimension {
            return Err(RetrievalError::EmbeddingDimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}
