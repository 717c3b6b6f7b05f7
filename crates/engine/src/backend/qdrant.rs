//! Qdrant REST adapter: filtered search, batched retrieve and full scroll.
//!
//! Document ids are the string form of Qdrant point ids (unsigned integers
//! or UUIDs). The passage text lives under the configured payload key; every
//! other scalar or list payload entry becomes a document attribute.

use crate::backend::{unavailable, DocumentSource, VectorStore};
use crate::settings::VectorStoreSettings;
use async_trait::async_trait;
use hybridsearch_core::document::attributes_from_json;
use hybridsearch_core::search::NativePredicate;
use hybridsearch_core::{DocId, Document, Result, RetrievalError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const BACKEND: &str = "vector store";

/// HTTP client for one Qdrant collection.
#[derive(Clone)]
pub struct QdrantStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    api_key: Option<String>,
    text_key: String,
    scroll_batch: usize,
}

#[derive(Deserialize)]
struct QdrantResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct ScoredPoint {
    id: Value,
    score: f32,
}

#[derive(Deserialize)]
struct Record {
    id: Value,
    #[serde(default)]
    payload: Option<serde_json::Map<String, Value>>,
}

#[derive(Deserialize)]
struct ScrollPage {
    points: Vec<Record>,
    #[serde(default)]
    next_page_offset: Option<Value>,
}

#[derive(Serialize)]
struct SearchParams {
    hnsw_ef: usize,
}

#[derive(Serialize)]
struct SearchBody<'a> {
    vector: &'a [f32],
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a NativePredicate>,
    params: SearchParams,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    score_threshold: Option<f32>,
}

#[derive(Serialize)]
struct RetrieveBody {
    ids: Vec<Value>,
    with_payload: bool,
    with_vector: bool,
}

#[derive(Serialize)]
struct ScrollBody {
    limit: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<Value>,
    with_payload: bool,
    with_vector: bool,
}

fn point_id_to_string(id: &Value) -> DocId {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Canonical unsigned integers go back as numeric point ids; anything else
/// (UUIDs, zero-padded numbers) stays a string.
fn doc_id_to_point_id(id: &str) -> Value {
    match id.parse::<u64>() {
        Ok(n) if n.to_string() == id => Value::from(n),
        _ => Value::String(id.to_string()),
    }
}

impl QdrantStore {
    /// Creates a client. `timeout` bounds every HTTP call.
    pub fn new(settings: &VectorStoreSettings, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::InvalidConfig(format!("vector store client: {}", e)))?;
        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            collection: settings.collection.clone(),
            api_key: settings.api_key.clone(),
            text_key: settings.text_key.clone(),
            scroll_batch: settings.scroll_batch,
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}/collections/{}/{}", self.base_url, self.collection, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }
        let resp = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(unavailable(BACKEND))?;
        let parsed: QdrantResponse<T> = resp.json().await.map_err(unavailable(BACKEND))?;
        Ok(parsed.result)
    }

    fn to_document(&self, record: Record) -> Option<Document> {
        let id = point_id_to_string(&record.id);
        let payload = record.payload.unwrap_or_default();
        let Some(text) = payload.get(&self.text_key).and_then(Value::as_str) else {
            tracing::warn!("Point {} has no '{}' payload, skipped", id, self.text_key);
            return None;
        };
        let attributes = attributes_from_json(&payload, &self.text_key);
        Some(Document::new(id, text, attributes))
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn search(
        &self,
        vector: &[f32],
        filter: &NativePredicate,
        top_k: usize,
        ef_search: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<(DocId, f32)>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let body = SearchBody {
            vector,
            limit: top_k,
            filter: (!filter.is_empty()).then_some(filter),
            params: SearchParams { hnsw_ef: ef_search },
            with_payload: false,
            score_threshold,
        };
        let points: Vec<ScoredPoint> = self.post("points/search", &body).await?;
        Ok(points
            .into_iter()
            .map(|p| (point_id_to_string(&p.id), p.score))
            .collect())
    }

    async fn fetch(&self, ids: &[DocId]) -> Result<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let body = RetrieveBody {
            ids: ids.iter().map(|id| doc_id_to_point_id(id)).collect(),
            with_payload: true,
            with_vector: false,
        };
        let records: Vec<Record> = self.post("points", &body).await?;
        Ok(records
            .into_iter()
            .filter_map(|r| self.to_document(r))
            .collect())
    }
}

#[async_trait]
impl DocumentSource for QdrantStore {
    async fn scroll_all(&self) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut offset: Option<Value> = None;
        loop {
            let body = ScrollBody {
                limit: self.scroll_batch,
                offset: offset.take(),
                with_payload: true,
                with_vector: false,
            };
            let page: ScrollPage = self.post("points/scroll", &body).await?;
            documents.extend(page.points.into_iter().filter_map(|r| self.to_document(r)));
            match page.next_page_offset {
                Some(next) if !next.is_null() => offset = Some(next),
                _ => break,
            }
        }
        tracing::info!(
            "Scrolled {} documents from collection '{}'",
            documents.len(),
            self.collection
        );
        Ok(documents)
    }
}
