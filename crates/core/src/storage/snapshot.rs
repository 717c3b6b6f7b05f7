//! Immutable lexical snapshot: BM25 index, document id mapping and the
//! hydration cache.
//!
//! Internal ids are assigned densely in ascending `DocId` order, so ties broken
//! by internal id are ties broken by document id.

use crate::bm25::{bm25_search_filtered, InvertedIndex};
use crate::document::{Attributes, DocId, Document};
use crate::search::filter::AttributePredicate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// A built lexical index. Never mutated after construction; a rebuild produces
/// a new snapshot that replaces the old one atomically.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LexicalSnapshot {
    /// internal id → document (text and attributes). Indexed by internal id.
    pub documents: Vec<Arc<Document>>,
    pub bm25_index: InvertedIndex,
    /// DocId → internal u32 id.
    pub id_to_internal: HashMap<DocId, u32>,
}

impl LexicalSnapshot {
    /// Builds a snapshot from a document corpus. Duplicate ids keep the last
    /// occurrence.
    pub fn build<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let mut by_id: BTreeMap<DocId, Document> = BTreeMap::new();
        let mut duplicates = 0usize;
        for doc in documents {
            if by_id.insert(doc.id.clone(), doc).is_some() {
                duplicates += 1;
            }
        }
        if duplicates > 0 {
            tracing::warn!("Snapshot build: {} duplicate document ids replaced", duplicates);
        }

        let mut snapshot = Self {
            documents: Vec::with_capacity(by_id.len()),
            bm25_index: InvertedIndex::new(),
            id_to_internal: HashMap::with_capacity(by_id.len()),
        };
        for (internal_id, (id, doc)) in by_id.into_iter().enumerate() {
            let internal_id = internal_id as u32;
            snapshot.bm25_index.add_document(internal_id, &doc.text);
            snapshot.id_to_internal.insert(id, internal_id);
            snapshot.documents.push(Arc::new(doc));
        }

        tracing::debug!(
            "Built lexical snapshot: {} documents, {} terms",
            snapshot.documents.len(),
            snapshot.bm25_index.vocabulary_size()
        );
        snapshot
    }

    /// BM25 search restricted to documents accepted by `predicate`.
    ///
    /// Returns `(DocId, score)` in descending score order, ties broken by
    /// ascending DocId.
    pub fn search(&self, query: &str, top_k: usize, predicate: &AttributePredicate) -> Vec<(DocId, f32)> {
        let always = predicate.is_always_true();
        let accept = |internal_id: u32| {
            always
                || self
                    .documents
                    .get(internal_id as usize)
                    .is_some_and(|doc| predicate.matches(&doc.attributes))
        };
        bm25_search_filtered(&self.bm25_index, query, top_k, accept)
            .into_iter()
            .filter_map(|(internal_id, score)| {
                self.documents
                    .get(internal_id as usize)
                    .map(|doc| (doc.id.clone(), score))
            })
            .collect()
    }

    /// Cached document by id.
    pub fn document(&self, id: &str) -> Option<&Arc<Document>> {
        self.id_to_internal
            .get(id)
            .and_then(|&internal| self.documents.get(internal as usize))
    }

    /// Cached attributes by id.
    pub fn attributes_of(&self, id: &str) -> Option<&Attributes> {
        self.document(id).map(|doc| &doc.attributes)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Validate internal invariants after deserialization.
    ///
    /// Checks that the BM25 index is consistent, that the id mapping is
    /// symmetric with the document table, and that internal ids follow
    /// ascending DocId order.
    pub fn validate(&self) -> Result<(), String> {
        self.bm25_index.validate()?;

        let n = self.documents.len();
        if self.bm25_index.doc_count as usize != n {
            return Err(format!(
                "bm25 doc_count {} != documents length {}",
                self.bm25_index.doc_count, n
            ));
        }
        if self.id_to_internal.len() != n {
            return Err(format!(
                "id_to_internal length {} != documents length {}",
                self.id_to_internal.len(),
                n
            ));
        }
        for (internal, doc) in self.documents.iter().enumerate() {
            match self.id_to_internal.get(&doc.id) {
                Some(&mapped) if mapped as usize == internal => {}
                Some(&mapped) => {
                    return Err(format!(
                        "document '{}' at internal id {} maps to {}",
                        doc.id, internal, mapped
                    ));
                }
                None => return Err(format!("document '{}' missing from id map", doc.id)),
            }
        }
        if let Some(pair) = self.documents.windows(2).find(|w| w[0].id >= w[1].id) {
            return Err(format!(
                "document ids out of order: '{}' before '{}'",
                pair[0].id, pair[1].id
            ));
        }
        Ok(())
    }
}
