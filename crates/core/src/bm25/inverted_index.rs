//! Inverted index for BM25 full-text search.
//!
//! Maps terms to postings lists (document ID + term frequency). Documents are
//! identified by internal u32 IDs for memory efficiency. The index is built
//! once per snapshot; there is no incremental removal.

use crate::bm25::tokenizer::tokenize;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single entry in a term's postings list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// Internal u32 document ID.
    pub doc_id: u32,
    /// Number of times the term appears in this document.
    pub term_frequency: u32,
}

/// Inverted index mapping terms to postings lists.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    /// term → list of postings
    pub index: HashMap<String, Vec<Posting>>,
    /// internal_id → document length (number of tokens). Indexed by u32 internal ID.
    pub doc_lengths: Vec<u32>,
    /// Total number of documents indexed
    pub doc_count: u32,
    /// Sum of all document lengths (for average calculation)
    pub total_doc_length: u64,
}

impl InvertedIndex {
    /// Creates a new empty inverted index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a document's text using its internal u32 ID.
    ///
    /// Internal IDs must be assigned densely and in order (0, 1, 2, ...).
    pub fn add_document(&mut self, internal_id: u32, text: &str) {
        let tokens = tokenize(text);
        let doc_len = tokens.len() as u32;

        let idx = internal_id as usize;
        if idx >= self.doc_lengths.len() {
            self.doc_lengths.resize(idx + 1, 0);
        }
        self.doc_lengths[idx] = doc_len;
        self.doc_count += 1;
        self.total_doc_length += doc_len as u64;

        let mut tf_map: HashMap<&str, u32> = HashMap::new();
        for token in tokens.iter() {
            *tf_map.entry(token).or_insert(0) += 1;
        }

        for (term, tf) in tf_map {
            self.index
                .entry(term.to_string())
                .or_default()
                .push(Posting {
                    doc_id: internal_id,
                    term_frequency: tf,
                });
        }
    }

    /// Returns the average document length across all indexed documents.
    pub fn average_doc_length(&self) -> f32 {
        if self.doc_count == 0 {
            return 0.0;
        }
        self.total_doc_length as f32 / self.doc_count as f32
    }

    /// Number of distinct indexed terms.
    pub fn vocabulary_size(&self) -> usize {
        self.index.len()
    }

    /// Validate internal invariants after deserialization.
    pub fn validate(&self) -> Result<(), String> {
        if self.doc_lengths.len() != self.doc_count as usize {
            return Err(format!(
                "doc_lengths length {} != doc_count {}",
                self.doc_lengths.len(),
                self.doc_count
            ));
        }
        let total: u64 = self.doc_lengths.iter().map(|&l| l as u64).sum();
        if total != self.total_doc_length {
            return Err(format!(
                "sum of doc_lengths {} != total_doc_length {}",
                total, self.total_doc_length
            ));
        }
        for (term, postings) in &self.index {
            if postings.is_empty() {
                return Err(format!("term '{}' has an empty postings list", term));
            }
            for posting in postings {
                if posting.doc_id >= self.doc_count {
                    return Err(format!(
                        "posting doc_id {} out of bounds (doc_count={}) for term '{}'",
                        posting.doc_id, self.doc_count, term
                    ));
                }
                if posting.term_frequency == 0 {
                    return Err(format!("zero term frequency for term '{}'", term));
                }
            }
        }
        Ok(())
    }
}
