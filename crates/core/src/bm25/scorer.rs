//! BM25 Okapi scoring engine.
//!
//! Scores documents against a query using the BM25 formula with `k1` and `b`
//! fixed at [`config::BM25_K1`] and [`config::BM25_B`].

use crate::bm25::inverted_index::InvertedIndex;
use crate::bm25::tokenizer::tokenize;
use crate::config;
use ordered_float::OrderedFloat;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

/// BM25 Okapi scoring for a query against the inverted index.
/// Returns scored documents (internal_id, score) sorted by descending score,
/// ties broken by ascending internal ID.
pub fn bm25_search(index: &InvertedIndex, query: &str, k: usize) -> Vec<(u32, f32)> {
    bm25_search_filtered(index, query, k, |_| true)
}

/// Same as [`bm25_search`], restricted to documents accepted by `filter`.
///
/// Rejected documents are skipped before they enter the top-k heap, so the
/// result still holds up to `k` accepted documents.
pub fn bm25_search_filtered<F>(
    index: &InvertedIndex,
    query: &str,
    k: usize,
    filter: F,
) -> Vec<(u32, f32)>
where
    F: Fn(u32) -> bool,
{
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() || index.doc_count == 0 || k == 0 {
        return Vec::new();
    }

    let avgdl = index.average_doc_length();
    let n = index.doc_count as f32;
    let k1 = config::BM25_K1;
    let b = config::BM25_B;

    let mut scores: HashMap<u32, f32> = HashMap::with_capacity(256.min(index.doc_count as usize));

    for token in query_tokens.iter() {
        if let Some(postings) = index.index.get(token) {
            let df = postings.len() as f32;
            // IDF: log((N - df + 0.5) / (df + 0.5) + 1)
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for posting in postings {
                let dl = index
                    .doc_lengths
                    .get(posting.doc_id as usize)
                    .copied()
                    .unwrap_or(0) as f32;
                let tf = posting.term_frequency as f32;

                let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * dl / avgdl));
                *scores.entry(posting.doc_id).or_insert(0.0) += idf * tf_norm;
            }
        }
    }

    // Partial sort: O(n log k) via min-heap of size k. The heap minimum is the
    // lowest score, and among equal scores the highest ID.
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f32>, Reverse<u32>)>> =
        BinaryHeap::with_capacity(k + 1);
    for (id, score) in scores {
        if !filter(id) {
            continue;
        }
        heap.push(Reverse((OrderedFloat(score), Reverse(id))));
        if heap.len() > k {
            heap.pop();
        }
    }
    let mut results: Vec<(u32, f32)> = heap
        .into_iter()
        .map(|Reverse((s, Reverse(id)))| (id, s.0))
        .collect();
    results.sort_unstable_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    results
}
