//! Retrieval metrics recorded through the `metrics` facade.
//!
//! No exporter is installed here; the embedding application decides where
//! metrics go.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Records a finished request. `outcome` is `answered`, `insufficient_evidence`
/// or the error kind.
pub fn record_request(strict: bool, outcome: &str, duration: Duration) {
    let mode = if strict { "strict" } else { "adaptive" };
    counter!(
        "hybridsearch_requests_total",
        "mode" => mode,
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("hybridsearch_request_duration_seconds", "mode" => mode)
        .record(duration.as_secs_f64());
}

pub fn record_relaxation() {
    counter!("hybridsearch_relaxations_total").increment(1);
}

pub fn record_rerank_failure() {
    counter!("hybridsearch_rerank_failures_total").increment(1);
}

pub fn record_dense_failure() {
    counter!("hybridsearch_dense_failures_total").increment(1);
}

pub fn record_sparse_empty() {
    counter!("hybridsearch_sparse_empty_total").increment(1);
}

/// Updates the `hybridsearch_lexical_documents` gauge after a snapshot swap.
pub fn update_lexical_documents(count: usize) {
    gauge!("hybridsearch_lexical_documents").set(count as f64);
}
