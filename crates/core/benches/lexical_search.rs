//! Lexical snapshot benchmark on a synthetic French fitness corpus.
//! Measures build time, snapshot size, BM25 QPS (with and without a
//! predicate) and fusion throughput.
//!
//! Usage: cargo bench --bench lexical_search

use hybridsearch_core::search::{compile, fuse, AttributePredicate, FusionStrategy};
use hybridsearch_core::storage::{load_snapshot, save_snapshot};
use hybridsearch_core::{Document, FieldClause, FilterSpec, LexicalSnapshot};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::Instant;

const NUM_DOCS: usize = 50_000;
const NUM_QUERIES: usize = 2_000;

const VOCAB: &[&str] = &[
    "squat", "fentes", "pompes", "gainage", "planche", "tractions", "développé", "couché",
    "soulevé", "terre", "haltère", "élastique", "barre", "kettlebell", "tapis", "jambes",
    "fessiers", "dos", "pectoraux", "épaules", "biceps", "triceps", "abdominaux", "mollets",
    "cardio", "mobilité", "étirement", "échauffement", "récupération", "protéines",
    "glucides", "hydratation", "sommeil", "débutant", "intermédiaire", "avancé", "séance",
    "programme", "répétitions", "séries", "tempo", "amplitude", "posture", "respiration",
];
const EQUIPMENT: &[&str] = &["none", "dumbbell", "bands", "mat", "full_gym"];
const LEVELS: &[&str] = &["Débutant", "Intermédiaire", "Avancé"];

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn synthetic_corpus(rng: &mut StdRng) -> Vec<Document> {
    (0..NUM_DOCS)
        .map(|i| {
            let len = rng.gen_range(20..80);
            let text: Vec<&str> = (0..len).map(|_| pick(rng, VOCAB)).collect();
            let attributes = HashMap::from([
                ("equipment".to_string(), vec![pick(rng, EQUIPMENT)].into()),
                ("level".to_string(), pick(rng, LEVELS).into()),
            ]);
            Document::new(format!("doc-{i:06}"), text.join(" "), attributes)
        })
        .collect()
}

fn main() {
    println!("=== Lexical Snapshot Benchmark (synthetic, {NUM_DOCS} docs) ===");
    println!();

    // Fixed seed so runs are comparable.
    let mut rng = StdRng::seed_from_u64(42);
    let corpus = synthetic_corpus(&mut rng);

    println!("--- Snapshot Construction ---");
    let t0 = Instant::now();
    let snapshot = LexicalSnapshot::build(corpus);
    let build_time = t0.elapsed();
    println!(
        "Build time: {:.3}s ({:.0} docs/s)",
        build_time.as_secs_f64(),
        NUM_DOCS as f64 / build_time.as_secs_f64()
    );
    println!("Vocabulary size: {} terms", snapshot.bm25_index.vocabulary_size());
    println!("Avg doc length: {:.1} tokens", snapshot.bm25_index.average_doc_length());

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bench.hsl");
    let t0 = Instant::now();
    save_snapshot(&snapshot, &path).expect("save snapshot");
    let save_time = t0.elapsed();
    let t0 = Instant::now();
    let reloaded = load_snapshot(&path).expect("load snapshot");
    let load_time = t0.elapsed();
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    println!(
        "Persist: save {:.3}s, load+validate {:.3}s, {:.1} MiB",
        save_time.as_secs_f64(),
        load_time.as_secs_f64(),
        size as f64 / (1024.0 * 1024.0)
    );
    assert_eq!(reloaded.len(), snapshot.len());

    let queries: Vec<String> = (0..NUM_QUERIES)
        .map(|_| {
            let len = rng.gen_range(2..6);
            (0..len).map(|_| pick(&mut rng, VOCAB)).collect::<Vec<_>>().join(" ")
        })
        .collect();

    let filter = compile(
        &FilterSpec::default()
            .require(FieldClause::equals("equipment", "dumbbell"))
            .prefer(FieldClause::any_of("level", ["Débutant", "Intermédiaire"]))
            .min_optional(1),
    )
    .expect("valid filter");

    println!();
    println!("--- Retrieval (BM25 Okapi, k1=1.2, b=0.75) ---");
    for (label, predicate) in [
        ("unfiltered", AttributePredicate::default()),
        ("filtered", filter.predicate.clone()),
    ] {
        for &k in &[10usize, 100] {
            for q in queries.iter().take(50) {
                let _ = snapshot.search(q, k, &predicate);
            }
            let t0 = Instant::now();
            let mut returned = 0usize;
            for q in &queries {
                returned += snapshot.search(q, k, &predicate).len();
            }
            let elapsed = t0.elapsed();
            println!(
                "  {label:<10} k={k:<4} | QPS: {:.0} | Avg latency: {:.0} us | Avg hits: {:.1}",
                NUM_QUERIES as f64 / elapsed.as_secs_f64(),
                elapsed.as_micros() as f64 / NUM_QUERIES as f64,
                returned as f64 / NUM_QUERIES as f64
            );
        }
    }

    println!();
    println!("--- Fusion (40 dense x 40 sparse) ---");
    let sparse_lists: Vec<_> = queries
        .iter()
        .take(500)
        .map(|q| snapshot.search(q, 40, &AttributePredicate::default()))
        .collect();
    for strategy in [FusionStrategy::Rrf { k: 60.0 }, FusionStrategy::Weighted { alpha: 0.6 }] {
        let t0 = Instant::now();
        for sparse in &sparse_lists {
            // Reversed sparse list stands in for a dense list with partial overlap.
            let dense: Vec<_> = sparse.iter().rev().map(|(id, s)| (id.clone(), s / 20.0)).collect();
            let _ = fuse(&dense, sparse, strategy);
        }
        let elapsed = t0.elapsed();
        println!(
            "  {:<8} | {:.1} us/request",
            strategy.label(),
            elapsed.as_micros() as f64 / sparse_lists.len() as f64
        );
    }
}
