//! BM25 full-text search: inverted index, Okapi BM25 scoring, and tokenizer.

pub mod inverted_index;
pub mod scorer;
pub mod tokenizer;

pub use inverted_index::{InvertedIndex, Posting};
pub use scorer::{bm25_search, bm25_search_filtered};
pub use tokenizer::tokenize;
