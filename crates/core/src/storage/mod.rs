//! Storage layer: the immutable lexical snapshot and its disk persistence.
//!
//! A `LexicalSnapshot` is built once from a corpus and replaced wholesale on
//! rebuild. Snapshots are persisted as bincode with a CRC32 footer
//! (atomic temp-file + rename).

/// Disk persistence: snapshot save/load with atomic writes.
pub mod persistence;
/// BM25 index, id mapping and document cache.
pub mod snapshot;

pub use persistence::{load_snapshot, save_snapshot};
pub use snapshot::LexicalSnapshot;
