//! Full-text search over a file tree.
//!
//! Documents are indexed line by line into a character [`trie::Trie`] which
//! is persisted in level order. Boolean queries (`AND`, `OR`, parentheses)
//! reload only the trie paths their words can follow, and the matching
//! documents are ranked with BM25.

pub mod analysis;
pub mod base;
pub mod builder;
pub mod error;
pub mod index;
pub mod query;
pub mod search;
pub mod trie;

pub use builder::{Indexer, IndexerOptions};
pub use error::{Error, Result};
pub use index::{IndexReader, WordIndex};
pub use search::bm25::Bm25Parameters;
pub use search::{SearchHit, SearchOutcome, Searcher};
pub use trie::{LevelFilter, Trie};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
