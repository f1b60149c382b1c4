//! # quarry-retriever
//!
//! Persistence and retrieval for embedded code chunks: a SQLite-backed
//! [`VectorStore`], the [`Indexer`] that walks project trees and keeps the
//! store current, and the [`Retriever`] that answers nearest-neighbor
//! queries over it.
//!
//! The write path is `walk -> chunk -> embed -> replace`; the read path is
//! `embed query -> brute-force L2 scan -> dedupe files`. Both share the
//! same embedding adapter so index-time and query-time vectors always live
//! in the same space.

pub mod indexer;
pub mod retriever;
pub mod store;

pub use indexer::{
    DEFAULT_EXCLUDE_PATTERNS, DEFAULT_FILE_EXTENSIONS, IndexReport, IndexStatus, Indexer,
    ProjectState, owned_defaults,
};
pub use retriever::{FileMatch, RetrievedChunk, Retriever};
pub use store::{ChunkRecord, Project, SearchHit, StoredChunk, VectorStore};
