//! # quarry-chunk
//!
//! Deterministic, token-bounded chunking of source files for retrieval.
//!
//! A file is split into overlapping line ranges whose token counts stay near
//! a configurable target. The same tokenizer vocabulary (cl100k_base) is used
//! when indexing and when querying, so chunk boundaries are stable across
//! runs and across both paths.
//!
//! ```
//! use quarry_chunk::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new().unwrap();
//! let chunks = chunker.chunk("fn main() {\n    println!(\"hello\");\n}");
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].start_line, 1);
//! assert_eq!(chunks[0].end_line, 3);
//! ```

pub mod chunker;
pub mod language;

pub use chunker::{Chunk, Chunker, ChunkerConfig};
pub use language::language_for_path;
