//! # quarry-server
//!
//! HTTP surface over the indexing and retrieval pipeline. Three routes do
//! the work (`/index_codebase`, `/index_status/{project_name}`, `/chat`)
//! plus a health probe; indexing runs on a background task so the trigger
//! endpoint answers immediately.

pub mod handlers;
pub mod router;
pub mod state;

pub use router::build_router;
pub use state::AppState;
