//! Shared handler state.

use std::sync::Arc;

use quarry_llm::LlmProvider;
use quarry_retriever::{Indexer, Retriever};

/// Everything the handlers need, cloned per request by axum.
#[derive(Clone)]
pub struct AppState {
    pub indexer: Indexer,
    pub retriever: Retriever,
    pub provider: Arc<dyn LlmProvider>,
}
