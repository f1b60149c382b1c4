//! Provider configuration.

use serde::{Deserialize, Serialize};

/// Settings for constructing a provider and its embedding adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend name. Currently only `"ollama"` is recognized.
    pub provider: String,
    /// Base URL of the backend, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Model used for chat completion.
    pub chat_model: String,
    /// Model used for embeddings.
    pub embedding_model: String,
    /// Fixed dimension every stored vector is normalized to.
    pub embedding_dim: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".into(),
            base_url: "http://localhost:11434".into(),
            chat_model: "qwen2.5-coder".into(),
            embedding_model: "nomic-embed-text".into(),
            embedding_dim: crate::embedding::DEFAULT_EMBEDDING_DIM,
        }
    }
}
