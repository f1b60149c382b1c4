//! Provider abstraction for chat and embedding backends.
//!
//! A [`LlmProvider`] bundles both capabilities behind one trait so the
//! rest of the system can hold a single handle for everything that talks
//! to a model, mirroring how deployments pair a chat model with an
//! embedding model from the same host.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::error::Result;
use crate::ollama::OllamaProvider;

/// Who authored a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A backend capable of chat completion and text embedding.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for the given conversation.
    async fn chat(&self, messages: &[Message]) -> Result<String>;

    /// Embed a batch of documents, one vector per input, in order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Short identifier for logs.
    fn name(&self) -> &'static str;
}

/// Construct the provider named in `config`.
///
/// Unrecognized provider names fall back to Ollama with a warning so a
/// typo in configuration degrades rather than aborts startup.
pub fn provider_from_config(config: &LlmConfig) -> Arc<dyn LlmProvider> {
    match config.provider.as_str() {
        "ollama" => {}
        other => {
            tracing::warn!(provider = other, "unknown provider, falling back to ollama");
        }
    }
    Arc::new(OllamaProvider::new(
        &config.base_url,
        config.chat_model.clone(),
        config.embedding_model.clone(),
    ))
}
