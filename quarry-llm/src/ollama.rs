//! Ollama-backed provider.

use async_trait::async_trait;
use ollama_rs::Ollama;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, Message, Role};

const DEFAULT_PORT: u16 = 11434;

/// [`LlmProvider`] backed by a local or remote Ollama server.
pub struct OllamaProvider {
    client: Ollama,
    chat_model: String,
    embedding_model: String,
}

impl OllamaProvider {
    pub fn new(base_url: &str, chat_model: String, embedding_model: String) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            chat_model,
            embedding_model,
        }
    }
}

impl std::fmt::Debug for OllamaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaProvider")
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .finish_non_exhaustive()
    }
}

/// Split a base URL into the (host, port) pair `Ollama::new` wants.
/// A missing or unparseable port defaults to 11434.
fn parse_host_port(base_url: &str) -> (String, u16) {
    let url = base_url.trim_end_matches('/');
    if let Some(colon_pos) = url.rfind(':') {
        let port_str = &url[colon_pos + 1..];
        if let Ok(port) = port_str.parse::<u16>() {
            return (url[..colon_pos].to_string(), port);
        }
    }
    (url.to_string(), DEFAULT_PORT)
}

fn to_chat_message(message: &Message) -> ChatMessage {
    let text = message.content.clone();
    match message.role {
        Role::System => ChatMessage::system(text),
        Role::User => ChatMessage::user(text),
        Role::Assistant => ChatMessage::assistant(text),
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String> {
        let request = ChatMessageRequest::new(
            self.chat_model.clone(),
            messages.iter().map(to_chat_message).collect(),
        );
        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| LlmError::Chat(e.to_string()))?;
        let content = response.message.content;
        if content.is_empty() {
            return Err(LlmError::EmptyResponse { provider: self.name() });
        }
        Ok(content)
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = GenerateEmbeddingsRequest::new(
            self.embedding_model.clone(),
            EmbeddingsInput::Multiple(texts.to_vec()),
        );
        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| LlmError::Embedding(e.to_string()))?;
        Ok(response.embeddings)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_url_with_port() {
        assert_eq!(
            parse_host_port("http://localhost:11434"),
            ("http://localhost".to_string(), 11434)
        );
    }

    #[test]
    fn defaults_port_when_missing() {
        assert_eq!(
            parse_host_port("http://ollama.internal/"),
            ("http://ollama.internal".to_string(), 11434)
        );
    }
}
