//! Error types for provider calls.

/// Result type for provider operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors surfaced by an [`LlmProvider`](crate::LlmProvider) backend.
///
/// These are caught at the adapter boundary and converted into degraded
/// results; they only propagate to callers that explicitly talk to a
/// provider directly.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("chat request failed: {0}")]
    Chat(String),

    #[error("embedding request failed: {0}")]
    Embedding(String),

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("{0}")]
    Other(String),
}
