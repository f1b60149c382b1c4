//! # quarry-llm
//!
//! Provider abstraction for the two model capabilities quarry needs:
//! chat completion and batch text embedding.
//!
//! The [`LlmProvider`] trait is implemented once per supported backend
//! (currently Ollama, plus a deterministic mock for tests). Both the write
//! path (indexing) and the read path (querying) go through the
//! [`EmbeddingAdapter`], which pins every vector to one fixed dimension and
//! absorbs provider failures so callers always get a usable result.
//!
//! ## Failure policy
//!
//! Provider errors never escape this crate's adapter surfaces: a failed
//! embedding call degrades to all-zero vectors, a failed chat call degrades
//! to an apologetic message. Raw errors are reported through `tracing`.

pub mod chat;
pub mod config;
pub mod embedding;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod ollama;
pub mod provider;

pub use chat::generate_response;
pub use config::LlmConfig;
pub use embedding::{DEFAULT_EMBEDDING_DIM, EmbeddingAdapter};
pub use error::{LlmError, Result};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use provider::{LlmProvider, Message, Role, provider_from_config};
