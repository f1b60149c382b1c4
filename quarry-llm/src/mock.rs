//! Deterministic in-memory provider for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fnv::FnvHasher;
use std::hash::{Hash, Hasher};

use crate::error::{LlmError, Result};
use crate::provider::{LlmProvider, Message};

/// Test double for [`LlmProvider`].
///
/// Embeddings are derived from an FNV hash of the input text, so equal
/// texts always embed to equal vectors and distinct texts almost never
/// collide. Failure modes are opt-in via the `fail_*` flags.
pub struct MockProvider {
    dimension: usize,
    default_response: String,
    fixed_embedding: Option<Vec<f32>>,
    fail_chat: bool,
    fail_embeddings: bool,
    chat_calls: AtomicUsize,
    embed_calls: AtomicUsize,
    last_messages: Mutex<Vec<Message>>,
}

impl MockProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            default_response: "mock response".into(),
            fixed_embedding: None,
            fail_chat: false,
            fail_embeddings: false,
            chat_calls: AtomicUsize::new(0),
            embed_calls: AtomicUsize::new(0),
            last_messages: Mutex::new(Vec::new()),
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Return this exact vector for every input, whatever its length.
    pub fn with_fixed_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.fixed_embedding = Some(embedding);
        self
    }

    pub fn failing_chat(mut self) -> Self {
        self.fail_chat = true;
        self
    }

    pub fn failing_embeddings(mut self) -> Self {
        self.fail_embeddings = true;
        self
    }

    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// The messages passed to the most recent `chat` call.
    pub fn last_messages(&self) -> Vec<Message> {
        self.last_messages.lock().unwrap().clone()
    }

    fn embedding_for(&self, text: &str) -> Vec<f32> {
        if let Some(fixed) = &self.fixed_embedding {
            return fixed.clone();
        }
        let mut hasher = FnvHasher::default();
        text.hash(&mut hasher);
        let seed = hasher.finish();
        (0..self.dimension)
            .map(|i| {
                let v = seed.wrapping_add(i as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
                (v >> 40) as f32 / (1u64 << 24) as f32
            })
            .collect()
    }
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("dimension", &self.dimension)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock().unwrap() = messages.to_vec();
        if self.fail_chat {
            return Err(LlmError::Chat("mock chat failure".into()));
        }
        Ok(self.default_response.clone())
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embeddings {
            return Err(LlmError::Embedding("mock embedding failure".into()));
        }
        Ok(texts.iter().map(|t| self.embedding_for(t)).collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
