//! Dimension-pinned, failure-absorbing embedding surface.
//!
//! Storage and search assume every vector has exactly the same length, so
//! the adapter normalizes whatever the provider returns: longer vectors are
//! truncated, shorter ones are zero-padded. Provider failures degrade to
//! all-zero vectors rather than propagating, which keeps indexing runs
//! alive when the embedding backend has a bad moment.

use std::sync::Arc;

use crate::provider::LlmProvider;

/// Dimension vectors are normalized to unless configured otherwise.
pub const DEFAULT_EMBEDDING_DIM: usize = 1024;

/// Wraps a provider and guarantees a vector of `target_dim` floats per
/// input text, for any input and any provider behavior.
#[derive(Clone)]
pub struct EmbeddingAdapter {
    provider: Arc<dyn LlmProvider>,
    target_dim: usize,
}

impl EmbeddingAdapter {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_dimension(provider, DEFAULT_EMBEDDING_DIM)
    }

    pub fn with_dimension(provider: Arc<dyn LlmProvider>, target_dim: usize) -> Self {
        Self { provider, target_dim }
    }

    pub fn dimension(&self) -> usize {
        self.target_dim
    }

    /// Embed a batch of texts. Always returns exactly `texts.len()` vectors
    /// of exactly [`dimension`](Self::dimension) floats each.
    ///
    /// An empty batch returns immediately without touching the provider.
    /// A provider error, or a response with the wrong number of vectors,
    /// is logged and replaced with all-zero vectors.
    pub async fn embed(&self, texts: &[String]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }
        match self.provider.embed_documents(texts).await {
            Ok(vectors) if vectors.len() == texts.len() => vectors
                .into_iter()
                .map(|v| normalize_dimension(v, self.target_dim))
                .collect(),
            Ok(vectors) => {
                tracing::error!(
                    provider = self.provider.name(),
                    expected = texts.len(),
                    got = vectors.len(),
                    "embedding count mismatch, substituting zero vectors"
                );
                self.zero_batch(texts.len())
            }
            Err(e) => {
                tracing::error!(
                    provider = self.provider.name(),
                    error = %e,
                    "embedding request failed, substituting zero vectors"
                );
                self.zero_batch(texts.len())
            }
        }
    }

    fn zero_batch(&self, count: usize) -> Vec<Vec<f32>> {
        vec![vec![0.0; self.target_dim]; count]
    }
}

impl std::fmt::Debug for EmbeddingAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingAdapter")
            .field("provider", &self.provider.name())
            .field("target_dim", &self.target_dim)
            .finish()
    }
}

/// Truncate or zero-pad `vector` to exactly `dim` entries.
fn normalize_dimension(mut vector: Vec<f32>, dim: usize) -> Vec<f32> {
    vector.resize(dim, 0.0);
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;

    #[tokio::test]
    async fn pads_short_vectors_to_target_dimension() {
        let provider = Arc::new(MockProvider::new(4).with_fixed_embedding(vec![1.0, 2.0]));
        let adapter = EmbeddingAdapter::with_dimension(provider, 4);
        let out = adapter.embed(&["x".into()]).await;
        assert_eq!(out, vec![vec![1.0, 2.0, 0.0, 0.0]]);
    }

    #[tokio::test]
    async fn truncates_long_vectors_to_target_dimension() {
        let provider =
            Arc::new(MockProvider::new(4).with_fixed_embedding(vec![1.0, 2.0, 3.0, 4.0, 5.0]));
        let adapter = EmbeddingAdapter::with_dimension(provider, 3);
        let out = adapter.embed(&["x".into()]).await;
        assert_eq!(out, vec![vec![1.0, 2.0, 3.0]]);
    }

    #[tokio::test]
    async fn empty_batch_skips_the_provider() {
        let provider = Arc::new(MockProvider::new(4));
        let adapter = EmbeddingAdapter::with_dimension(provider.clone(), 4);
        let out = adapter.embed(&[]).await;
        assert!(out.is_empty());
        assert_eq!(provider.embed_calls(), 0);
    }

    #[tokio::test]
    async fn provider_failure_yields_zero_vectors() {
        let provider = Arc::new(MockProvider::new(4).failing_embeddings());
        let adapter = EmbeddingAdapter::with_dimension(provider, 4);
        let out = adapter.embed(&["a".into(), "b".into()]).await;
        assert_eq!(out, vec![vec![0.0; 4], vec![0.0; 4]]);
    }
}
