use crate::embeddings::EmbedderError;
use async_trait::async_trait;
use std::sync::Arc;

/// A loaded embedding model.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Pooled vector for `data`. Normalization is left to the [`Embedder`](super::Embedder).
    async fn embed(&self, data: &str) -> Result<Vec<f32>, EmbedderError>;
}

/// Performs the one-time, side-effecting load of an [`EmbeddingModel`].
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Name reported in logs.
    fn model_name(&self) -> &str;

    async fn load(&self) -> Result<Arc<dyn EmbeddingModel>, EmbedderError>;
}
