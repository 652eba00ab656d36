pub mod embedding;
pub mod model;

use embedding::Embedding;
use model::{EmbeddingModel, ModelLoader};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmbedderError {
    /// The model failed to load or failed during inference.
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Embedding dimension mismatch, expected {expected} got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Turns text into unit-length [`Embedding`]s using a lazily loaded model.
///
/// The model is loaded on the first call to [`Embedder::embed`] (or eagerly
/// with [`Embedder::preload`]). Concurrent first callers wait on the same load,
/// and a failed load leaves the embedder empty so a later call can retry.
pub struct Embedder {
    loader: Arc<dyn ModelLoader>,
    model: Mutex<Option<Arc<dyn EmbeddingModel>>>,
    // mirrors `model.is_some()` without waiting on an in-flight load
    loaded: AtomicBool,
    // 0 until the first vector is produced
    dimension: AtomicUsize,
}

impl Embedder {
    pub fn new(loader: impl ModelLoader + 'static) -> Self {
        Self::from_loader(Arc::new(loader))
    }

    pub fn from_loader(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            model: Mutex::new(None),
            loaded: AtomicBool::new(false),
            dimension: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn model_name(&self) -> &str {
        self.loader.model_name()
    }

    /// Load the model now instead of on first use.
    pub async fn preload(&self) -> Result<(), EmbedderError> {
        self.acquire().await.map(|_| ())
    }

    /// Whether a model is currently held. Never waits on a load in progress.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Dimension of the vectors produced by the current model, once known.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        match self.dimension.load(Ordering::Acquire) {
            0 => None,
            d => Some(d),
        }
    }

    /// Drop the loaded model; the next call loads it again.
    ///
    /// Embeddings stored with a previous model are not migrated.
    pub async fn reset(&self) {
        let mut slot = self.model.lock().await;
        *slot = None;
        self.loaded.store(false, Ordering::Release);
        self.dimension.store(0, Ordering::Release);
        info!(model = self.loader.model_name(), "Embedding model unloaded");
    }

    #[instrument(skip(self, text), fields(model = self.loader.model_name(), text_len = text.len()))]
    pub async fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        let model = self.acquire().await?;
        let raw = model.embed(text).await.map_err(|e| {
            error!(error = %e, "Embedding inference failed");
            e
        })?;

        let embedding = Embedding::from(raw).normalized().ok_or_else(|| {
            error!("Model returned a degenerate vector");
            EmbedderError::ModelUnavailable("model returned an empty or degenerate vector".into())
        })?;

        let actual = embedding.dimension();
        match self
            .dimension
            .compare_exchange(0, actual, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => debug!(dimension = actual, "Embedding dimension fixed"),
            Err(expected) if expected != actual => {
                return Err(EmbedderError::DimensionMismatch { expected, actual });
            }
            Err(_) => {}
        }
        Ok(embedding)
    }

    async fn acquire(&self) -> Result<Arc<dyn EmbeddingModel>, EmbedderError> {
        // Held across the load so concurrent first callers await the same one.
        let mut slot = self.model.lock().await;
        if let Some(model) = slot.as_ref() {
            return Ok(Arc::clone(model));
        }

        info!(model = self.loader.model_name(), "Loading embedding model");
        match self.loader.load().await {
            Ok(model) => {
                info!(model = self.loader.model_name(), "Embedding model loaded");
                *slot = Some(Arc::clone(&model));
                self.loaded.store(true, Ordering::Release);
                Ok(model)
            }
            Err(e) => {
                error!(model = self.loader.model_name(), error = %e, "Failed to load embedding model");
                Err(e)
            }
        }
    }
}
