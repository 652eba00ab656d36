//! Local static embeddings with Model2Vec.
//!
//! A Model2Vec model is a table of pre-computed token vectors; a sentence
//! embedding is the mean of its token vectors, so no neural inference runs at
//! query time.

use async_trait::async_trait;
use model2vec_rs::model::StaticModel;
use std::sync::Arc;
use tracing::debug;

use crate::embeddings::{
    model::{EmbeddingModel, ModelLoader},
    EmbedderError,
};

pub const DEFAULT_MODEL: &str = "minishlab/potion-base-8M";

/// Loads a Model2Vec model from the HuggingFace Hub or a local directory.
pub struct Model2VecLoader {
    model_name: String,
}

impl Model2VecLoader {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
        }
    }
}

impl Default for Model2VecLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL)
    }
}

#[async_trait]
impl ModelLoader for Model2VecLoader {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn load(&self) -> Result<Arc<dyn EmbeddingModel>, EmbedderError> {
        let name = self.model_name.clone();
        // downloads and parses the weights, keep it off the runtime threads
        let model = tokio::task::spawn_blocking(move || {
            StaticModel::from_pretrained(&name, None, Some(true), None)
        })
        .await
        .map_err(|e| EmbedderError::ModelUnavailable(format!("model load task failed: {e}")))?
        .map_err(|e| {
            EmbedderError::ModelUnavailable(format!(
                "failed to load Model2Vec model '{}': {e}",
                self.model_name
            ))
        })?;

        Ok(Arc::new(Model2VecModel {
            model: Arc::new(model),
        }))
    }
}

struct Model2VecModel {
    model: Arc<StaticModel>,
}

#[async_trait]
impl EmbeddingModel for Model2VecModel {
    async fn embed(&self, data: &str) -> Result<Vec<f32>, EmbedderError> {
        let model = Arc::clone(&self.model);
        let sentences = vec![data.to_string()];
        let embeddings = tokio::task::spawn_blocking(move || model.encode(&sentences))
            .await
            .map_err(|e| EmbedderError::ModelUnavailable(format!("inference task failed: {e}")))?;

        debug!(count = embeddings.len(), "Model2Vec encoded text");
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedderError::ModelUnavailable("Model2Vec returned no embeddings".into()))
    }
}
