use crate::config::{ConfigError, EmbeddingSettings};
use crate::embeddings::{
    model::{EmbeddingModel, ModelLoader},
    EmbedderError,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, instrument};

/// Embeddings from an OpenAI-compatible `/v1/embeddings` endpoint.
///
/// Pooling happens server side; the returned vectors are normalized by the
/// [`Embedder`](crate::embeddings::Embedder).
#[derive(Clone)]
pub struct OpenAIEmbeddingModel {
    api_url: String,
    api_key: Option<String>,
    client: Client,
    model: String,
}

impl OpenAIEmbeddingModel {
    pub fn new(api_key: Option<String>, api_url: String, model: String) -> Self {
        Self {
            api_url,
            api_key,
            client: Client::new(),
            model,
        }
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self, ConfigError> {
        Ok(Self::new(
            settings.api_key()?,
            settings.api_url.clone(),
            settings.model.clone(),
        ))
    }
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    pub data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    pub embedding: Vec<f32>,
}

#[async_trait]
impl ModelLoader for OpenAIEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn load(&self) -> Result<Arc<dyn EmbeddingModel>, EmbedderError> {
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl EmbeddingModel for OpenAIEmbeddingModel {
    #[instrument(skip(self, data), fields(model = %self.model))]
    async fn embed(&self, data: &str) -> Result<Vec<f32>, EmbedderError> {
        let request_body = json!({
                "input": data,
                "model": self.model,
        });
        let mut request = self
            .client
            .post(&self.api_url)
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let response = request
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EmbedderError::ModelUnavailable(format!("embedding request failed: {e}")))?;

        if response.status().is_success() {
            let response = response
                .json::<OpenAIEmbeddingResponse>()
                .await
                .map_err(|e| EmbedderError::ModelUnavailable(format!("invalid embedding response: {e}")))?;

            response
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .ok_or_else(|| EmbedderError::ModelUnavailable("no embedding returned".into()))
        } else {
            let status = response.status();
            let error_message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(%status, error = %error_message, "Embedding endpoint returned error");
            Err(EmbedderError::ModelUnavailable(format!(
                "embedding endpoint returned {status}: {error_message}"
            )))
        }
    }
}
