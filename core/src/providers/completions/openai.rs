use crate::completion::{CompletionError, CompletionModel, Message};
use crate::config::{CompletionSettings, ConfigError};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, info, instrument};

/// Chat completions against any OpenAI-compatible server (LM Studio, OpenAI, ...).
pub struct OpenAICompletionModel {
    api_key: Option<String>,
    api_url: String,
    client: reqwest::Client,
    model: String,
}

impl OpenAICompletionModel {
    /// Builds the model from an optional JSON [`CompletionSettings`] object; missing fields use defaults.
    #[instrument]
    pub fn new(json_config: Option<&str>) -> Result<Self, ConfigError> {
        let settings = match json_config {
            Some(json) => serde_json::from_str::<CompletionSettings>(json).map_err(|e| {
                error!(error = %e, "Failed to deserialize json config");
                ConfigError::Parse(e.to_string())
            })?,
            None => CompletionSettings::default(),
        };
        Self::from_settings(&settings)
    }

    pub fn from_settings(settings: &CompletionSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: settings.api_key()?,
            api_url: settings.api_url.clone(),
            client: reqwest::Client::new(),
            model: settings.model.clone(),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn models_url(&self) -> String {
        let base = self
            .api_url
            .trim_end_matches('/')
            .trim_end_matches("/chat/completions");
        format!("{base}/models")
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {key}")),
            None => request,
        }
    }
}

/// Extracts the reply text from a chat completion response body.
fn parse_reply(response_json: &serde_json::Value) -> Result<String, CompletionError> {
    response_json["choices"][0]["message"]["content"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| CompletionError::ParseError("Invalid response body".to_string()))
}

#[async_trait]
impl CompletionModel for OpenAICompletionModel {
    #[instrument(
        skip(self, messages, temperature),
        fields(message_count = messages.len(), model = %self.model)
    )]
    async fn send(
        &self,
        messages: &[Message],
        temperature: f64,
        max_tokens: usize,
    ) -> Result<String, CompletionError> {
        let request_body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
            "stream": false,
        });
        debug!(request_body = ?request_body, "Sending chat completion request");

        let response = self
            .authorize(self.client.post(&self.api_url))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, "Request failed");
                CompletionError::RequestError(e.to_string())
            })?;

        let status = response.status();
        debug!(%status, "Received API response");

        if !status.is_success() {
            let error_msg = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error (failed to read response body)".to_string());
            error!(status = %status, error = %error_msg, "API returned error response");
            return Err(CompletionError::ProviderError(status.as_u16(), error_msg));
        }

        let response_json: serde_json::Value = response.json().await.map_err(|e| {
            error!(error = ?e, "Failed to parse response JSON");
            CompletionError::ParseError(e.to_string())
        })?;
        let reply = parse_reply(&response_json)?;
        info!(reply_len = reply.len(), "Received completion");
        Ok(reply)
    }

    #[instrument(skip(self))]
    async fn available_models(&self) -> Result<Vec<String>, CompletionError> {
        let response = self
            .authorize(self.client.get(self.models_url()))
            .send()
            .await
            .map_err(|e| CompletionError::RequestError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_msg = response.text().await.unwrap_or_default();
            return Err(CompletionError::ProviderError(status.as_u16(), error_msg));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::ParseError(e.to_string()))?;
        Ok(body["data"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["id"].as_str().map(ToString::to_string))
                    .collect()
            })
            .unwrap_or_default())
    }
}
