//! Runtime configuration.
//!
//! A [`RagConfig`] is read from JSON (every field optional) and can be
//! overridden from the environment:
//!
//! - `JARVIS_CONFIG` - path to a JSON config file
//! - `JARVIS_LLM_URL` / `JARVIS_LLM_MODEL` - chat completion endpoint and model
//! - `JARVIS_EMBEDDING_PROVIDER` - `model2vec` (default) or `openai`
//! - `JARVIS_EMBEDDING_MODEL` / `JARVIS_EMBEDDING_URL`

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::completion::{DEFAULT_HISTORY_WINDOW, DEFAULT_MAX_TOKENS, DEFAULT_PREAMBLE, DEFAULT_TEMPERATURE};
use crate::embeddings::{model::ModelLoader, Embedder};
use crate::knowledge::KnowledgeBase;
use crate::providers::embeddings::{Model2Vec, OpenAIEmbedding};
use crate::vector_store::{DocumentStore, DEFAULT_THRESHOLD, DEFAULT_TOP_K};

const DEFAULT_LLM_URL: &str = "http://127.0.0.1:1234/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "llama-2-7b-chat";
const DEFAULT_EMBEDDING_URL: &str = "http://127.0.0.1:1234/v1/embeddings";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Failed to fetch env var `{0}`")]
    MissingEnvVar(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    #[default]
    Model2vec,
    Openai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProviderKind,
    pub model: String,
    /// Only used by the `openai` provider.
    pub api_url: String,
    /// Name of the env var holding the API key, if the endpoint needs one.
    pub api_key_env: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Model2vec,
            model: crate::providers::embeddings::model2vec::DEFAULT_MODEL.to_string(),
            api_url: DEFAULT_EMBEDDING_URL.to_string(),
            api_key_env: None,
        }
    }
}

impl EmbeddingSettings {
    pub fn api_key(&self) -> Result<Option<String>, ConfigError> {
        resolve_api_key(self.api_key_env.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompletionSettings {
    pub api_url: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: usize,
    pub api_key_env: Option<String>,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_LLM_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key_env: None,
        }
    }
}

impl CompletionSettings {
    pub fn api_key(&self) -> Result<Option<String>, ConfigError> {
        resolve_api_key(self.api_key_env.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub threshold: f32,
    pub history_window: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RagConfig {
    pub embedding: EmbeddingSettings,
    pub completion: CompletionSettings,
    pub retrieval: RetrievalSettings,
    pub preamble: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            embedding: EmbeddingSettings::default(),
            completion: CompletionSettings::default(),
            retrieval: RetrievalSettings::default(),
            preamble: DEFAULT_PREAMBLE.to_string(),
        }
    }
}

impl RagConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the `JARVIS_CONFIG` file if set, then individual env overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = match std::env::var("JARVIS_CONFIG") {
            Ok(path) if !path.is_empty() => Self::from_json(&std::fs::read_to_string(path)?)?,
            _ => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn with_env_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = var("JARVIS_LLM_URL") {
            self.completion.api_url = url;
        }
        if let Some(model) = var("JARVIS_LLM_MODEL") {
            self.completion.model = model;
        }
        if let Some(provider) = var("JARVIS_EMBEDDING_PROVIDER") {
            self.embedding.provider = serde_json::from_value(serde_json::Value::String(provider.to_lowercase()))
                .map_err(|_| ConfigError::Invalid(format!("unknown embedding provider `{provider}`")))?;
        }
        if let Some(model) = var("JARVIS_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(url) = var("JARVIS_EMBEDDING_URL") {
            self.embedding.api_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be at least 1".into()));
        }
        if !(-1.0..=1.0).contains(&self.retrieval.threshold) {
            return Err(ConfigError::Invalid("retrieval.threshold must be within [-1, 1]".into()));
        }
        if self.completion.max_tokens == 0 {
            return Err(ConfigError::Invalid("completion.max_tokens must be positive".into()));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(ConfigError::Invalid("embedding.model is required".into()));
        }
        Ok(())
    }

    /// Loader for the configured embedding backend. Nothing is loaded until first use.
    pub fn embedding_loader(&self) -> Result<Arc<dyn ModelLoader>, ConfigError> {
        Ok(match self.embedding.provider {
            EmbeddingProviderKind::Model2vec => Arc::new(Model2Vec::new(self.embedding.model.clone())),
            EmbeddingProviderKind::Openai => Arc::new(OpenAIEmbedding::from_settings(&self.embedding)?),
        })
    }

    /// A fresh, empty knowledge base using the configured embedding backend.
    pub fn knowledge_base(&self) -> Result<KnowledgeBase, ConfigError> {
        let embedder = Arc::new(Embedder::from_loader(self.embedding_loader()?));
        Ok(KnowledgeBase::new(Arc::new(DocumentStore::new(embedder))).with_threshold(self.retrieval.threshold))
    }
}

fn resolve_api_key(var: Option<&str>) -> Result<Option<String>, ConfigError> {
    match var {
        Some(var) => std::env::var(var)
            .map(Some)
            .map_err(|_| ConfigError::MissingEnvVar(var.to_string())),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_the_local_setup() {
        let config = RagConfig::default();
        assert_eq!(config.completion.api_url, "http://127.0.0.1:1234/v1/chat/completions");
        assert_eq!(config.completion.model, "llama-2-7b-chat");
        assert_eq!(config.completion.temperature, 0.7);
        assert_eq!(config.completion.max_tokens, 2000);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.threshold, 0.3);
        assert_eq!(config.retrieval.history_window, 5);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Model2vec);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RagConfig::from_json(
            r#"{"retrieval": {"top_k": 5}, "embedding": {"provider": "openai", "model": "nomic-embed"}}"#,
        )
        .unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.threshold, 0.3);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Openai);
        assert_eq!(config.embedding.api_url, DEFAULT_EMBEDDING_URL);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result = RagConfig::from_json(r#"{"retrieval": {"topK": 5}}"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            RagConfig::from_json(r#"{"retrieval": {"top_k": 0}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RagConfig::from_json(r#"{"retrieval": {"threshold": 1.5}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            RagConfig::from_json(r#"{"completion": {"max_tokens": 0}}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn env_overrides_take_precedence() {
        let env = HashMap::from([
            ("JARVIS_LLM_URL", "http://gpu-box:1234/v1/chat/completions"),
            ("JARVIS_LLM_MODEL", ""),
            ("JARVIS_EMBEDDING_PROVIDER", "OpenAI"),
            ("JARVIS_EMBEDDING_MODEL", "nomic-embed-text"),
        ]);
        let config = RagConfig::default()
            .with_env_overrides(|k| env.get(k).map(ToString::to_string))
            .unwrap();

        assert_eq!(config.completion.api_url, "http://gpu-box:1234/v1/chat/completions");
        assert_eq!(config.completion.model, DEFAULT_LLM_MODEL);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Openai);
        assert_eq!(config.embedding.model, "nomic-embed-text");
    }

    #[test]
    fn unknown_provider_override_is_invalid() {
        let result = RagConfig::default()
            .with_env_overrides(|k| (k == "JARVIS_EMBEDDING_PROVIDER").then(|| "bert".to_string()));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn missing_api_key_env_is_reported() {
        let settings = CompletionSettings {
            api_key_env: Some("JARVIS_TEST_KEY_THAT_IS_NEVER_SET".into()),
            ..CompletionSettings::default()
        };
        assert!(matches!(settings.api_key(), Err(ConfigError::MissingEnvVar(_))));
        assert_eq!(CompletionSettings::default().api_key().unwrap(), None);
    }

    #[tokio::test]
    async fn knowledge_base_is_built_lazily() {
        let config = RagConfig::from_json(r#"{"embedding": {"provider": "openai", "model": "nomic"}}"#).unwrap();
        let kb = config.knowledge_base().unwrap();
        assert_eq!(kb.store().embedder().model_name(), "nomic");
        assert!(!kb.store().embedder().is_loaded());
        assert_eq!(kb.get_stats().await.total_documents, 0);
    }
}
