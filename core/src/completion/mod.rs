use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::RagConfig;
use crate::document::ScoredDocument;
use crate::knowledge::KnowledgeBase;
use crate::providers::completions::OpenAI;
use crate::vector_store::DEFAULT_TOP_K;

pub const DEFAULT_PREAMBLE: &str =
    "You are JARVIS, a helpful and intelligent AI assistant. Provide clear, concise, and helpful responses.";

const CONTEXT_INSTRUCTIONS: &str = "\n\nIMPORTANT: Use the following information from the knowledge base to answer the user's question. If the information is relevant, reference it in your answer. If it's not relevant, you can provide a general response.";

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: usize = 2000;
/// Prior turns kept when building a request.
pub const DEFAULT_HISTORY_WINDOW: usize = 5;

/// A chat message, serialized the way OpenAI-compatible servers expect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    System(String),
    User(String),
    Assistant(String),
}

impl Message {
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::System(s) | Self::User(s) | Self::Assistant(s) => s,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Provider error -> HTTP Status {0}: {1}")]
    ProviderError(u16, String),
    #[error("RequestError: {0}")]
    RequestError(String),
    #[error("ParseError: {0}")]
    ParseError(String),
}

/// The chat-completion service.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Send the full message list and return the assistant's reply.
    async fn send(
        &self,
        messages: &[Message],
        temperature: f64,
        max_tokens: usize,
    ) -> Result<String, CompletionError>;

    /// Models served by the backend, used as a connectivity probe.
    async fn available_models(&self) -> Result<Vec<String>, CompletionError> {
        Ok(Vec::new())
    }
}

/// Renders ranked documents as a labeled context block; empty when there are none.
#[must_use]
pub fn format_context(documents: &[ScoredDocument]) -> String {
    if documents.is_empty() {
        return String::new();
    }
    let mut context = String::from("\n\nRelevant information from knowledge base:\n");
    for (idx, doc) in documents.iter().enumerate() {
        context.push_str(&format!("\n[Document {}: {}]\n{}\n", idx + 1, doc.title, doc.content));
    }
    context
}

/// Result of [`Client::health`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub llm_connected: bool,
    pub models: Vec<String>,
    pub llm_error: Option<String>,
    pub embedding_model_loaded: bool,
    pub total_documents: usize,
}

/// Retrieval-augmented chat client.
pub struct Client<M: CompletionModel> {
    completion_model: M,
    knowledge: KnowledgeBase,
    preamble: String,

    // common prompt parameters
    temperature: f64,
    max_tokens: usize,
    top_k: usize,
    history_window: usize,
}

impl Client<OpenAI> {
    /// Client talking to the OpenAI-compatible server described by `config`.
    pub fn from_config(config: &RagConfig) -> Result<Self, crate::error::Error> {
        let model = OpenAI::from_settings(&config.completion)?;
        let knowledge = config.knowledge_base()?;
        Ok(Self::new(model, knowledge, &config.preamble)
            .with_temperature(config.completion.temperature)
            .with_max_tokens(config.completion.max_tokens)
            .with_top_k(config.retrieval.top_k)
            .with_history_window(config.retrieval.history_window))
    }
}

impl<M: CompletionModel> Client<M> {
    pub fn new(completion_model: M, knowledge: KnowledgeBase, preamble: impl AsRef<str>) -> Self {
        Self {
            completion_model,
            knowledge,
            preamble: String::from(preamble.as_ref()),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_k: DEFAULT_TOP_K,
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_history_window(mut self, history_window: usize) -> Self {
        self.history_window = history_window;
        self
    }

    #[must_use]
    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    /// Context block for `query`. Empty when nothing relevant was found or retrieval failed.
    pub async fn build_context(&self, query: &str) -> String {
        if query.trim().is_empty() {
            return String::new();
        }
        let documents = self.knowledge.retrieve(query, self.top_k).await;
        if documents.is_empty() {
            info!("No relevant documents found");
        }
        format_context(&documents)
    }

    /// Message list sent downstream: system prompt, the most recent history, then `message`.
    #[must_use]
    pub fn build_messages(&self, message: &str, history: &[Message], context: &str) -> Vec<Message> {
        let mut system = self.preamble.clone();
        if !context.is_empty() {
            system.push_str(CONTEXT_INSTRUCTIONS);
            system.push_str(context);
        }

        let recent = &history[history.len().saturating_sub(self.history_window)..];
        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(Message::System(system));
        messages.extend_from_slice(recent);
        messages.push(Message::User(message.to_string()));
        messages
    }

    /// Creates a `PromptBuilder` for `message`.
    pub fn prompt(&self, message: impl Into<String>) -> PromptBuilder<'_, M> {
        PromptBuilder::new(self, message)
    }

    /// Probes the completion backend and reports the index state.
    pub async fn health(&self) -> HealthReport {
        let (llm_connected, models, llm_error) = match self.completion_model.available_models().await {
            Ok(models) => (true, models, None),
            Err(e) => {
                warn!(error = %e, "Cannot connect to completion backend");
                (false, Vec::new(), Some(e.to_string()))
            }
        };
        HealthReport {
            llm_connected,
            models,
            llm_error,
            embedding_model_loaded: self.knowledge.store().embedder().is_loaded(),
            total_documents: self.knowledge.store().len().await,
        }
    }
}

pub struct PromptBuilder<'a, M: CompletionModel> {
    prompt: String,
    client: &'a Client<M>,
    history: Vec<Message>,
    with_context: bool,
}

impl<'a, M: CompletionModel> PromptBuilder<'a, M> {
    fn new(client: &'a Client<M>, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            client,
            history: Vec::new(),
            with_context: true,
        }
    }

    /// Prior conversation turns, oldest first. Only the most recent ones are sent.
    #[must_use]
    pub fn history(mut self, history: impl Into<Vec<Message>>) -> Self {
        self.history = history.into();
        self
    }

    /// Whether to retrieve and append the context to the prompt, `true` by default.
    #[must_use]
    pub fn with_context(mut self, append_context: bool) -> Self {
        self.with_context = append_context;
        self
    }

    /// Sends the prompt to the LLM and returns its reply.
    pub async fn send(self) -> Result<String, crate::error::Error> {
        crate::error::require("message", &self.prompt)?;

        let context = if self.with_context {
            self.client.build_context(&self.prompt).await
        } else {
            String::new()
        };
        let messages = self.client.build_messages(&self.prompt, &self.history, &context);
        info!(
            message_count = messages.len(),
            has_context = !context.is_empty(),
            "Sending to completion model"
        );

        self.client
            .completion_model
            .send(&messages, self.client.temperature, self.client.max_tokens)
            .await
            .map_err(crate::error::Error::from)
    }
}
