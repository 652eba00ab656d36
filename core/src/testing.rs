//! Deterministic fakes shared by the unit tests.

use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use crate::completion::{CompletionError, CompletionModel, Message};
use crate::embeddings::{
    model::{EmbeddingModel, ModelLoader},
    EmbedderError,
};

/// Vocabulary of [`KeywordModel`]; one axis per word plus a shared "other" axis.
pub const KEYWORDS: [&str; 6] = ["rust", "python", "cooking", "music", "tokio", "pasta"];

/// Counts keyword occurrences, so texts sharing keywords score high.
pub struct KeywordModel {
    zero: bool,
}

#[async_trait]
impl EmbeddingModel for KeywordModel {
    async fn embed(&self, data: &str) -> Result<Vec<f32>, EmbedderError> {
        if self.zero {
            return Ok(vec![0.0; KEYWORDS.len() + 1]);
        }
        let mut v = vec![0.0; KEYWORDS.len() + 1];
        for token in data
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            match KEYWORDS.iter().position(|k| *k == token) {
                Some(i) => v[i] += 1.0,
                None => v[KEYWORDS.len()] += 0.05,
            }
        }
        if v.iter().all(|x| *x == 0.0) {
            v[KEYWORDS.len()] = 1.0;
        }
        Ok(v)
    }
}

pub struct KeywordLoader {
    loads: Arc<AtomicUsize>,
    offline: Arc<AtomicBool>,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
    zero: bool,
}

impl KeywordLoader {
    pub fn new() -> Self {
        Self {
            loads: Arc::new(AtomicUsize::new(0)),
            offline: Arc::new(AtomicBool::new(false)),
            failures_left: AtomicUsize::new(0),
            delay: None,
            zero: false,
        }
    }

    /// Shared counter of load attempts.
    pub fn loads(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.loads)
    }

    /// Switch that makes every following load fail while set.
    pub fn offline_switch(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.offline)
    }

    pub fn failing_times(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Fail every load.
    pub fn always_failing(self) -> Self {
        self.failing_times(usize::MAX)
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_zero_vectors(mut self) -> Self {
        self.zero = true;
        self
    }
}

#[async_trait]
impl ModelLoader for KeywordLoader {
    fn model_name(&self) -> &str {
        "keyword-test-model"
    }

    async fn load(&self) -> Result<Arc<dyn EmbeddingModel>, EmbedderError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed || self.offline.load(Ordering::SeqCst) {
            return Err(EmbedderError::ModelUnavailable("keyword model offline".into()));
        }
        Ok(Arc::new(KeywordModel { zero: self.zero }))
    }
}

/// Records every request and answers with a canned reply.
#[derive(Clone, Default)]
pub struct RecordingCompletionModel {
    pub requests: Arc<Mutex<Vec<Vec<Message>>>>,
    pub fail_with: Option<CompletionError>,
}

impl RecordingCompletionModel {
    pub fn failing(error: CompletionError) -> Self {
        Self {
            requests: Arc::default(),
            fail_with: Some(error),
        }
    }

    pub fn last_request(&self) -> Vec<Message> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionModel for RecordingCompletionModel {
    async fn send(
        &self,
        messages: &[Message],
        _temperature: f64,
        _max_tokens: usize,
    ) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok("recorded reply".to_string()),
        }
    }
}
