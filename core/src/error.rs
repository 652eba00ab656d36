use crate::{
    completion::CompletionError, config::ConfigError, embeddings::EmbedderError,
    loader::LoaderError, vector_store::VectorStoreError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("Embedder error: {0}")]
    Embedder(#[from] EmbedderError),
    #[error("VectorStore error: {0}")]
    VectorStore(#[from] VectorStoreError),
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),
}

/// Rejected input, raised before any embedding work is attempted.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("`{0}` is required")]
    MissingField(&'static str),
}

/// Fails with [`ValidationError::MissingField`] when `value` is blank.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}
