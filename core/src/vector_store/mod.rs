mod document_store;
pub mod ranker;

pub use document_store::DocumentStore;
pub use ranker::{rank, DEFAULT_THRESHOLD, DEFAULT_TOP_K};

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VectorStoreError {
    #[error("Query dimension {actual} does not match stored dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}
