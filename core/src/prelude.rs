pub use crate::completion::{Client, CompletionModel, Message};
pub use crate::config::RagConfig;
pub use crate::document::{DocumentSummary, ScoredDocument};
pub use crate::embeddings::{model::EmbeddingModel, model::ModelLoader, Embedder};
pub use crate::error::Error;
pub use crate::knowledge::{KnowledgeBase, KnowledgeStats};
pub use crate::loader::FileLoader;
pub use crate::vector_store::DocumentStore;
