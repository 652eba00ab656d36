pub mod completions;
pub mod embeddings;
