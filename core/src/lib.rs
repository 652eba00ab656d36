//! # jarvis-rag - Core API Documentation
//!
//! Retrieval-augmented generation for a local chat assistant: documents are
//! embedded into unit-length vectors, kept in an in-memory store, ranked by
//! cosine similarity against a query, and the best matches are spliced into the
//! prompt sent to an OpenAI-compatible chat server.
//!
//! ## Components
//!
//! - **Embedder**: turns text into normalized vectors with a lazily loaded model
//!   (local Model2Vec by default, or any OpenAI-compatible embeddings endpoint)
//! - **Document Store**: id-keyed records with replace-on-upsert semantics
//! - **Ranker**: exact linear scan returning the top-k documents above a threshold
//! - **Client**: builds the context block and message list, then calls the chat model
//!
//! ## Example
//!
//! ```rust,no_run
//! use jarvis_rag::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let config = RagConfig::from_env()?;
//!     let client = Client::from_config(&config)?;
//!     client.knowledge().warm_up().await?;
//!
//!     client
//!         .knowledge()
//!         .add_document("wifi", "Office Wi-Fi", "The guest network password is hunter2.")
//!         .await?;
//!
//!     let history = vec![Message::User("Hi!".into()), Message::Assistant("Hello!".into())];
//!     let reply = client
//!         .prompt("What's the guest Wi-Fi password?")
//!         .history(history)
//!         .send()
//!         .await?;
//!     println!("{reply}");
//!     Ok(())
//! }
//! ```
//!
//! ## Failure policy
//!
//! Adding a document fails closed: if the embedding model is unavailable the
//! error is returned and the store is unchanged. Searching fails open: the
//! failure is logged (`degraded = true`) and an empty result is returned, so the
//! assistant still answers, just without context.
//!
//! ## Feature flags
//!
//! Name | Description | Default?
//! ---|---|---
//! `pdf` | enables the file loader to parse PDFs | No

/// Retrieval-augmented chat
///
/// Contains:
/// - Client and prompt builder
/// - Context block formatting and history truncation
/// - The chat-completion model trait
pub mod completion;

/// Runtime configuration from JSON and environment variables
pub mod config;

/// Document records and the views derived from them
pub mod document;

/// Text embeddings support
pub mod embeddings;

/// Error types for all library operations
pub mod error;

/// Document indexing and search interface
pub mod knowledge;

/// Bulk loading of documents from files
pub mod loader;

/// Convenience prelude exports
pub mod prelude;

/// Builtin completion and embedding model providers
pub mod providers;

/// In-memory document storage and similarity ranking
pub mod vector_store;

#[cfg(test)]
mod testing;
