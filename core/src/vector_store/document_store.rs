use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{ranker, VectorStoreError};
use crate::document::{embedding_text, Document, DocumentSummary, ScoredDocument, SearchCandidate};
use crate::embeddings::{embedding::Embedding, Embedder, EmbedderError};

/// In-memory store of embedded documents, keyed by id.
///
/// Records are kept in insertion order; replacing a document moves it to the end.
/// Structural mutations happen under the write lock with no suspension point,
/// so a replace is never observed as a missing or duplicated id, and a dropped
/// `upsert` future never leaves a partial record.
pub struct DocumentStore {
    embedder: Arc<Embedder>,
    documents: RwLock<Vec<Document>>,
}

impl DocumentStore {
    pub fn new(embedder: Arc<Embedder>) -> Self {
        Self {
            embedder,
            documents: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn embedder(&self) -> &Arc<Embedder> {
        &self.embedder
    }

    /// Embeds the document and inserts it, replacing any record with the same id.
    ///
    /// On failure the store is left untouched.
    pub async fn upsert(&self, id: &str, title: &str, content: &str) -> Result<(), EmbedderError> {
        let embedding = self.embedder.embed(&embedding_text(title, content)).await?;
        let document = Document::new(id.to_string(), title.to_string(), content.to_string(), embedding);

        let mut documents = self.documents.write().await;
        if let Some(other) = documents.iter().find(|d| d.id != id) {
            let expected = other.embedding.dimension();
            let actual = document.embedding.dimension();
            if expected != actual {
                return Err(EmbedderError::DimensionMismatch { expected, actual });
            }
        }

        let before = documents.len();
        documents.retain(|d| d.id != id);
        let replaced = documents.len() < before;
        documents.push(document);

        info!(
            document_id = id,
            title,
            replaced,
            total = documents.len(),
            "Added document to vector store"
        );
        Ok(())
    }

    /// Removes the record with `id`, returning whether one was present.
    pub async fn delete(&self, id: &str) -> bool {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|d| d.id != id);
        let deleted = documents.len() < before;

        if deleted {
            info!(document_id = id, remaining = documents.len(), "Deleted document from vector store");
        } else {
            info!(document_id = id, "Document not found in vector store");
        }
        deleted
    }

    pub async fn list(&self) -> Vec<DocumentSummary> {
        self.documents.read().await.iter().map(Document::summary).collect()
    }

    pub async fn get(&self, id: &str) -> Option<Document> {
        self.documents.read().await.iter().find(|d| d.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Owned copy of the searchable records, in insertion order.
    pub async fn snapshot_for_search(&self) -> Vec<SearchCandidate> {
        self.documents.read().await.iter().map(SearchCandidate::from).collect()
    }

    /// Ranks the stored documents against an already embedded query.
    pub async fn search(
        &self,
        query: &Embedding,
        k: usize,
        threshold: f32,
    ) -> Result<Vec<ScoredDocument>, VectorStoreError> {
        let documents = self.documents.read().await;
        let hits = ranker::top_k(query, documents.iter().map(|d| &d.embedding), k, threshold)?;
        let results: Vec<ScoredDocument> = hits
            .into_iter()
            .map(|(i, score)| {
                let d = &documents[i];
                ScoredDocument {
                    id: d.id.clone(),
                    title: d.title.clone(),
                    content: d.content.clone(),
                    score,
                }
            })
            .collect();
        let searched = documents.len();
        debug!(searched, matches = results.len(), k, threshold, "Ranked documents");
        Ok(results)
    }
}
