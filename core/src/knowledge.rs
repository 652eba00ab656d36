use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::document::{DocumentInput, DocumentSummary, ScoredDocument};
use crate::embeddings::{model::ModelLoader, Embedder};
use crate::error::{require, Error};
use crate::loader::{FileLoader, LoadedFiles};
use crate::vector_store::{DocumentStore, DEFAULT_THRESHOLD, DEFAULT_TOP_K};

/// Snapshot of the indexed documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStats {
    pub total_documents: usize,
    pub documents: Vec<DocumentSummary>,
}

/// Outcome of a bulk [`KnowledgeBase::ingest`].
///
/// `failed` holds both files that could not be read and documents that could not be indexed.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub added: Vec<String>,
    pub failed: Vec<(String, Error)>,
}

/// Document indexing and semantic search over a [`DocumentStore`].
///
/// Writes fail closed: an embedding failure is returned and nothing is stored.
/// Searches fail open: any failure is logged and yields no results, so the
/// assistant can still answer without context.
#[derive(Clone)]
pub struct KnowledgeBase {
    store: Arc<DocumentStore>,
    threshold: f32,
}

impl KnowledgeBase {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self {
            store,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Builds a knowledge base with its own store around `loader`.
    pub fn with_loader(loader: impl ModelLoader + 'static) -> Self {
        Self::new(Arc::new(DocumentStore::new(Arc::new(Embedder::new(loader)))))
    }

    /// Minimum similarity a document needs to be returned.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Loads the embedding model ahead of the first request.
    pub async fn warm_up(&self) -> Result<(), Error> {
        self.store.embedder().preload().await.map_err(Into::into)
    }

    pub async fn add_document(&self, id: &str, title: &str, content: &str) -> Result<(), Error> {
        require("id", id)?;
        require("title", title)?;
        require("content", content)?;
        self.store.upsert(id, title, content).await.map_err(|e| {
            warn!(document_id = id, error = %e, "Failed to add document");
            Error::from(e)
        })
    }

    pub async fn delete_document(&self, id: &str) -> Result<bool, Error> {
        require("id", id)?;
        Ok(self.store.delete(id).await)
    }

    /// Top `limit` documents related to `query`; empty when none clear the threshold.
    pub async fn search_documents(&self, query: &str, limit: usize) -> Result<Vec<ScoredDocument>, Error> {
        require("query", query)?;
        Ok(self.retrieve(query, limit).await)
    }

    /// [`search_documents`](Self::search_documents) with the default limit.
    pub async fn search(&self, query: &str) -> Result<Vec<ScoredDocument>, Error> {
        self.search_documents(query, DEFAULT_TOP_K).await
    }

    pub async fn get_stats(&self) -> KnowledgeStats {
        let documents = self.store.list().await;
        KnowledgeStats {
            total_documents: documents.len(),
            documents,
        }
    }

    /// Adds every file produced by `loader`, continuing past individual failures.
    pub async fn ingest(&self, loader: &FileLoader) -> Result<IngestReport, Error> {
        let LoadedFiles { documents, failed } = loader.load().await?;
        let mut report = IngestReport {
            failed: failed.into_iter().map(|(path, e)| (path, e.into())).collect(),
            ..IngestReport::default()
        };
        for DocumentInput { id, title, content } in documents {
            match self.add_document(&id, &title, &content).await {
                Ok(()) => report.added.push(id),
                Err(e) => report.failed.push((id, e)),
            }
        }
        info!(
            added = report.added.len(),
            failed = report.failed.len(),
            "Ingested files into knowledge base"
        );
        Ok(report)
    }

    pub(crate) async fn retrieve(&self, query: &str, limit: usize) -> Vec<ScoredDocument> {
        let total = self.store.len().await;
        if total == 0 {
            info!("Vector database is empty");
            return Vec::new();
        }

        let embedding = match self.store.embedder().embed(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                warn!(degraded = true, error = %e, "Search degraded to empty result");
                return Vec::new();
            }
        };
        match self.store.search(&embedding, limit, self.threshold).await {
            Ok(results) => {
                info!(matches = results.len(), searched = total, "Found relevant documents");
                results
            }
            Err(e) => {
                warn!(degraded = true, error = %e, "Search degraded to empty result");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::testing::KeywordLoader;
    use std::sync::atomic::Ordering;

    async fn seeded() -> KnowledgeBase {
        let kb = KnowledgeBase::with_loader(KeywordLoader::new());
        kb.add_document("rust", "Rust", "rust tokio rust").await.unwrap();
        kb.add_document("food", "Dinner", "cooking pasta").await.unwrap();
        kb.add_document("tunes", "Playlist", "music music").await.unwrap();
        kb
    }

    #[tokio::test]
    async fn search_returns_relevant_documents() {
        let kb = seeded().await;
        let results = kb.search("how do I use tokio with rust").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "rust");
        assert_eq!(results[0].title, "Rust");
        assert_eq!(results[0].content, "rust tokio rust");
    }

    #[tokio::test]
    async fn search_respects_limit() {
        let kb = KnowledgeBase::with_loader(KeywordLoader::new());
        for i in 0..5 {
            kb.add_document(&format!("d{i}"), "Rust", "rust").await.unwrap();
        }
        assert_eq!(kb.search_documents("rust", 2).await.unwrap().len(), 2);
        assert_eq!(kb.search("rust").await.unwrap().len(), DEFAULT_TOP_K);
    }

    #[tokio::test]
    async fn empty_store_search_skips_embedding() {
        let loader = KeywordLoader::new();
        let loads = loader.loads();
        let kb = KnowledgeBase::with_loader(loader);
        assert!(kb.search("rust").await.unwrap().is_empty());
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn write_fails_closed_when_model_is_unavailable() {
        let kb = KnowledgeBase::with_loader(KeywordLoader::new().always_failing());
        let result = kb.add_document("d1", "Title", "Body").await;
        assert!(matches!(result, Err(Error::Embedder(_))));
        assert_eq!(kb.get_stats().await.total_documents, 0);
    }

    #[tokio::test]
    async fn read_fails_open_when_model_is_unavailable() {
        let loader = KeywordLoader::new();
        let offline = loader.offline_switch();
        let kb = KnowledgeBase::with_loader(loader);
        kb.add_document("rust", "Rust", "rust tokio rust").await.unwrap();
        assert_eq!(kb.search("rust").await.unwrap().len(), 1);

        offline.store(true, Ordering::SeqCst);
        kb.store().embedder().reset().await;

        assert!(kb.search("rust").await.unwrap().is_empty());
        // writes still surface the failure
        assert!(matches!(
            kb.add_document("d2", "Title", "Body").await,
            Err(Error::Embedder(_))
        ));
        assert_eq!(kb.get_stats().await.total_documents, 1);

        offline.store(false, Ordering::SeqCst);
        assert_eq!(kb.search("rust").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected_before_embedding() {
        let loader = KeywordLoader::new();
        let loads = loader.loads();
        let kb = KnowledgeBase::with_loader(loader);

        let err = kb.add_document("", "Title", "Body").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingField("id"))));
        let err = kb.add_document("d1", " ", "Body").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingField("title"))));
        let err = kb.add_document("d1", "Title", "").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingField("content"))));
        let err = kb.search("").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingField("query"))));
        let err = kb.delete_document("").await.unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MissingField("id"))));

        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stats_list_documents_without_content() {
        let kb = seeded().await;
        assert!(kb.delete_document("food").await.unwrap());
        assert!(!kb.delete_document("food").await.unwrap());

        let stats = kb.get_stats().await;
        assert_eq!(stats.total_documents, 2);
        let ids: Vec<_> = stats.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["rust", "tunes"]);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalDocuments"], 2);
        assert!(json["documents"][0].get("content").is_none());
    }

    #[tokio::test]
    async fn warm_up_loads_the_model() {
        let loader = KeywordLoader::new();
        let loads = loader.loads();
        let kb = KnowledgeBase::with_loader(loader);
        kb.warm_up().await.unwrap();
        assert!(kb.store().embedder().is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
