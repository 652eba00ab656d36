use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::embeddings::embedding::Embedding;

/// A stored document together with the embedding of its title and content.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub content: String,
    pub embedding: Embedding,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: String, title: String, content: String, embedding: Embedding) -> Self {
        Self {
            id,
            title,
            content,
            embedding,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }
}

/// The text that gets embedded for a document.
#[must_use]
pub fn embedding_text(title: &str, content: &str) -> String {
    format!("{title}\n\n{content}")
}

/// Raw fields of a document before it is embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInput {
    pub id: String,
    pub title: String,
    pub content: String,
}

impl DocumentInput {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

/// Lightweight listing entry, without content or embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Read view of a document handed to the ranker.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCandidate {
    pub id: String,
    pub title: String,
    pub content: String,
    pub embedding: Embedding,
}

impl From<&Document> for SearchCandidate {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            content: doc.content.clone(),
            embedding: doc.embedding.clone(),
        }
    }
}

/// A ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "similarity")]
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_text_joins_title_and_content() {
        assert_eq!(embedding_text("Title", "Body"), "Title\n\nBody");
    }

    #[test]
    fn summary_drops_content_and_embedding() {
        let doc = Document::new(
            "d1".to_string(),
            "Title".to_string(),
            "Body".to_string(),
            Embedding::from(vec![1.0, 0.0]),
        );
        let summary = doc.summary();
        assert_eq!(summary.id, "d1");
        assert_eq!(summary.title, "Title");
        assert_eq!(summary.created_at, doc.created_at);

        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("content").is_none());
    }
}
