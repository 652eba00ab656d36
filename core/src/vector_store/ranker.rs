//! Exact linear-scan similarity ranking.

use super::VectorStoreError;
use crate::document::{ScoredDocument, SearchCandidate};
use crate::embeddings::embedding::Embedding;

pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_THRESHOLD: f32 = 0.3;

/// Scores every candidate against `query` and keeps the best `k` with a score above `threshold`.
///
/// Both sides are expected to be unit vectors, so the dot product is the cosine
/// similarity. Results are sorted by descending score; ties keep candidate order.
pub fn rank(
    query: &Embedding,
    candidates: Vec<SearchCandidate>,
    k: usize,
    threshold: f32,
) -> Result<Vec<ScoredDocument>, VectorStoreError> {
    let hits = top_k(query, candidates.iter().map(|c| &c.embedding), k, threshold)?;
    let mut slots: Vec<Option<SearchCandidate>> = candidates.into_iter().map(Some).collect();
    Ok(hits
        .into_iter()
        .filter_map(|(i, score)| {
            slots[i].take().map(|c| ScoredDocument {
                id: c.id,
                title: c.title,
                content: c.content,
                score,
            })
        })
        .collect())
}

/// Positions and scores of the best `k` embeddings above `threshold`, best first.
///
/// Works on borrowed vectors so callers can rank in place and copy only the winners.
pub(crate) fn top_k<'a>(
    query: &Embedding,
    embeddings: impl IntoIterator<Item = &'a Embedding>,
    k: usize,
    threshold: f32,
) -> Result<Vec<(usize, f32)>, VectorStoreError> {
    let mut scored = Vec::new();
    for (i, embedding) in embeddings.into_iter().enumerate() {
        if embedding.dimension() != query.dimension() {
            return Err(VectorStoreError::DimensionMismatch {
                expected: embedding.dimension(),
                actual: query.dimension(),
            });
        }
        let score = query.dot(embedding);
        // NaN never passes
        if score > threshold {
            scored.push((i, score));
        }
    }

    // stable, so equal scores stay in insertion order
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);
    Ok(scored)
}
