/// A fixed-dimension embedding vector.
///
/// Vectors produced by [`Embedder`](super::Embedder) are L2-normalized, so the
/// dot product of two of them is their cosine similarity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Euclidean (L2) norm.
    #[must_use]
    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Dot product. Callers must ensure both vectors share a dimension.
    #[must_use]
    pub fn dot(&self, other: &Embedding) -> f32 {
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }

    /// Scales the vector to unit length.
    ///
    /// Returns `None` for empty, all-zero, or non-finite vectors, which have no direction.
    #[must_use]
    pub fn normalized(self) -> Option<Embedding> {
        if self.0.is_empty() || self.0.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let norm = self.norm();
        if norm == 0.0 || !norm.is_finite() {
            return None;
        }
        Some(Embedding(self.0.into_iter().map(|v| v / norm).collect()))
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(value: Vec<f32>) -> Self {
        Self(value)
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(value: Embedding) -> Self {
        value.0
    }
}
