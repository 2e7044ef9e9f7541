use serde::{Deserialize, Serialize};

/// Default embedding length produced by the shipped feature model.
pub const EMBEDDING_DIM: usize = 512;

/// Visual feature vector. Only comparable with embeddings of the same model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Unit-length copy; a zero vector stays zero.
    pub fn normalized(&self) -> Embedding {
        let norm = self.norm();
        if norm <= f32::EPSILON || !norm.is_finite() {
            return Embedding(vec![0.0; self.0.len()]);
        }
        Embedding(self.0.iter().map(|v| v / norm).collect())
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    /// Cosine similarity, 0 when either side has zero norm.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        let denom = self.norm() * other.norm();
        if denom <= f32::EPSILON {
            return 0.0;
        }
        dot(&self.0, &other.0) / denom
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_of_parallel_vectors() {
        let a = Embedding::new(vec![1.0, 2.0, 3.0]);
        let b = Embedding::new(vec![2.0, 4.0, 6.0]);
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_has_zero_similarity() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
        assert_eq!(a.normalized().as_slice(), &[0.0, 0.0]);
    }
}
