use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::RagError;

use super::{Embedder, Retriever};

/// In-memory similarity index over embedded documents.
#[derive(Debug)]
pub struct VectorIndex<E> {
    embedder: E,
    documents: Vec<String>,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl<E: Embedder> VectorIndex<E> {
    /// Embed `documents` and index them.
    ///
    /// An empty document set, or vectors of differing lengths, is an error.
    pub async fn build(embedder: E, documents: Vec<String>) -> Result<Self, RagError> {
        if documents.is_empty() {
            return Err(RagError::EmptyIndex);
        }

        let vectors = embedder.embed(&documents).await?;
        if vectors.len() != documents.len() {
            return Err(RagError::EmbeddingCount {
                expected: documents.len(),
                got: vectors.len(),
            });
        }

        let dimensions = vectors[0].len();
        if let Some(odd) = vectors.iter().find(|v| v.len() != dimensions) {
            return Err(RagError::DimensionMismatch {
                expected: dimensions,
                got: odd.len(),
            });
        }

        info!(documents = documents.len(), dimensions, "built vector index");
        Ok(Self {
            embedder,
            documents,
            vectors,
            dimensions,
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Indices and scores of the `k` closest documents, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(query, v)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}

#[async_trait]
impl<E: Embedder> Retriever for VectorIndex<E> {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<String>, RagError> {
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = vectors
            .pop()
            .ok_or(RagError::EmbeddingCount { expected: 1, got: 0 })?;

        if query_vector.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                got: query_vector.len(),
            });
        }

        let hits = self.search(&query_vector, k);
        debug!(?hits, "similarity search");

        Ok(hits
            .into_iter()
            .map(|(i, _)| self.documents[i].clone())
            .collect())
    }
}

/// Cosine similarity; 0 for empty, mismatched or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
