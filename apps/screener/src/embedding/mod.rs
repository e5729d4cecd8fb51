//! Embedding Provider: the single place text becomes a fixed-length unit vector.
//!
//! Backends implement [`Embedder`]. [`EmbeddingProvider`] is constructed once at startup,
//! shared read-only behind an `Arc`, and is what the scoring engine talks to.

pub mod hash;
pub mod minilm;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

pub use hash::HashEmbedder;
pub use minilm::{MiniLmEmbedder, MiniLmEmbedderConfig};
pub use remote::{RemoteEmbedder, RemoteEmbedderConfig};

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Embedder is not usable: {0}")]
    Unusable(String),
}

/// A text encoder backend.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Backend name ("hash", "remote", "minilm").
    fn name(&self) -> &'static str;

    /// Model or algorithm version. Identical input and version must give identical vectors.
    fn version(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// A unit-length (or all-zero, for text without tokens) embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// Cosine similarity in [-1, 1]; 0 for zero vectors or mismatched dimensions.
    pub fn cosine(&self, other: &Embedding) -> f64 {
        cosine_similarity(&self.0, &other.0)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Validated handle on an embedder backend.
#[derive(Clone)]
pub struct EmbeddingProvider {
    inner: Arc<dyn Embedder>,
}

impl std::fmt::Debug for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingProvider")
            .field("backend", &self.inner.name())
            .field("version", &self.inner.version())
            .field("dimension", &self.inner.dimension())
            .finish()
    }
}

impl EmbeddingProvider {
    /// Wraps a backend, rejecting one that reports no usable dimension.
    pub fn new(inner: Arc<dyn Embedder>) -> Result<Self, EmbeddingError> {
        if inner.dimension() == 0 {
            return Err(EmbeddingError::Unusable(format!(
                "{} embedder reports dimension 0",
                inner.name()
            )));
        }
        Ok(Self { inner })
    }

    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    pub fn version(&self) -> &str {
        self.inner.version()
    }

    pub fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    pub async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut vector = self.inner.embed(text).await?;
        if vector.len() != self.dimension() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension(),
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(EmbeddingError::InvalidResponse(
                "embedding contains non-finite values".to_string(),
            ));
        }
        l2_normalize(&mut vector);
        Ok(Embedding(vector))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Returns a fixed vector for known strings and an orthogonal one otherwise.
    pub(crate) struct FixedEmbedder {
        pub dimension: usize,
        pub table: Vec<(String, Vec<f32>)>,
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn version(&self) -> &str {
            "test"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(self
                .table
                .iter()
                .find(|(key, _)| key == text)
                .map(|(_, v)| v.clone())
                .unwrap_or_else(|| {
                    let mut v = vec![0.0; self.dimension];
                    v[self.dimension - 1] = 1.0;
                    v
                }))
        }
    }

    pub(crate) struct FailingEmbedder;

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn version(&self) -> &str {
            "test"
        }

        fn dimension(&self) -> usize {
            4
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Unusable("encoder offline".to_string()))
        }
    }

    #[test]
    fn test_cosine_identical_is_one() {
        let a = [0.6, 0.8];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_opposite_is_minus_one() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_zero_vector_and_mismatch() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_provider_rejects_zero_dimension() {
        let embedder = FixedEmbedder {
            dimension: 0,
            table: vec![],
        };
        assert!(matches!(
            EmbeddingProvider::new(Arc::new(embedder)),
            Err(EmbeddingError::Unusable(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_normalizes_to_unit_length() {
        let embedder = FixedEmbedder {
            dimension: 2,
            table: vec![("a".to_string(), vec![3.0, 4.0])],
        };
        let provider = EmbeddingProvider::new(Arc::new(embedder)).unwrap();
        let emb = provider.embed("a").await.unwrap();
        assert!((emb.as_slice()[0] - 0.6).abs() < 1e-6);
        assert!((emb.as_slice()[1] - 0.8).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_provider_rejects_wrong_dimension() {
        let embedder = FixedEmbedder {
            dimension: 3,
            table: vec![("a".to_string(), vec![1.0, 0.0])],
        };
        let provider = EmbeddingProvider::new(Arc::new(embedder)).unwrap();
        assert!(matches!(
            provider.embed("a").await,
            Err(EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[tokio::test]
    async fn test_provider_rejects_non_finite_values() {
        let embedder = FixedEmbedder {
            dimension: 2,
            table: vec![("a".to_string(), vec![f32::NAN, 1.0])],
        };
        let provider = EmbeddingProvider::new(Arc::new(embedder)).unwrap();
        assert!(matches!(
            provider.embed("a").await,
            Err(EmbeddingError::InvalidResponse(_))
        ));
    }
}
