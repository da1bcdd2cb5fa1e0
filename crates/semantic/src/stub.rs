use async_trait::async_trait;
use fxhash::hash64;

use crate::normalize::{l2_normalize_in_place, prepare_text};
use crate::{Embedder, SemanticConfig, SemanticError};

/// Deterministic embedder used when `mode` is `"stub"`.
///
/// Each component is derived from a hash of the prepared text and its position,
/// so identical text always maps to the identical unit-length vector.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    model_name: String,
    dimensions: usize,
}

impl StubEmbedder {
    pub fn new(cfg: &SemanticConfig) -> Result<Self, SemanticError> {
        if cfg.dimensions == 0 {
            return Err(SemanticError::InvalidConfig(
                "embedding.dimensions must be >= 1".into(),
            ));
        }
        Ok(Self {
            model_name: cfg.model_name.clone(),
            dimensions: cfg.dimensions,
        })
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            model_name: "stub".into(),
            dimensions: dimensions.max(1),
        }
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        Ok(make_stub_vector(&prepare_text(text), self.dimensions))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

pub(crate) fn make_stub_vector(text: &str, dimensions: usize) -> Vec<f32> {
    let h = hash64(text.as_bytes());
    let mut v: Vec<f32> = (0..dimensions)
        .map(|idx| {
            let mixed = hash64(&(h, idx as u64));
            // Map to [-1.0, 1.0].
            (mixed as f64 / u64::MAX as f64 * 2.0 - 1.0) as f32
        })
        .collect();
    l2_normalize_in_place(&mut v);
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn stub_respects_dimensions() {
        let embedder = StubEmbedder::new(&SemanticConfig::stub(64)).unwrap();
        let v = embedder.embed("hello world").await.unwrap();
        assert_eq!(v.len(), 64);
        assert_eq!(embedder.dimensions(), 64);
    }

    #[tokio::test]
    async fn stub_is_deterministic() {
        let embedder = StubEmbedder::with_dimensions(32);
        let a = embedder.embed("same text").await.unwrap();
        let b = embedder.embed("same text").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn stub_differs_for_different_text() {
        let embedder = StubEmbedder::with_dimensions(32);
        let a = embedder.embed("hello").await.unwrap();
        let b = embedder.embed("world").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn stub_flattens_newlines_first() {
        let embedder = StubEmbedder::with_dimensions(16);
        let a = embedder.embed("line one\nline two").await.unwrap();
        let b = embedder.embed("line one line two").await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn stub_vector_is_unit_length() {
        let v = make_stub_vector("normalize me", 128);
        assert!((norm(&v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(StubEmbedder::new(&SemanticConfig::stub(0)).is_err());
    }
}
