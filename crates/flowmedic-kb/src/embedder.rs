//! Embedding provider abstraction.
//!
//! Embedding computation is an external collaborator: the index accepts any
//! provider mapping text into a shared vector space. The default provider is
//! a hashed TF-IDF scheme — deterministic, dependency-free, and always
//! available, so index rebuilds stay idempotent even air-gapped.

use std::collections::HashMap;

use crate::error::EmbeddingError;
use crate::normalize::tokenize;

/// Maps text into a fixed-dimension vector space.
///
/// Implementations must be deterministic for a fixed input so that semantic
/// lookups are reproducible across calls and rebuilds.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;
}

/// Hashed TF-IDF embedding provider.
///
/// Terms are hashed into fixed-dimension buckets with FNV-1a and weighted by
/// term frequency with a length-based IDF approximation, then L2-normalised.
/// Not as rich as neural embeddings, but deterministic and self-contained.
pub struct HashedTfIdfEmbedder {
    dimensions: usize,
}

impl HashedTfIdfEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_term(term: &str, dims: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in term.as_bytes() {
            h ^= u64::from(*b);
            h = h.wrapping_mul(0x100000001b3);
        }
        (h as usize) % dims
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; self.dimensions];
        }

        let mut tf: HashMap<&str, f32> = HashMap::new();
        for tok in &tokens {
            *tf.entry(tok.as_str()).or_default() += 1.0;
        }

        let total = tokens.len() as f32;
        let mut vec = vec![0.0f32; self.dimensions];
        for (term, count) in &tf {
            let freq = count / total;
            // Longer terms carry more signal; short ones are likely noise.
            let idf = 1.0 + (term.len() as f32).ln();
            vec[Self::hash_term(term, self.dimensions)] += freq * idf;
        }

        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl Default for HashedTfIdfEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EmbeddingProvider for HashedTfIdfEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashed-tfidf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_zero_vector() {
        let p = HashedTfIdfEmbedder::new(64);
        let v = p.embed("").unwrap();
        assert_eq!(v.len(), 64);
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn embedding_is_deterministic() {
        let p = HashedTfIdfEmbedder::default();
        let a = p.embed("connection timed out reaching warehouse").unwrap();
        let b = p.embed("connection timed out reaching warehouse").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn non_empty_text_is_unit_length() {
        let p = HashedTfIdfEmbedder::default();
        let v = p.embed("login failed for service account").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn different_texts_produce_different_vectors() {
        let p = HashedTfIdfEmbedder::default();
        let a = p.embed("authentication token expired").unwrap();
        let b = p.embed("disk is completely full").unwrap();
        assert_ne!(a, b);
    }
}
