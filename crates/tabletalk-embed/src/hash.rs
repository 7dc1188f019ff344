//! Local fallback embedder
//!
//! Deterministic bag-of-tokens embedding: each lowercased token is hashed
//! into a bucket of a fixed-dimension vector, with the hash's low bit
//! choosing the sign, and the result is L2-normalized. No model weights, no
//! network. Retrieval quality is far below a real embedding model, but it
//! keeps the pipeline alive when the primary endpoint is down and it is
//! exact enough for keyword-flavored questions over table names.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::{EmbedError, Embedder};

pub const DEFAULT_DIMENSION: usize = 384;

pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let h = u64::from_le_bytes(digest[..8].try_into().expect("digest has 32 bytes"));
            let bucket = ((h >> 1) % self.dimension as u64) as usize;
            let sign = if h & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &str {
        "hash-embedder"
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self.embed_sync(text))
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_input() {
        let e = HashEmbedder::new(128);
        assert_eq!(e.embed_sync("salary history"), e.embed_sync("salary history"));
    }

    #[test]
    fn case_and_punctuation_insensitive() {
        let e = HashEmbedder::new(128);
        assert_eq!(e.embed_sync("Employees!"), e.embed_sync("employees"));
    }

    #[test]
    fn distinct_inputs_differ() {
        let e = HashEmbedder::new(128);
        assert_ne!(e.embed_sync("employees"), e.embed_sync("departments"));
    }

    #[test]
    fn output_is_unit_length() {
        let e = HashEmbedder::new(256);
        let v = e.embed_sync("average salary by title");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_input_is_zero_vector() {
        let e = HashEmbedder::new(64);
        let v = e.embed_sync("   ");
        assert_eq!(v.len(), 64);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn respects_requested_dimension() {
        for dim in [16, 384, 1024] {
            assert_eq!(HashEmbedder::new(dim).embed_sync("ping").len(), dim);
        }
    }
}
