use sha2::{Digest, Sha256};

use super::EMBEDDING_DIM;

/// Turns text into fixed-length vectors.
///
/// Implementations must be deterministic: the same text always yields the same
/// vector, across process restarts. Embedding never fails.
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Length of every vector returned by [`embed`](Self::embed)
    fn dimension(&self) -> usize;

    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Generate embeddings for a batch of texts, preserving order
    fn embed_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Hash-seeded pseudo-random projection.
///
/// The SHA-256 digest of the text seeds a counter-mode stream of digests whose
/// bytes are turned into standard-normal values with the Box-Muller transform.
/// Distinct texts map to unrelated vectors with overwhelming probability; there
/// is no notion of semantic closeness.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl EmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let seed = Sha256::digest(text.as_bytes());

        // Two uniforms per normal pair, four bytes per uniform
        let pairs = self.dimension.div_ceil(2);
        let mut uniforms = Vec::with_capacity(pairs * 2);
        let mut counter: u32 = 0;
        while uniforms.len() < pairs * 2 {
            let mut hasher = Sha256::new();
            hasher.update(seed);
            hasher.update(counter.to_le_bytes());
            let block = hasher.finalize();
            for word in block.chunks_exact(4) {
                let raw = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
                // (0, 1]: never zero so ln() stays finite
                uniforms.push((raw as f64 + 1.0) / (u32::MAX as f64 + 1.0));
            }
            counter += 1;
        }

        let mut vector = Vec::with_capacity(pairs * 2);
        for pair in uniforms.chunks_exact(2).take(pairs) {
            let radius = (-2.0 * pair[0].ln()).sqrt();
            let theta = 2.0 * std::f64::consts::PI * pair[1];
            vector.push((radius * theta.cos()) as f32);
            vector.push((radius * theta.sin()) as f32);
        }
        vector.truncate(self.dimension);
        vector
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "sha256-projection"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_is_deterministic() {
        let provider = HashEmbedder::default();
        let a = provider.embed("Cats are mammals. They purr.");
        let b = provider.embed("Cats are mammals. They purr.");
        let a_bits: Vec<u32> = a.iter().map(|x| x.to_bits()).collect();
        let b_bits: Vec<u32> = b.iter().map(|x| x.to_bits()).collect();
        assert_eq!(a_bits, b_bits);
    }

    #[test]
    fn test_embed_has_fixed_dimension() {
        let provider = HashEmbedder::default();
        assert_eq!(provider.embed("").len(), EMBEDDING_DIM);
        assert_eq!(provider.embed(&"long ".repeat(5000)).len(), EMBEDDING_DIM);
    }

    #[test]
    fn test_embed_odd_dimension() {
        let provider = HashEmbedder::new(7);
        assert_eq!(provider.embed("odd").len(), 7);
        assert_eq!(provider.dimension(), 7);
    }

    #[test]
    fn test_distinct_texts_differ() {
        let provider = HashEmbedder::default();
        assert_ne!(provider.embed("Cats"), provider.embed("Dogs"));
        assert_ne!(provider.embed("cats"), provider.embed("Cats"));
    }

    #[test]
    fn test_values_are_finite() {
        let provider = HashEmbedder::default();
        for text in ["", "a", "mammals", "ünïcödé"] {
            assert!(provider.embed(text).iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_embed_batch_preserves_order() {
        let provider = HashEmbedder::default();
        let batch = provider.embed_batch(&["one", "two"]);
        assert_eq!(batch[0], provider.embed("one"));
        assert_eq!(batch[1], provider.embed("two"));
    }
}
