//! Deterministic hash embedding (§4.1 default provider).
//!
//! No model weights, no network calls: whitespace tokens are mixed via a
//! byte-shift hash into one of `dimension` slots (+1 per occurrence),
//! character codes are accumulated into the same space at a tenth of the
//! weight, the first three slots are overwritten with coarse structural
//! features (length, word count, sentence count), and the result is
//! L2-normalized. Two documents sharing vocabulary land closer in cosine
//! space than unrelated ones — good enough for the vector-similarity
//! *signal* inside the hybrid scorer (§4.13), which never relies on it alone.

use super::EmbeddingModel;
use crate::error::ConceptRagError;

const CHAR_WEIGHT: f32 = 0.1;

pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn byte_shift_hash(bytes: &[u8]) -> u64 {
        bytes
            .iter()
            .fold(0u64, |acc, b| acc.wrapping_shl(5).wrapping_add(*b as u64))
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimension];
        if self.dimension == 0 {
            return vector;
        }

        let tokens: Vec<&str> = text.split_whitespace().collect();
        for token in &tokens {
            let slot = (Self::byte_shift_hash(token.as_bytes()) as usize) % self.dimension;
            vector[slot] += 1.0;
        }

        for c in text.chars() {
            let slot = (c as usize) % self.dimension;
            vector[slot] += CHAR_WEIGHT;
        }

        if self.dimension >= 3 {
            let word_count = tokens.len();
            let sentence_count = text.chars().filter(|c| matches!(c, '.' | '!' | '?')).count();
            vector[0] = text.len() as f32 / 1000.0;
            vector[1] = word_count as f32 / 100.0;
            vector[2] = sentence_count as f32 / 10.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in vector.iter_mut() {
                *v /= norm;
            }
        }
        vector
    }
}

impl EmbeddingModel for HashEmbedder {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>, ConceptRagError> {
        Ok(self.embed(text))
    }

    fn embed_document(&self, text: &str) -> Result<Vec<f32>, ConceptRagError> {
        Ok(self.embed(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_deterministically() {
        let e = HashEmbedder::new(384);
        assert_eq!(
            e.embed_document("hello world").unwrap(),
            e.embed_document("hello world").unwrap()
        );
    }

    #[test]
    fn produces_unit_vectors() {
        let e = HashEmbedder::new(384);
        let v = e.embed_document("the quick brown fox jumps").unwrap();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn empty_text_yields_zero_vector() {
        let e = HashEmbedder::new(384);
        let v = e.embed_document("").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn respects_configured_dimension() {
        let e = HashEmbedder::new(128);
        assert_eq!(e.embed_document("some text").unwrap().len(), 128);
        assert_eq!(e.dimension(), 128);
    }

    #[test]
    fn shared_vocabulary_is_closer_than_unrelated_text() {
        let e = HashEmbedder::new(384);
        let a = e.embed_document("database indexing and query planning").unwrap();
        let b = e
            .embed_document("query planning for database indexes")
            .unwrap();
        let c = e.embed_document("a recipe for banana bread").unwrap();

        let cos = |x: &[f32], y: &[f32]| x.iter().zip(y).map(|(p, q)| p * q).sum::<f32>();
        assert!(cos(&a, &b) > cos(&a, &c));
    }
}
