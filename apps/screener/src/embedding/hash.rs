use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use siphasher::sip::SipHasher13;

use super::{l2_normalize, Embedder, EmbeddingError};

/// Fixed keys keep vectors stable across processes and Rust releases.
/// Changing them changes every embedding: bump `VERSION` with them.
const HASH_KEY_0: u64 = 0x5eed_0f_c0de_cafe;
const HASH_KEY_1: u64 = 0x0ddb_a11_face_b00c;
const VERSION: &str = "hash-v1";

pub const DEFAULT_DIMENSION: usize = 384;

const UNIGRAM_WEIGHT: f32 = 1.0;
const BIGRAM_WEIGHT: f32 = 0.5;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "in", "is", "it", "of", "on",
    "or", "our", "the", "to", "we", "will", "with", "you", "your",
];

/// Deterministic feature-hashing encoder.
///
/// Unigrams and adjacent-word bigrams are hashed into `dimension` buckets with a signed hash,
/// then L2-normalized. Needs no model files, so it is the default backend and the one tests use.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::Unusable(
                "hash embedder dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn hash(&self, feature: &str, salt: u8) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(HASH_KEY_0, HASH_KEY_1);
        salt.hash(&mut hasher);
        feature.hash(&mut hasher);
        hasher.finish()
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let idx = (self.hash(feature, 0) % self.dimension as u64) as usize;
        let sign = if self.hash(feature, 1) % 2 == 0 { 1.0 } else { -1.0 };
        vector[idx] += sign * weight;
    }

    pub(crate) fn encode(&self, text: &str) -> Vec<f32> {
        let tokens = tokenize(text);
        let mut vector = vec![0.0f32; self.dimension];

        for token in &tokens {
            self.add_feature(&mut vector, token, UNIGRAM_WEIGHT);
        }
        for pair in tokens.windows(2) {
            self.add_feature(&mut vector, &format!("{} {}", pair[0], pair[1]), BIGRAM_WEIGHT);
        }

        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn version(&self) -> &str {
        VERSION
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.encode(text))
    }
}

/// Lower-cased word tokens. Keeps `+`, `#` and inner dots so "c++", "c#", "node.js" survive.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    fn embedder() -> HashEmbedder {
        HashEmbedder::new(DEFAULT_DIMENSION).unwrap()
    }

    #[test]
    fn test_tokenize_keeps_tech_terms() {
        assert_eq!(
            tokenize("Built APIs in C++, C# and Node.js."),
            vec!["built", "apis", "c++", "c#", "node.js"]
        );
    }

    #[test]
    fn test_vectors_are_unit_length() {
        let v = embedder().encode("Senior Python engineer with AWS experience");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "norm was {norm}");
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = embedder().encode("  the and of ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_deterministic_across_instances() {
        let text = "Data scientist, PyTorch, NLP";
        assert_eq!(embedder().encode(text), embedder().encode(text));
    }

    #[test]
    fn test_related_text_is_more_similar() {
        let e = embedder();
        let job = e.encode("Backend engineer: Python, Django, PostgreSQL, AWS, Docker");
        let close = e.encode("Python developer building Django services on AWS with Docker");
        let far = e.encode("Pastry chef specialising in French desserts and bread");
        assert!(cosine_similarity(&job, &close) > cosine_similarity(&job, &far));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(
            HashEmbedder::new(0),
            Err(EmbeddingError::Unusable(_))
        ));
    }
}
