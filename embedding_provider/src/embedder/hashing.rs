use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::{Embedder, EmbedderError, EmbedderInfo, ProviderKind};

#[derive(Debug, Clone)]
pub struct HashingConfig {
    pub dimension: usize,
    /// Maximum input length in characters.
    pub max_input_length: usize,
    pub embedding_model_id: String,
    pub text_repr_version: String,
}

/// Deterministic bag-of-words embedder.
///
/// Every lower-cased alphanumeric token is hashed to one signed bucket, so texts
/// that share words point in similar directions. Needs no model assets.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    info: EmbedderInfo,
    max_input_length: usize,
    seed: u64,
}

impl HashingEmbedder {
    pub fn new(config: HashingConfig) -> Result<Self, EmbedderError> {
        super::require_positive("dimension", config.dimension)?;
        super::require_positive("max_input_length", config.max_input_length)?;

        let mut hasher = DefaultHasher::new();
        config.embedding_model_id.hash(&mut hasher);
        config.text_repr_version.hash(&mut hasher);
        let seed = hasher.finish();

        Ok(Self {
            info: EmbedderInfo {
                provider: ProviderKind::Hashing,
                embedding_model_id: config.embedding_model_id,
                dimension: config.dimension,
                text_repr_version: config.text_repr_version,
            },
            max_input_length: config.max_input_length,
            seed,
        })
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        token.hash(&mut hasher);
        let hash = hasher.finish();
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        ((hash % self.info.dimension as u64) as usize, sign)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let actual_length = text.chars().count();
        if actual_length > self.max_input_length {
            return Err(EmbedderError::InputTooLong { max_length: self.max_input_length, actual_length });
        }

        let mut vector = vec![0f32; self.info.dimension];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let (index, sign) = self.bucket(token);
            vector[index] += sign;
        }
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}
