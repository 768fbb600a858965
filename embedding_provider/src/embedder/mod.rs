mod hashing;
mod onnx;

use thiserror::Error;

pub use hashing::{HashingConfig, HashingEmbedder};
pub use onnx::{OnnxSentenceConfig, OnnxSentenceEmbedder};

/// Identifies the backing implementation that powers an embedder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OnnxSentence,
    Hashing,
}

/// Static metadata describing a particular embedder instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedderInfo {
    pub provider: ProviderKind,
    pub embedding_model_id: String,
    pub dimension: usize,
    pub text_repr_version: String,
}

/// Errors that can be produced by embedder operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EmbedderError {
    #[error("invalid embedder configuration: {message}")]
    InvalidConfiguration { message: String },
    #[error("input text exceeds max length of {max_length}, actual length: {actual_length}")]
    InputTooLong { max_length: usize, actual_length: usize },
    #[error("provider failure: {message}")]
    ProviderFailure { message: String },
}

/// Maps texts to fixed-width vectors. One instance serves a whole batch run.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;
    /// One vector per input, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError>;
    fn info(&self) -> &EmbedderInfo;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        (**self).embed(text)
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        (**self).embed_batch(texts)
    }

    fn info(&self) -> &EmbedderInfo {
        (**self).info()
    }
}

fn require_positive(field: &str, value: usize) -> Result<(), EmbedderError> {
    if value == 0 {
        return Err(EmbedderError::InvalidConfiguration { message: format!("{field} must be greater than zero") });
    }
    Ok(())
}
