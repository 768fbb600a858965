pub mod config;
pub mod embedder;
pub mod similarity;

pub use embedder::{Embedder, EmbedderError, EmbedderInfo, HashingEmbedder, OnnxSentenceEmbedder, ProviderKind};
pub use similarity::cosine_similarity;
