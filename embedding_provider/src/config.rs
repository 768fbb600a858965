use std::path::PathBuf;

use crate::embedder::{HashingConfig, OnnxSentenceConfig};

/// Asset locations and shape of the bundled sentence model.
#[derive(Debug, Clone, Copy)]
pub struct SentenceModelDefaults {
    pub model_path: &'static str,
    pub tokenizer_path: &'static str,
    pub runtime_library_path: &'static str,
    pub embedding_dimension: usize,
    pub max_input_tokens: usize,
    pub embedding_model_id: &'static str,
    pub text_repr_version: &'static str,
}

#[cfg(windows)]
const RUNTIME_LIBRARY: &str = "bin/onnxruntime/lib/onnxruntime.dll";
#[cfg(target_os = "macos")]
const RUNTIME_LIBRARY: &str = "bin/onnxruntime/lib/libonnxruntime.dylib";
#[cfg(all(not(windows), not(target_os = "macos")))]
const RUNTIME_LIBRARY: &str = "bin/onnxruntime/lib/libonnxruntime.so";

pub const SENTENCE_MODEL_DEFAULTS: SentenceModelDefaults = SentenceModelDefaults {
    model_path: "models/all-MiniLM-L6-v2-onnx/model.onnx",
    tokenizer_path: "models/all-MiniLM-L6-v2-onnx/tokenizer.json",
    runtime_library_path: RUNTIME_LIBRARY,
    embedding_dimension: 384,
    max_input_tokens: 256,
    embedding_model_id: "all-MiniLM-L6-v2",
    text_repr_version: "v1",
};

/// [`OnnxSentenceConfig`] for the bundled model, paths relative to this crate.
pub fn default_sentence_config() -> OnnxSentenceConfig {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let d = SENTENCE_MODEL_DEFAULTS;
    OnnxSentenceConfig {
        model_path: base.join(d.model_path),
        tokenizer_path: base.join(d.tokenizer_path),
        runtime_library_path: base.join(d.runtime_library_path),
        dimension: d.embedding_dimension,
        max_input_length: d.max_input_tokens,
        truncate_inputs: true,
        embedding_model_id: d.embedding_model_id.into(),
        text_repr_version: d.text_repr_version.into(),
    }
}

/// Offline hashing embedder sized like the default sentence model.
pub fn default_hashing_config() -> HashingConfig {
    HashingConfig {
        dimension: SENTENCE_MODEL_DEFAULTS.embedding_dimension,
        max_input_length: 1 << 20,
        embedding_model_id: "token-hashing".into(),
        text_repr_version: SENTENCE_MODEL_DEFAULTS.text_repr_version.into(),
    }
}
