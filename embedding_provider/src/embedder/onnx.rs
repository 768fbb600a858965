//! Sentence encoder backed by ONNX Runtime.
//!
//! Texts are tokenized, padded into one `[batch, seq]` matrix, run through the
//! model, and the `[batch, seq, hidden]` token states are mean-pooled over the
//! attention mask.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use ndarray::{Array2, ArrayView3, Axis};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::utils::truncation::TruncationParams;
use tokenizers::{Encoding, Tokenizer};

use super::{Embedder, EmbedderError, EmbedderInfo, ProviderKind};

const PAD_TOKENS: [&str; 2] = ["<pad>", "[PAD]"];

/// Runtime library the process-wide ONNX environment was created with.
static RUNTIME_LIBRARY: OnceLock<PathBuf> = OnceLock::new();

#[derive(Debug, Clone)]
pub struct OnnxSentenceConfig {
    pub model_path: PathBuf,
    pub runtime_library_path: PathBuf,
    pub tokenizer_path: PathBuf,
    /// Width of the pooled vector.
    pub dimension: usize,
    /// Token limit per text, special tokens included.
    pub max_input_length: usize,
    /// Cut inputs to `max_input_length` tokens instead of rejecting them.
    pub truncate_inputs: bool,
    pub embedding_model_id: String,
    pub text_repr_version: String,
}

/// Mean-pooled sentence embeddings from a local transformer export.
#[derive(Debug)]
pub struct OnnxSentenceEmbedder {
    info: EmbedderInfo,
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    pad_id: i64,
    max_input_length: usize,
    /// BERT-style exports take `token_type_ids` as a third input.
    wants_token_type_ids: bool,
}

/// Padded model inputs for one call.
struct TokenBatch {
    ids: Array2<i64>,
    mask: Array2<i64>,
}

impl OnnxSentenceEmbedder {
    pub fn new(config: OnnxSentenceConfig) -> Result<Self, EmbedderError> {
        super::require_positive("dimension", config.dimension)?;
        super::require_positive("max_input_length", config.max_input_length)?;

        let runtime = existing_file(&config.runtime_library_path, "ONNX Runtime shared library")?;
        init_runtime(&runtime)?;
        let model_path = existing_file(&config.model_path, "ONNX model")?;
        let tokenizer_path = existing_file(&config.tokenizer_path, "tokenizer config")?;

        let session = Session::builder()
            .and_then(|builder| builder.commit_from_file(&model_path))
            .map_err(|err| provider_failure("load ONNX model", err))?;
        let wants_token_type_ids = session.inputs.len() >= 3;

        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|err| provider_failure("load tokenizer", err))?;
        tokenizer.with_padding(None);
        let truncation = config
            .truncate_inputs
            .then(|| TruncationParams { max_length: config.max_input_length, ..Default::default() });
        tokenizer
            .with_truncation(truncation)
            .map_err(|err| provider_failure("configure truncation", err))?;

        let Some(pad_id) = PAD_TOKENS.iter().find_map(|token| tokenizer.token_to_id(token)) else {
            return Err(EmbedderError::InvalidConfiguration {
                message: format!(
                    "tokenizer `{}` declares none of the pad tokens {PAD_TOKENS:?}",
                    tokenizer_path.display()
                ),
            });
        };

        let info = EmbedderInfo {
            provider: ProviderKind::OnnxSentence,
            embedding_model_id: config.embedding_model_id,
            dimension: config.dimension,
            text_repr_version: config.text_repr_version,
        };
        tracing::info!(
            model = %model_path.display(),
            dimension = info.dimension,
            token_type_ids = wants_token_type_ids,
            "sentence model loaded"
        );

        Ok(Self {
            info,
            session: Mutex::new(session),
            tokenizer,
            pad_id: i64::from(pad_id),
            max_input_length: config.max_input_length,
            wants_token_type_ids,
        })
    }

    fn tokenize(&self, texts: &[&str]) -> Result<Vec<Encoding>, EmbedderError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|err| provider_failure("tokenize inputs", err))?;
        if let Some(longest) = encodings.iter().map(Encoding::len).max() {
            if longest > self.max_input_length {
                return Err(EmbedderError::InputTooLong {
                    max_length: self.max_input_length,
                    actual_length: longest,
                });
            }
        }
        Ok(encodings)
    }

    fn pad(&self, encodings: &[Encoding]) -> TokenBatch {
        let seq_len = encodings.iter().map(Encoding::len).max().unwrap_or(0);
        let mut ids = Array2::from_elem((encodings.len(), seq_len), self.pad_id);
        let mut mask = Array2::zeros((encodings.len(), seq_len));
        for (row, encoding) in encodings.iter().enumerate() {
            for (col, (&id, &m)) in encoding.get_ids().iter().zip(encoding.get_attention_mask()).enumerate() {
                ids[(row, col)] = i64::from(id);
                mask[(row, col)] = i64::from(m);
            }
        }
        TokenBatch { ids, mask }
    }

    /// Run the model and mean-pool its first output.
    fn encode(&self, batch: &TokenBatch) -> Result<Vec<Vec<f32>>, EmbedderError> {
        let (rows, seq_len) = batch.ids.dim();
        let ids = Tensor::from_array(batch.ids.clone()).map_err(|err| provider_failure("prepare input_ids", err))?;
        let mask =
            Tensor::from_array(batch.mask.clone()).map_err(|err| provider_failure("prepare attention_mask", err))?;

        let mut session = self.session.lock().map_err(|_| EmbedderError::ProviderFailure {
            message: "ONNX session lock poisoned".into(),
        })?;
        let outputs = if self.wants_token_type_ids {
            let type_ids = Tensor::from_array(Array2::<i64>::zeros((rows, seq_len)))
                .map_err(|err| provider_failure("prepare token_type_ids", err))?;
            session.run(ort::inputs![ids, mask, type_ids])
        } else {
            session.run(ort::inputs![ids, mask])
        }
        .map_err(|err| provider_failure("run ONNX session", err))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|err| provider_failure("read token states", err))?;
        let dims: Vec<usize> = shape.iter().map(|&d| usize::try_from(d).unwrap_or(0)).collect();
        let [out_rows, out_seq, hidden] = dims[..] else {
            return Err(EmbedderError::ProviderFailure {
                message: format!("expected [batch, seq, hidden] token states, got {dims:?}"),
            });
        };
        if out_rows != rows || out_seq != seq_len {
            return Err(EmbedderError::ProviderFailure {
                message: format!("model returned [{out_rows}, {out_seq}, _] for a [{rows}, {seq_len}] batch"),
            });
        }
        if hidden != self.info.dimension {
            return Err(EmbedderError::ProviderFailure {
                message: format!("model hidden size {hidden} does not match dimension {}", self.info.dimension),
            });
        }

        let states = ArrayView3::from_shape((rows, seq_len, hidden), data)
            .map_err(|err| provider_failure("shape token states", err))?;
        Ok(mean_pool(states, &batch.mask))
    }
}

impl Embedder for OnnxSentenceEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut vectors = self.embed_batch(&[text])?;
        match (vectors.pop(), vectors.is_empty()) {
            (Some(vector), true) => Ok(vector),
            _ => Err(EmbedderError::ProviderFailure { message: "expected exactly one pooled vector".into() }),
        }
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let encodings = self.tokenize(texts)?;
        self.encode(&self.pad(&encodings))
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}

/// Average of the token states whose mask is 1; all zeros for a fully masked row.
fn mean_pool(states: ArrayView3<'_, f32>, mask: &Array2<i64>) -> Vec<Vec<f32>> {
    states
        .axis_iter(Axis(0))
        .zip(mask.axis_iter(Axis(0)))
        .map(|(tokens, row_mask)| {
            let mut sum = vec![0f32; tokens.ncols()];
            let mut count = 0usize;
            for (token, &m) in tokens.axis_iter(Axis(0)).zip(row_mask.iter()) {
                if m == 1 {
                    sum.iter_mut().zip(token.iter()).for_each(|(acc, v)| *acc += v);
                    count += 1;
                }
            }
            if count > 0 {
                sum.iter_mut().for_each(|v| *v /= count as f32);
            }
            sum
        })
        .collect()
}

/// Create the process-wide ONNX environment once; later calls must name the same library.
fn init_runtime(library: &Path) -> Result<(), EmbedderError> {
    let first = RUNTIME_LIBRARY.get_or_init(|| library.to_path_buf());
    if first != library {
        return Err(EmbedderError::InvalidConfiguration {
            message: format!(
                "ONNX Runtime already initialized with `{}`; cannot switch to `{}`",
                first.display(),
                library.display()
            ),
        });
    }
    ort::init_from(library.to_string_lossy().into_owned())
        .with_name("persona-digest")
        .commit()
        .map_err(|err| provider_failure("initialize ONNX Runtime", err))?;
    Ok(())
}

/// Canonical form of `path`, or a configuration error naming what is missing.
fn existing_file(path: &Path, what: &str) -> Result<PathBuf, EmbedderError> {
    path.canonicalize().map_err(|_| EmbedderError::InvalidConfiguration {
        message: format!("{what} `{}` does not exist", path.display()),
    })
}

fn provider_failure(context: &str, err: impl std::fmt::Display) -> EmbedderError {
    EmbedderError::ProviderFailure { message: format!("{context} failed: {err}") }
}
