use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use digest_service::{
    BatchEvent, DigestConfig, DigestService, ServiceError, DEFAULT_EMBED_BATCH_SIZE, DEFAULT_TOP_N,
};
use embedding_provider::config::{default_hashing_config, default_sentence_config};
use embedding_provider::embedder::{Embedder, HashingEmbedder, OnnxSentenceEmbedder};
use outline_extractor::{default_backend, PdfBackend, DEFAULT_MAX_EXCERPT_LEN};

const DEFAULT_PERSONA: &str = "PhD Researcher in semantic plagiarism";
const DEFAULT_JOB: &str =
    "Prepare a comprehensive literature review focusing on methodologies, datasets, and performance benchmarks";

/// Input directories tried in order when `--input` is not given.
static INPUT_CANDIDATES: [&str; 3] = ["/app/input", "app/input", "./input"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EmbedderChoice {
    /// ONNX sentence-embedding model (all-MiniLM-L6-v2 by default)
    Onnx,
    /// Offline bag-of-words hashing
    Hashing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendChoice {
    Pdfium,
    Pure,
}

#[derive(Parser, Debug)]
#[command(name = "persona-digest", about = "Rank PDF sections by relevance to a persona and job")]
struct Cli {
    /// Reader persona
    #[arg(long, env = "DIGEST_PERSONA", default_value = DEFAULT_PERSONA)]
    persona: String,

    /// Job the persona wants done
    #[arg(long, env = "DIGEST_JOB", default_value = DEFAULT_JOB)]
    job: String,

    /// Directory holding the PDFs
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory receiving one JSON file per PDF (default: sibling `output` of the input dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_MAX_EXCERPT_LEN)]
    max_excerpt_len: usize,

    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Sections embedded per model call
    #[arg(long, default_value_t = DEFAULT_EMBED_BATCH_SIZE)]
    batch_size: usize,

    #[arg(long, value_enum, default_value_t = EmbedderChoice::Onnx)]
    embedder: EmbedderChoice,

    /// ONNX model file
    #[arg(long)]
    model: Option<PathBuf>,

    /// tokenizer.json
    #[arg(long)]
    tokenizer: Option<PathBuf>,

    /// ONNX Runtime shared library
    #[arg(long)]
    runtime: Option<PathBuf>,

    #[arg(long)]
    dim: Option<usize>,

    #[arg(long)]
    max_tokens: Option<usize>,

    /// PDF reader (default: pdfium when available)
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let (input_dir, output_dir) = resolve_dirs(cli.input.as_deref(), cli.output.as_deref())?;

    let mut cfg = DigestConfig::new(cli.persona.clone(), cli.job.clone(), input_dir, output_dir);
    cfg.max_excerpt_len = cli.max_excerpt_len;
    cfg.top_n = cli.top_n;
    cfg.embed_batch_size = cli.batch_size;
    cfg.pdf_backend = match cli.backend {
        Some(BackendChoice::Pdfium) => PdfBackend::Pdfium,
        Some(BackendChoice::Pure) => PdfBackend::PureRust,
        None => default_backend(),
    };

    // Loaded once for the whole batch.
    let embedder = build_embedder(&cli)?;
    let info = embedder.info();
    tracing::info!(
        model = %info.embedding_model_id,
        dimension = info.dimension,
        backend = cfg.pdf_backend.as_str(),
        input = %cfg.input_dir.display(),
        output = %cfg.output_dir.display(),
        "starting digest"
    );

    let service = DigestService::new(cfg, embedder);
    let summary = service.run_batch_with_progress(|event| match event {
        BatchEvent::Start { total } => tracing::info!(total, "found PDFs"),
        BatchEvent::Document { path, .. } => {
            let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
            println!("Processing PDF: {name}");
        }
        BatchEvent::Finished { .. } => {}
    })?;

    drop(service);
    if summary.skipped > 0 || summary.write_failures > 0 {
        tracing::warn!(
            skipped = summary.skipped,
            write_failures = summary.write_failures,
            "some documents produced no output"
        );
    }
    Ok(())
}

fn build_embedder(cli: &Cli) -> anyhow::Result<Box<dyn Embedder>> {
    match cli.embedder {
        EmbedderChoice::Onnx => {
            let mut cfg = default_sentence_config();
            if let Some(p) = &cli.model {
                cfg.model_path = p.clone();
            }
            if let Some(p) = &cli.tokenizer {
                cfg.tokenizer_path = p.clone();
            }
            if let Some(p) = &cli.runtime {
                cfg.runtime_library_path = p.clone();
            }
            if let Some(d) = cli.dim {
                cfg.dimension = d;
            }
            if let Some(m) = cli.max_tokens {
                cfg.max_input_length = m;
            }
            let embedder = OnnxSentenceEmbedder::new(cfg).context("embedder init failed")?;
            Ok(Box::new(embedder))
        }
        EmbedderChoice::Hashing => {
            let mut cfg = default_hashing_config();
            if let Some(d) = cli.dim {
                cfg.dimension = d;
            }
            let embedder = HashingEmbedder::new(cfg).context("embedder init failed")?;
            Ok(Box::new(embedder))
        }
    }
}

/// Pick the input directory and its output directory.
fn resolve_dirs(input: Option<&Path>, output: Option<&Path>) -> anyhow::Result<(PathBuf, PathBuf)> {
    let input_dir = match input {
        Some(dir) => dir.to_path_buf(),
        None => match INPUT_CANDIDATES.iter().map(Path::new).find(|p| p.is_dir()) {
            Some(dir) => dir.to_path_buf(),
            None => bail!(ServiceError::InputDirectoryNotFound { path: PathBuf::from(INPUT_CANDIDATES[2]) }),
        },
    };
    let output_dir = match output {
        Some(dir) => dir.to_path_buf(),
        None => input_dir
            .parent()
            .map(|parent| parent.join("output"))
            .unwrap_or_else(|| PathBuf::from("output")),
    };
    Ok((input_dir, output_dir))
}
