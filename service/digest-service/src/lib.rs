pub mod output;
pub mod ranker;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use embedding_provider::{Embedder, EmbedderError};
use outline_extractor::{default_backend, extract_sections_from_pdf, PdfBackend, PdfError, DEFAULT_MAX_EXCERPT_LEN};
use section_model::output::DigestOutput;
use section_model::{Query, Section};

pub use ranker::{DEFAULT_EMBED_BATCH_SIZE, DEFAULT_TOP_N};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("input directory not found: {}", path.display())]
    InputDirectoryNotFound { path: PathBuf },
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub persona: String,
    pub job: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Character cap of each `refined_text` excerpt.
    pub max_excerpt_len: usize,
    /// Number of ranked sections reported per document.
    pub top_n: usize,
    /// Max number of sections to embed per batch.
    pub embed_batch_size: usize,
    pub pdf_backend: PdfBackend,
}

impl DigestConfig {
    pub fn new(
        persona: impl Into<String>,
        job: impl Into<String>,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            persona: persona.into(),
            job: job.into(),
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            max_excerpt_len: DEFAULT_MAX_EXCERPT_LEN,
            top_n: DEFAULT_TOP_N,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            pdf_backend: default_backend(),
        }
    }

    pub fn query(&self) -> Query {
        Query::new(self.persona.clone(), self.job.clone())
    }
}

/// Result of processing one document. Never aborts a batch.
#[derive(Debug)]
pub enum DocumentOutcome {
    /// At least one section was ranked.
    Ranked { output: DigestOutput },
    /// No sections: either none were found or the PDF could not be read.
    Empty { output: DigestOutput, parse_failure: Option<PdfError> },
    /// Embedding failed; nothing is written for this document.
    Skipped { error: EmbedderError },
}

impl DocumentOutcome {
    pub fn output(&self) -> Option<&DigestOutput> {
        match self {
            DocumentOutcome::Ranked { output } | DocumentOutcome::Empty { output, .. } => Some(output),
            DocumentOutcome::Skipped { .. } => None,
        }
    }
}

/// Counters reported at the end of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub ranked: usize,
    pub empty: usize,
    pub skipped: usize,
    pub write_failures: usize,
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent<'a> {
    Start { total: usize },
    Document { index: usize, total: usize, path: &'a Path },
    Finished { summary: BatchSummary },
}

/// Batch runner owning the one long-lived embedder.
///
/// The embedder is loaded by the caller before the service is built and is
/// released when the service is dropped or `into_embedder` hands it back.
pub struct DigestService<E: Embedder> {
    cfg: DigestConfig,
    embedder: E,
}

impl<E: Embedder> DigestService<E> {
    pub fn new(cfg: DigestConfig, embedder: E) -> Self {
        Self { cfg, embedder }
    }

    pub fn config(&self) -> &DigestConfig {
        &self.cfg
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn into_embedder(self) -> E {
        self.embedder
    }

    /// Rank already-extracted sections of `pdf_path` and build its output.
    pub fn process_sections(&self, pdf_path: &str, sections: &[Section]) -> DocumentOutcome {
        let query = self.cfg.query();
        if sections.is_empty() {
            let output = DigestOutput::empty(output::build_metadata(pdf_path, &query, Utc::now()));
            return DocumentOutcome::Empty { output, parse_failure: None };
        }

        match ranker::rank_sections(&self.embedder, &query, sections, self.cfg.top_n, self.cfg.embed_batch_size) {
            Ok(ranked) => {
                let output =
                    output::assemble_output(pdf_path, &query, sections, &ranked, self.cfg.max_excerpt_len, Utc::now());
                DocumentOutcome::Ranked { output }
            }
            Err(error) => DocumentOutcome::Skipped { error },
        }
    }

    /// Read, segment and rank one PDF. Parse failures degrade to an empty output.
    pub fn process_document(&self, pdf_path: &Path) -> DocumentOutcome {
        let path = pdf_path.to_string_lossy();
        match extract_sections_from_pdf(&path, self.cfg.pdf_backend) {
            Ok(sections) => {
                tracing::debug!(path = %path, sections = sections.len(), "sections extracted");
                self.process_sections(&path, &sections)
            }
            Err(err) => {
                let output = DigestOutput::empty(output::build_metadata(&path, &self.cfg.query(), Utc::now()));
                DocumentOutcome::Empty { output, parse_failure: Some(err) }
            }
        }
    }

    pub fn run_batch(&self) -> Result<BatchSummary, ServiceError> {
        self.run_batch_with_progress(|_| {})
    }

    /// Process every PDF in the input directory, writing one JSON file each.
    ///
    /// Only a missing input directory or an uncreatable output directory stop
    /// the run; per-document failures are logged and counted.
    pub fn run_batch_with_progress<F>(&self, mut on_event: F) -> Result<BatchSummary, ServiceError>
    where
        F: FnMut(BatchEvent<'_>),
    {
        let pdfs = discover_pdfs(&self.cfg.input_dir)?;
        fs::create_dir_all(&self.cfg.output_dir)
            .map_err(|source| ServiceError::Io { path: self.cfg.output_dir.clone(), source })?;

        let total = pdfs.len();
        on_event(BatchEvent::Start { total });
        let mut summary = BatchSummary::default();
        for (index, pdf) in pdfs.iter().enumerate() {
            on_event(BatchEvent::Document { index, total, path: pdf });
            tracing::info!(file = %pdf.display(), "processing PDF");

            let outcome = self.process_document(pdf);
            summary.processed += 1;
            match &outcome {
                DocumentOutcome::Ranked { output } => {
                    summary.ranked += 1;
                    tracing::debug!(file = %pdf.display(), sections = output.extracted_sections.len(), "ranked");
                }
                DocumentOutcome::Empty { parse_failure, .. } => {
                    summary.empty += 1;
                    if let Some(err) = parse_failure {
                        tracing::warn!(file = %pdf.display(), error = %err, "PDF could not be read; writing empty result");
                    }
                }
                DocumentOutcome::Skipped { error } => {
                    summary.skipped += 1;
                    tracing::warn!(file = %pdf.display(), error = %error, "embedding failed; skipping document");
                }
            }

            if let Some(output) = outcome.output() {
                let out_path = output_path_for(&self.cfg.output_dir, pdf);
                if let Err(err) = write_output(&out_path, output) {
                    summary.write_failures += 1;
                    tracing::warn!(file = %out_path.display(), error = %err, "failed to write result");
                }
            }
        }

        tracing::info!(
            processed = summary.processed,
            ranked = summary.ranked,
            empty = summary.empty,
            skipped = summary.skipped,
            write_failures = summary.write_failures,
            "batch finished"
        );
        on_event(BatchEvent::Finished { summary });
        Ok(summary)
    }
}

/// Files in `dir` with a case-insensitive `.pdf` extension, sorted by name.
pub fn discover_pdfs(dir: &Path) -> Result<Vec<PathBuf>, ServiceError> {
    if !dir.is_dir() {
        return Err(ServiceError::InputDirectoryNotFound { path: dir.to_path_buf() });
    }
    let entries = fs::read_dir(dir).map_err(|source| ServiceError::Io { path: dir.to_path_buf(), source })?;
    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_pdf(p))
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// `<output_dir>/<stem>.json`
pub fn output_path_for(output_dir: &Path, pdf: &Path) -> PathBuf {
    let mut name = pdf.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(".json");
    output_dir.join(name)
}

/// Pretty-printed JSON with two-space indentation; non-ASCII is kept as is.
pub fn write_output(path: &Path, output: &DigestOutput) -> Result<(), ServiceError> {
    let json = serde_json::to_string_pretty(output)?;
    fs::write(path, json).map_err(|source| ServiceError::Io { path: path.to_path_buf(), source })
}
