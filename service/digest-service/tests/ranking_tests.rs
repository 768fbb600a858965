use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use digest_service::output::{assemble_output, document_name};
use digest_service::ranker::{order_by_similarity, rank_sections};
use digest_service::{DigestConfig, DigestService, DocumentOutcome};
use embedding_provider::embedder::{Embedder, EmbedderError, EmbedderInfo, HashingConfig, HashingEmbedder, ProviderKind};
use section_model::{HeadingTier, Query, Section};

fn hashing() -> HashingEmbedder {
    HashingEmbedder::new(HashingConfig {
        dimension: 1024,
        max_input_length: 1 << 20,
        embedding_model_id: "test-hashing".into(),
        text_repr_version: "v1".into(),
    })
    .unwrap()
}

fn section(title: &str, page: u32, content: &str) -> Section {
    let mut s = Section::new(title, HeadingTier::H1, page);
    s.content = content.into();
    s
}

fn paper_sections() -> Vec<Section> {
    vec![
        section(
            "1. Introduction and Motivation",
            1,
            "Plagiarism detection has been studied for decades across many domains and languages",
        ),
        section(
            "2. Methodology and Data",
            2,
            "The methodology details compare cosine similarity thresholds across several datasets and paraphrase methods",
        ),
    ]
}

/// Returns the same vector for every input and counts calls.
struct ConstantEmbedder {
    info: EmbedderInfo,
    calls: AtomicUsize,
}

impl ConstantEmbedder {
    fn new() -> Self {
        Self {
            info: EmbedderInfo {
                provider: ProviderKind::Hashing,
                embedding_model_id: "constant".into(),
                dimension: 2,
                text_repr_version: "v1".into(),
            },
            calls: AtomicUsize::new(0),
        }
    }
}

impl Embedder for ConstantEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![1.0, 1.0])
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|_| vec![1.0, 1.0]).collect())
    }

    fn info(&self) -> &EmbedderInfo {
        &self.info
    }
}

struct FailingEmbedder(EmbedderInfo);

impl Embedder for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedderError> {
        Err(EmbedderError::ProviderFailure { message: "model crashed".into() })
    }

    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        Err(EmbedderError::ProviderFailure { message: "model crashed".into() })
    }

    fn info(&self) -> &EmbedderInfo {
        &self.0
    }
}

#[test]
fn methodology_section_outranks_introduction() {
    let query = Query::new("Methods reviewer", "find methodology details");
    let sections = paper_sections();
    let ranked = rank_sections(&hashing(), &query, &sections, 5, 16).unwrap();

    assert_eq!(ranked.len(), 2);
    assert_eq!(sections[ranked[0].section_index].title, "2. Methodology and Data");
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[1].rank, 2);
    assert!(ranked[0].similarity > ranked[1].similarity);
}

#[test]
fn ranking_is_deterministic_and_leaves_sections_in_order() {
    let query = Query::new("Methods reviewer", "find methodology details");
    let sections = paper_sections();
    let before = sections.clone();
    let embedder = hashing();

    let first = rank_sections(&embedder, &query, &sections, 5, 1).unwrap();
    let second = rank_sections(&embedder, &query, &sections, 5, 16).unwrap();
    assert_eq!(first, second);
    assert_eq!(sections, before);
}

#[test]
fn ties_keep_document_order() {
    assert_eq!(order_by_similarity(&[0.5, 0.9, 0.5, 0.9, 0.1]), vec![1, 3, 0, 2, 4]);

    let sections: Vec<Section> = (0..4).map(|i| section(&format!("Section number {i}"), 1, "same")).collect();
    let ranked = rank_sections(&ConstantEmbedder::new(), &Query::new("p", "j"), &sections, 5, 16).unwrap();
    let order: Vec<usize> = ranked.iter().map(|r| r.section_index).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);
}

#[test]
fn nan_scores_sort_last_without_panicking() {
    let scores: Vec<f32> = (0..64).map(|i| if i % 5 == 0 { f32::NAN } else { (i % 7) as f32 / 7.0 }).collect();
    let order = order_by_similarity(&scores);

    assert_eq!(order.len(), 64);
    let (finite, nan): (Vec<usize>, Vec<usize>) = order.iter().partition(|&&i| !scores[i].is_nan());
    assert_eq!(&order[..finite.len()], finite.as_slice());
    assert!(finite.windows(2).all(|w| {
        scores[w[0]] > scores[w[1]] || (scores[w[0]] == scores[w[1]] && w[0] < w[1])
    }));
    assert_eq!(nan, (0..64).step_by(5).collect::<Vec<_>>());
}

#[test]
fn negative_zero_ties_with_zero() {
    assert_eq!(order_by_similarity(&[-0.0, 0.0, -0.0]), vec![0, 1, 2]);
}

/// Emits NaN vectors for sections whose text mentions "corrupt".
struct NanEmbedder(EmbedderInfo);

impl Embedder for NanEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        if text.contains("corrupt") {
            Ok(vec![f32::NAN, f32::NAN])
        } else {
            Ok(vec![1.0, text.len() as f32 / 100.0])
        }
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn info(&self) -> &EmbedderInfo {
        &self.0
    }
}

#[test]
fn nan_embeddings_rank_last_in_a_large_document() {
    let info = EmbedderInfo {
        provider: ProviderKind::Hashing,
        embedding_model_id: "nan".into(),
        dimension: 2,
        text_repr_version: "v1".into(),
    };
    let sections: Vec<Section> = (0..30)
        .map(|i| {
            let body = if i % 4 == 0 { "corrupt".to_string() } else { "x".repeat(i as usize) };
            section(&format!("Part {i} heading"), 1, &body)
        })
        .collect();
    let ranked = rank_sections(&NanEmbedder(info), &Query::new("p", "j"), &sections, 30, 16).unwrap();

    assert_eq!(ranked.len(), 30);
    let tail: Vec<usize> = ranked[ranked.len() - 8..].iter().map(|r| r.section_index).collect();
    assert_eq!(tail, vec![0, 4, 8, 12, 16, 20, 24, 28]);
    assert!(ranked[..22].iter().all(|r| !r.similarity.is_nan()));
}

#[test]
fn top_n_caps_results_and_ranks_start_at_one() {
    let sections: Vec<Section> = (0..7).map(|i| section(&format!("Part {i} heading"), i + 1, "text")).collect();
    let ranked = rank_sections(&hashing(), &Query::new("p", "j"), &sections, 5, 3).unwrap();
    assert_eq!(ranked.len(), 5);
    let ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
}

#[test]
fn no_sections_means_no_embedding_calls() {
    let embedder = ConstantEmbedder::new();
    let ranked = rank_sections(&embedder, &Query::new("p", "j"), &[], 5, 16).unwrap();
    assert!(ranked.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn sections_are_embedded_in_batches() {
    let embedder = ConstantEmbedder::new();
    let sections: Vec<Section> = (0..5).map(|i| section(&format!("Part {i} heading"), 1, "text")).collect();
    rank_sections(&embedder, &Query::new("p", "j"), &sections, 5, 2).unwrap();
    // one query call plus ceil(5 / 2) batch calls
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 4);
}

#[test]
fn output_is_index_aligned_and_cleaned() {
    let query = Query::new("Methods reviewer", "find methodology details");
    let mut sections = paper_sections();
    sections[0].content = format!("{} © 2021 Some Publisher 12", "x".repeat(600));
    let ranked = rank_sections(&hashing(), &query, &sections, 5, 16).unwrap();
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

    let output = assemble_output("input/papers/survey.pdf", &query, &sections, &ranked, 400, at);
    assert_eq!(output.metadata.input_documents, vec!["input/papers/survey.pdf".to_string()]);
    assert_eq!(output.metadata.persona, "Methods reviewer");
    assert_eq!(output.metadata.job, "find methodology details");
    assert_eq!(output.metadata.timestamp, "2025-01-02T03:04:05.000000");

    assert_eq!(output.extracted_sections.len(), output.subsection_analysis.len());
    for (i, (extracted, analysis)) in output.extracted_sections.iter().zip(&output.subsection_analysis).enumerate() {
        assert_eq!(extracted.importance_rank, i + 1);
        assert_eq!(extracted.document, "survey.pdf");
        assert_eq!(extracted.document, analysis.document);
        assert_eq!(extracted.page, analysis.page);
        assert!(analysis.refined_text.chars().count() <= 400);
        assert!(!analysis.refined_text.contains('©'));
    }
    assert_eq!(output.extracted_sections[0].section_title, "2. Methodology and Data");
}

#[test]
fn document_name_is_the_file_name() {
    assert_eq!(document_name("input/a/b.pdf"), "b.pdf");
    assert_eq!(document_name("b.pdf"), "b.pdf");
}

#[test]
fn embedding_failure_skips_the_document() {
    let cfg = DigestConfig::new("p", "j", "in", "out");
    let info = EmbedderInfo {
        provider: ProviderKind::Hashing,
        embedding_model_id: "failing".into(),
        dimension: 2,
        text_repr_version: "v1".into(),
    };
    let service = DigestService::new(cfg, FailingEmbedder(info));
    match service.process_sections("in/a.pdf", &paper_sections()) {
        DocumentOutcome::Skipped { error } => {
            assert!(matches!(error, EmbedderError::ProviderFailure { .. }));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn empty_section_list_gives_empty_output() {
    let cfg = DigestConfig::new("p", "j", "in", "out");
    let service = DigestService::new(cfg, ConstantEmbedder::new());
    let outcome = service.process_sections("in/a.pdf", &[]);
    let DocumentOutcome::Empty { output, parse_failure } = outcome else {
        panic!("expected empty outcome");
    };
    assert!(parse_failure.is_none());
    assert!(output.extracted_sections.is_empty());
    assert!(output.subsection_analysis.is_empty());
    assert_eq!(service.embedder().calls.load(Ordering::SeqCst), 0);
}
