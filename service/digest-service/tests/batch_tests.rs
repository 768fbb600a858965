use std::fs;
use std::path::Path;

use digest_service::{
    discover_pdfs, output_path_for, BatchEvent, BatchSummary, DigestConfig, DigestService, DocumentOutcome,
    ServiceError,
};
use embedding_provider::config::default_hashing_config;
use embedding_provider::embedder::{Embedder, EmbedderError, EmbedderInfo, HashingEmbedder, ProviderKind};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use outline_extractor::{default_backend, PdfBackend};
use serde_json::Value;

const METHODS_BODY: &str =
    "The methodology details compare cosine similarity thresholds across several datasets and paraphrase methods";

fn text_line(font: &str, size: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Integer(72), Object::Integer(y)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

/// One page: an 18pt title, a 14pt numbered heading and a 10pt body line.
fn write_paper(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    });

    let mut ops = text_line("F1", 18, 720, "Semantic Plagiarism Detection Survey");
    ops.extend(text_line("F1", 14, 680, "2. Methodology and Data"));
    ops.extend(text_line("F1", 10, 650, METHODS_BODY));
    let content = Content { operations: ops };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "Contents" => Object::Reference(content_id),
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(vec![Object::Reference(page_id)]),
            "Count" => Object::Integer(1),
            "Resources" => Object::Reference(resources_id),
            "MediaBox" => Object::Array([0, 0, 612, 792].into_iter().map(Object::Integer).collect()),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.save(path).unwrap();
}

fn config(input: &Path, output: &Path) -> DigestConfig {
    let mut cfg = DigestConfig::new("Methods reviewer", "find methodology details", input, output);
    cfg.pdf_backend = PdfBackend::PureRust;
    cfg
}

fn hashing() -> HashingEmbedder {
    HashingEmbedder::new(default_hashing_config()).unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn batch_writes_one_result_per_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    let output = dir.path().join("output");
    fs::create_dir_all(&input).unwrap();
    write_paper(&input.join("paper.pdf"));
    fs::write(input.join("a.PDF"), b"not really a pdf").unwrap();
    fs::write(input.join("notes.txt"), b"ignored").unwrap();

    let service = DigestService::new(config(&input, &output), hashing());
    let mut seen = Vec::new();
    let summary = service
        .run_batch_with_progress(|event| {
            if let BatchEvent::Document { path, .. } = event {
                seen.push(path.file_name().unwrap().to_string_lossy().into_owned());
            }
        })
        .unwrap();

    assert_eq!(seen, vec!["a.PDF", "paper.pdf"]);
    assert_eq!(
        summary,
        BatchSummary { processed: 2, ranked: 1, empty: 1, skipped: 0, write_failures: 0 }
    );

    let broken = read_json(&output.join("a.json"));
    assert_eq!(broken["extracted_sections"], Value::Array(vec![]));
    assert_eq!(broken["subsection_analysis"], Value::Array(vec![]));
    assert_eq!(broken["metadata"]["persona"], "Methods reviewer");

    let paper = read_json(&output.join("paper.json"));
    let extracted = paper["extracted_sections"].as_array().unwrap();
    assert_eq!(extracted.len(), 1);
    assert_eq!(extracted[0]["document"], "paper.pdf");
    assert_eq!(extracted[0]["section_title"], "2. Methodology and Data");
    assert_eq!(extracted[0]["page"], 1);
    assert_eq!(extracted[0]["importance_rank"], 1);
    assert_eq!(paper["subsection_analysis"][0]["refined_text"], METHODS_BODY);
    assert_eq!(
        paper["metadata"]["input_documents"][0],
        input.join("paper.pdf").to_string_lossy().into_owned()
    );
    assert!(!output.join("notes.json").exists());
}

#[test]
fn missing_input_directory_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let service = DigestService::new(config(&dir.path().join("nope"), &dir.path().join("out")), hashing());
    let err = service.run_batch().unwrap_err();
    assert!(matches!(err, ServiceError::InputDirectoryNotFound { .. }), "{err:?}");
    assert!(!dir.path().join("out").exists());
}

#[test]
fn empty_input_directory_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    fs::create_dir_all(&input).unwrap();
    let service = DigestService::new(config(&input, &dir.path().join("out")), hashing());
    assert_eq!(service.run_batch().unwrap(), BatchSummary::default());
    assert!(dir.path().join("out").is_dir());
}

struct BrokenModel(EmbedderInfo);

impl Embedder for BrokenModel {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedderError> {
        Err(EmbedderError::ProviderFailure { message: "session lost".into() })
    }

    fn embed_batch(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        Err(EmbedderError::ProviderFailure { message: "session lost".into() })
    }

    fn info(&self) -> &EmbedderInfo {
        &self.0
    }
}

#[test]
fn embedding_failure_writes_nothing_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    let output = dir.path().join("output");
    fs::create_dir_all(&input).unwrap();
    write_paper(&input.join("b.pdf"));
    write_paper(&input.join("c.pdf"));

    let info = EmbedderInfo {
        provider: ProviderKind::Hashing,
        embedding_model_id: "broken".into(),
        dimension: 4,
        text_repr_version: "v1".into(),
    };
    let service = DigestService::new(config(&input, &output), BrokenModel(info));
    let summary = service.run_batch().unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.skipped, 2);
    assert!(!output.join("b.json").exists());
    assert!(!output.join("c.json").exists());
}

#[test]
fn discovery_is_sorted_and_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["z.pdf", "B.Pdf", "a.PDF", "readme.md"] {
        fs::write(dir.path().join(name), b"x").unwrap();
    }
    fs::create_dir(dir.path().join("folder.pdf")).unwrap();

    let found: Vec<String> = discover_pdfs(dir.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(found, vec!["B.Pdf", "a.PDF", "z.pdf"]);
}

#[test]
fn output_name_replaces_only_the_pdf_extension() {
    let out = Path::new("out");
    assert_eq!(output_path_for(out, Path::new("in/paper.v2.pdf")), out.join("paper.v2.json"));
    assert_eq!(output_path_for(out, Path::new("in/Report.PDF")), out.join("Report.json"));
}

#[test]
fn default_backend_ranks_valid_pdfs_with_or_without_pdfium() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.pdf");
    let second = dir.path().join("second.pdf");
    write_paper(&first);
    write_paper(&second);

    let cfg = DigestConfig::new("Methods reviewer", "find methodology details", dir.path(), dir.path().join("out"));
    assert_eq!(cfg.pdf_backend, default_backend());
    let service = DigestService::new(cfg, hashing());
    // The second document reuses whatever binding the first one made.
    for pdf in [&first, &second] {
        match service.process_document(pdf) {
            DocumentOutcome::Ranked { output } => {
                assert_eq!(output.extracted_sections[0].section_title, "2. Methodology and Data");
            }
            other => panic!("expected a ranked document, got {other:?}"),
        }
    }
}
