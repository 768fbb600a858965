use std::path::Path;

use chrono::{DateTime, Utc};
use outline_extractor::clean_text_block;
use section_model::output::{format_timestamp, DigestMetadata, DigestOutput, ExtractedSection, SubsectionAnalysis};
use section_model::{Query, RankedSection, Section};

/// File name component of `pdf_path`, or the whole path when it has none.
pub fn document_name(pdf_path: &str) -> String {
    Path::new(pdf_path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pdf_path.to_string())
}

pub fn build_metadata(pdf_path: &str, query: &Query, at: DateTime<Utc>) -> DigestMetadata {
    DigestMetadata {
        input_documents: vec![pdf_path.to_string()],
        persona: query.persona.clone(),
        job: query.job.clone(),
        timestamp: format_timestamp(at),
    }
}

/// Per-document result record in rank order, with cleaned excerpts.
pub fn assemble_output(
    pdf_path: &str,
    query: &Query,
    sections: &[Section],
    ranked: &[RankedSection],
    max_excerpt_len: usize,
    at: DateTime<Utc>,
) -> DigestOutput {
    let document = document_name(pdf_path);
    let mut output = DigestOutput::empty(build_metadata(pdf_path, query, at));
    for r in ranked {
        let Some(section) = sections.get(r.section_index) else { continue };
        output.extracted_sections.push(ExtractedSection {
            document: document.clone(),
            page: section.page,
            section_title: section.title.clone(),
            importance_rank: r.rank,
        });
        output.subsection_analysis.push(SubsectionAnalysis {
            document: document.clone(),
            page: section.page,
            refined_text: clean_text_block(&section.content, max_excerpt_len),
        });
    }
    output
}
