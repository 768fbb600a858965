pub mod reader_pdf;
#[cfg(feature = "pdfium")] pub mod reader_pdf_pdfium;
#[cfg(feature = "pure-pdf")] pub mod reader_pdf_pure;
pub mod line_builder;
pub mod font_stats;
pub mod heading_classifier;
pub mod section_assembler;
pub mod content_cleaner;

use section_model::{GlyphChar, HeadingCandidate, Section, TextLine};

pub use content_cleaner::{clean_text_block, DEFAULT_MAX_EXCERPT_LEN};
pub use font_stats::FontThresholds;
pub use reader_pdf::{default_backend, PdfBackend, PdfError};

/// Layout-derived structure of one document.
#[derive(Debug, Clone, Default)]
pub struct DocumentOutline {
    pub lines: Vec<TextLine>,
    pub thresholds: Option<FontThresholds>,
    pub headings: Vec<HeadingCandidate>,
    /// Sections in page, then vertical, order.
    pub sections: Vec<Section>,
}

/// Build lines, thresholds, headings and sections from one document's glyphs.
///
/// Thresholds are derived from these glyphs only.
pub fn outline_from_glyphs(glyphs: &[GlyphChar]) -> DocumentOutline {
    let lines = line_builder::build_lines(glyphs);
    let Some(thresholds) = FontThresholds::from_lines(&lines) else {
        return DocumentOutline { lines, ..Default::default() };
    };
    let headings = heading_classifier::classify_headings(&lines, &thresholds);
    let sections = section_assembler::assemble_sections(&lines, &headings);
    tracing::debug!(
        lines = lines.len(),
        headings = headings.len(),
        sections = sections.len(),
        title = thresholds.title,
        h1 = thresholds.h1,
        h2 = thresholds.h2,
        h3 = thresholds.h3,
        "document outline built"
    );
    DocumentOutline { lines, thresholds: Some(thresholds), headings, sections }
}

/// High-level: read PDF -> outline
pub fn extract_outline_from_pdf(path: &str, backend: PdfBackend) -> Result<DocumentOutline, PdfError> {
    let glyphs = reader_pdf::read_pdf_glyphs_with(path, backend)?;
    Ok(outline_from_glyphs(&glyphs))
}

pub fn extract_sections_from_pdf(path: &str, backend: PdfBackend) -> Result<Vec<Section>, PdfError> {
    extract_outline_from_pdf(path, backend).map(|outline| outline.sections)
}
