//! Shared models used across crates

pub mod output;

use serde::{Deserialize, Serialize};

/// One character as reported by a PDF glyph provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphChar {
    pub ch: char,
    /// Distance from the top edge of the page to the glyph top, in points.
    pub top: f64,
    /// Font size in points.
    pub size: f64,
    pub font_name: String,
    /// 1-based page number.
    pub page: u32,
}

impl GlyphChar {
    pub fn new(ch: char, top: f64, size: f64, font_name: impl Into<String>, page: u32) -> Self {
        Self { ch, top, size, font_name: font_name.into(), page }
    }
}

/// Glyphs sharing a page and a rounded vertical position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Stable sequential position of this line within its document.
    pub index: usize,
    pub text: String,
    /// Arithmetic mean of the glyph sizes.
    pub font_size: f64,
    /// Font name of the first glyph.
    pub font_name: String,
    pub bold: bool,
    pub page: u32,
    /// Rounded vertical key the glyphs were grouped by.
    pub y: i64,
}

impl TextLine {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Heading tier, assigned by font-size rank within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingTier {
    Title,
    H1,
    H2,
    H3,
}

impl HeadingTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingTier::Title => "Title",
            HeadingTier::H1 => "H1",
            HeadingTier::H2 => "H2",
            HeadingTier::H3 => "H3",
        }
    }
}

impl std::fmt::Display for HeadingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A line flagged as a heading, referenced by its `TextLine::index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCandidate {
    pub line_index: usize,
    pub tier: HeadingTier,
}

/// A contiguous span of body text following one non-Title heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub tier: HeadingTier,
    pub page: u32,
    pub content: String,
}

impl Section {
    pub fn new(title: impl Into<String>, tier: HeadingTier, page: u32) -> Self {
        Self { title: title.into(), tier, page, content: String::new() }
    }

    /// Text that represents this section for embedding: `title. content`.
    pub fn embedding_text(&self) -> String {
        format!("{}. {}", self.title, self.content)
    }
}

/// Persona and job description used to steer ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub persona: String,
    pub job: String,
}

impl Query {
    pub fn new(persona: impl Into<String>, job: impl Into<String>) -> Self {
        Self { persona: persona.into(), job: job.into() }
    }

    /// `persona.trim() + ". " + job.trim()`
    pub fn text(&self) -> String {
        format!("{}. {}", self.persona.trim(), self.job.trim())
    }
}

/// A section position in the ranked view of one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedSection {
    /// Index into the document's section list.
    pub section_index: usize,
    /// 1-based importance rank.
    pub rank: usize,
    pub similarity: f32,
}
