//! Typographic heading detection.
//!
//! A line is a heading candidate when its word count is within
//! [`MIN_HEADING_WORDS`]..=[`MAX_HEADING_WORDS`] and at least one of these fires:
//! its mean size equals a tier threshold, it is fully upper-case with 3 to 8 words,
//! it starts with an enumeration (`1`, `1.1`, `A`, `IV`), or it contains a
//! known section keyword. Font sizes are compared with exact equality.

use once_cell::sync::Lazy;
use regex::Regex;
use section_model::{HeadingCandidate, HeadingTier, TextLine};

use crate::font_stats::FontThresholds;

pub const MIN_HEADING_WORDS: usize = 3;
pub const MAX_HEADING_WORDS: usize = 12;
const MIN_UPPER_WORDS: usize = 3;
const MAX_UPPER_WORDS: usize = 8;

/// Section names that commonly open a part of a paper or report.
pub const KNOWN_SECTION_KEYWORDS: &[&str] = &[
    "introduction",
    "abstract",
    "related work",
    "background",
    "methods",
    "methodology",
    "materials and methods",
    "system architecture",
    "literature review",
    "experiments",
    "dataset",
    "datasets",
    "experimental results",
    "analysis",
    "results",
    "evaluation",
    "discussion",
    "conclusion",
    "summary",
    "references",
];

static ENUMERATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(\.\d+)*|[A-Z]|[IVXLC]+)\.?\s").expect("valid enumeration regex"));

/// Tier for `line` if it is a heading candidate.
pub fn classify_line(line: &TextLine, thresholds: &FontThresholds) -> Option<HeadingTier> {
    let words = line.word_count();
    if !(MIN_HEADING_WORDS..=MAX_HEADING_WORDS).contains(&words) {
        return None;
    }

    let size_tier = thresholds.tier_for(line.font_size);
    let fired = size_tier.is_some()
        || (is_upper_case(&line.text) && (MIN_UPPER_WORDS..=MAX_UPPER_WORDS).contains(&words))
        || starts_with_enumeration(&line.text)
        || contains_known_keyword(&line.text);

    if fired {
        Some(size_tier.unwrap_or(HeadingTier::H3))
    } else {
        None
    }
}

/// Heading candidates of a document, in line order.
pub fn classify_headings(lines: &[TextLine], thresholds: &FontThresholds) -> Vec<HeadingCandidate> {
    lines
        .iter()
        .filter_map(|line| {
            classify_line(line, thresholds).map(|tier| HeadingCandidate { line_index: line.index, tier })
        })
        .collect()
}

pub fn starts_with_enumeration(text: &str) -> bool {
    ENUMERATION_RE.is_match(text)
}

/// Lower-cased text with `:`, `.` and spaces trimmed contains a known keyword.
pub fn contains_known_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    let trimmed = lowered.trim_matches(|c| matches!(c, ':' | ' ' | '.'));
    KNOWN_SECTION_KEYWORDS.iter().any(|k| trimmed.contains(k))
}

/// At least one upper-case character and no lower-case or titlecase ones.
///
/// Case follows the Unicode `Uppercase` and `Lowercase` properties, so letters
/// such as `Ⅳ` count as upper-case and `ª` as lower-case. A titlecase digraph
/// like `ǅ` rejects the line.
pub fn is_upper_case(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() || is_titlecase(c) {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Titlecase letters are neither upper nor lower but change under both mappings.
fn is_titlecase(c: char) -> bool {
    !c.is_uppercase()
        && !c.is_lowercase()
        && c.to_uppercase().ne(std::iter::once(c))
        && c.to_lowercase().ne(std::iter::once(c))
}
