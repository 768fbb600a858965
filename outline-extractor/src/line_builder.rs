//! Glyph → line grouping.

use std::collections::BTreeMap;

use section_model::{GlyphChar, TextLine};

/// Marker that flags a font name as bold.
pub const BOLD_MARKER: &str = "Bold";

/// Group glyphs sharing a page and a rounded `top` into lines.
///
/// Characters keep their original order inside a line. Lines come out sorted by
/// page, then by vertical key; lines whose trimmed text is empty are dropped.
/// Each surviving line gets a sequential `index` in that order.
pub fn build_lines(glyphs: &[GlyphChar]) -> Vec<TextLine> {
    let mut groups: BTreeMap<(u32, i64), Vec<&GlyphChar>> = BTreeMap::new();
    for glyph in glyphs {
        groups.entry((glyph.page, vertical_key(glyph.top))).or_default().push(glyph);
    }

    let mut lines = Vec::with_capacity(groups.len());
    for ((page, y), group) in groups {
        let raw: String = group.iter().map(|g| g.ch).collect();
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }
        let font_size = group.iter().map(|g| g.size).sum::<f64>() / group.len() as f64;
        let font_name = group[0].font_name.clone();
        lines.push(TextLine {
            index: lines.len(),
            text: text.to_string(),
            font_size,
            bold: font_name.contains(BOLD_MARKER),
            font_name,
            page,
            y,
        });
    }
    lines
}

/// Round half to even, so `2.5` and `1.5` both land on `2`.
pub fn vertical_key(top: f64) -> i64 {
    top.round_ties_even() as i64
}
