use std::collections::HashMap;

use section_model::{HeadingCandidate, HeadingTier, Section, TextLine};

/// Body lines smaller than this are treated as artifacts and skipped.
pub const MIN_BODY_FONT_SIZE: f64 = 7.0;

/// Walk `lines` in document order, opening a section at every non-Title heading.
///
/// A heading closes the open section. A Title heading opens nothing, so body
/// lines after it are dropped until the next non-Title heading. Headings are
/// matched to lines by `TextLine::index`; when several candidates share an
/// index the first one wins.
pub fn assemble_sections(lines: &[TextLine], candidates: &[HeadingCandidate]) -> Vec<Section> {
    let mut tiers: HashMap<usize, HeadingTier> = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        tiers.entry(candidate.line_index).or_insert(candidate.tier);
    }

    let mut sections = Vec::new();
    let mut current: Option<Section> = None;
    for line in lines {
        if let Some(&tier) = tiers.get(&line.index) {
            if let Some(done) = current.take() {
                sections.push(finish(done));
            }
            if tier != HeadingTier::Title {
                current = Some(Section::new(line.text.clone(), tier, line.page));
            }
            continue;
        }

        if let Some(section) = current.as_mut() {
            let text = line.text.trim();
            if line.font_size >= MIN_BODY_FONT_SIZE && !text.is_empty() {
                section.content.push_str(text);
                section.content.push(' ');
            }
        }
    }
    if let Some(done) = current {
        sections.push(finish(done));
    }
    sections
}

fn finish(mut section: Section) -> Section {
    let trimmed_len = section.content.trim_end().len();
    section.content.truncate(trimmed_len);
    section
}
