use section_model::{HeadingTier, TextLine};

/// Heading-tier font sizes of one document, largest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontThresholds {
    pub title: f64,
    pub h1: f64,
    pub h2: f64,
    pub h3: f64,
}

impl FontThresholds {
    /// Derive thresholds from the distinct line sizes of a single document.
    ///
    /// The four largest distinct sizes become Title/H1/H2/H3; with fewer than
    /// four, the smallest one is repeated. Returns `None` for a document
    /// without lines.
    pub fn from_lines(lines: &[TextLine]) -> Option<Self> {
        let mut sizes: Vec<f64> = lines.iter().map(|l| l.font_size).collect();
        sizes.sort_by(|a, b| b.total_cmp(a));
        sizes.dedup();
        let smallest = *sizes.last()?;
        while sizes.len() < 4 {
            sizes.push(smallest);
        }
        Some(Self { title: sizes[0], h1: sizes[1], h2: sizes[2], h3: sizes[3] })
    }

    /// Tier whose threshold equals `size` exactly, checked Title first.
    pub fn tier_for(&self, size: f64) -> Option<HeadingTier> {
        if size == self.title {
            Some(HeadingTier::Title)
        } else if size == self.h1 {
            Some(HeadingTier::H1)
        } else if size == self.h2 {
            Some(HeadingTier::H2)
        } else if size == self.h3 {
            Some(HeadingTier::H3)
        } else {
            None
        }
    }
}
