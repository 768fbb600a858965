//! JSON records written once per input document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout of the `metadata.timestamp` field (UTC, microseconds, no offset).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestMetadata {
    pub input_documents: Vec<String>,
    pub persona: String,
    pub job: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSection {
    pub document: String,
    pub page: u32,
    pub section_title: String,
    pub importance_rank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsectionAnalysis {
    pub document: String,
    pub page: u32,
    pub refined_text: String,
}

/// Per-document result; `extracted_sections` and `subsection_analysis` are index-aligned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestOutput {
    pub metadata: DigestMetadata,
    pub extracted_sections: Vec<ExtractedSection>,
    pub subsection_analysis: Vec<SubsectionAnalysis>,
}

impl DigestOutput {
    /// Output carrying metadata only, used when a document yields no sections.
    pub fn empty(metadata: DigestMetadata) -> Self {
        Self { metadata, extracted_sections: Vec::new(), subsection_analysis: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.extracted_sections.is_empty()
    }
}
