//! One processed input, ready for display or export.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::fields::ExtractionResult;

/// Source, raw OCR text, and extracted fields of one image.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRecord {
    /// Input file name or other identifier of the image.
    pub source: String,

    /// When the record was produced.
    pub processed_at: DateTime<Utc>,

    /// Text returned by the OCR engine.
    #[serde(skip)]
    pub raw_text: String,

    /// Extracted fields.
    pub fields: ExtractionResult,
}

impl ExtractionRecord {
    pub fn new(source: impl Into<String>, raw_text: impl Into<String>, fields: ExtractionResult) -> Self {
        Self {
            source: source.into(),
            processed_at: Utc::now(),
            raw_text: raw_text.into(),
            fields,
        }
    }

    /// Override the processing timestamp.
    pub fn with_timestamp(mut self, processed_at: DateTime<Utc>) -> Self {
        self.processed_at = processed_at;
        self
    }
}
