//! Table-driven field extractor.

use tracing::{debug, trace};

use super::result::ExtractionResult;
use super::spec::FieldSpec;

/// Extracts labeled fields from OCR text.
///
/// Stateless apart from its compiled table; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    spec: FieldSpec,
}

impl FieldExtractor {
    /// Extractor over the built-in rail marking table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor over a custom table.
    pub fn with_spec(spec: FieldSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Extract every field of the table from `text`.
    ///
    /// Fields are searched independently and in table order; for each one the
    /// left-most match wins. Fields without a match map to `None`.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        let mut result = ExtractionResult::with_capacity(self.spec.len());

        for field in self.spec.fields() {
            let value = field.find(text);
            match &value {
                Some(v) => debug!("Matched {} = {:?}", field.name(), v),
                None => trace!("No match for {}", field.name()),
            }
            result.push(field.name(), value);
        }

        debug!(
            "Extracted {}/{} fields from {} chars",
            result.found_count(),
            result.len(),
            text.len()
        );

        result
    }
}

/// Extract the built-in rail fields from `text`.
pub fn extract_fields(text: &str) -> ExtractionResult {
    FieldExtractor::new().extract(text)
}
