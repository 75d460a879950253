//! Field extraction from OCR text.
//!
//! The field table is data: each [`FieldRule`] names a field, the label it is
//! printed under, and how its value is captured. [`FieldExtractor`] runs the
//! compiled table over a block of text and returns an [`ExtractionResult`]
//! with one entry per field.

mod extractor;
pub mod patterns;
mod result;
mod spec;

pub use extractor::{FieldExtractor, extract_fields};
pub use patterns::{CaptureMode, FieldRule, default_rules};
pub use result::ExtractionResult;
pub use spec::{CompiledField, FieldSpec};
