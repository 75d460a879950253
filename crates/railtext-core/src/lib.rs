//! Core library for reading labeled fields from rail marking photos.
//!
//! This crate provides:
//! - Table-driven field extraction from OCR text (DATE, WELDER1, RAIL TYPE, ...)
//! - OCR backends behind a single `OcrEngine` trait (tesseract CLI, pure-onnx-ocr)
//! - Image preprocessing for chalk/paint marker text on metal
//! - Export of extraction records to JSON, CSV, XLSX, and plain text

pub mod error;
pub mod export;
pub mod fields;
pub mod models;
pub mod ocr;
pub mod pipeline;

pub use error::{RailTextError, Result};
pub use export::{ExportFormat, save_records, write_records};
pub use fields::{CaptureMode, ExtractionResult, FieldExtractor, FieldRule, FieldSpec};
pub use models::config::RailTextConfig;
pub use models::record::ExtractionRecord;
pub use ocr::{ImagePreprocessor, OcrBackend, OcrEngine, OcrResult, TextBox, create_engine};
pub use pipeline::RailTextPipeline;
