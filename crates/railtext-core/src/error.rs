//! Error types for the railtext-core library.

use thiserror::Error;

/// Main error type for the railtext library.
#[derive(Error, Debug)]
pub enum RailTextError {
    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field table error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input file type is neither an image nor recognized text.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
}

/// Errors related to OCR processing.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The configured OCR engine is not installed or not reachable.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Scratch file handling around the engine failed.
    #[error("OCR I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Errors raised while building a field table.
///
/// Extraction itself never fails; these only come from user-supplied rules.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A rule is structurally invalid (empty name or label).
    #[error("invalid rule for {field}: {reason}")]
    InvalidRule { field: String, reason: String },

    /// Two rules share the same field name.
    #[error("duplicate field name: {0}")]
    DuplicateField(String),

    /// The generated pattern failed to compile.
    #[error("pattern for {field} failed to compile: {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors related to writing extraction records.
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet writer error.
    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// I/O error while writing output.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the railtext library.
pub type Result<T> = std::result::Result<T, RailTextError>;
