//! Configuration structures for the railtext pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ExtractionError;
use crate::export::ExportFormat;
use crate::fields::{FieldRule, FieldSpec};

/// Main configuration for the railtext pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RailTextConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Image preprocessing configuration.
    pub preprocessing: PreprocessConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Export configuration.
    pub export: ExportConfig,
}

/// Which OCR collaborator turns images into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrBackend {
    /// The `tesseract` command-line binary.
    #[default]
    Tesseract,
    /// pure-onnx-ocr with PaddleOCR models from `model_dir`.
    Onnx,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Backend to use.
    pub backend: OcrBackend,

    /// Path or name of the tesseract executable.
    pub tesseract_path: String,

    /// Tesseract language code.
    pub language: String,

    /// Tesseract OCR engine mode (`--oem`).
    pub oem: u8,

    /// Tesseract page segmentation mode (`--psm`).
    pub psm: u8,

    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,

    /// Keep `[UNK]` tokens emitted by the ONNX recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: OcrBackend::Tesseract,
            tesseract_path: "tesseract".to_string(),
            language: "eng".to_string(),
            oem: 3,
            psm: 6, // single uniform block of text
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
            keep_unk: false,
        }
    }
}

impl OcrConfig {
    /// Get full path to a model file.
    pub fn model_path(&self, model_name: &str) -> PathBuf {
        self.model_dir.join(model_name)
    }
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Run preprocessing before OCR.
    pub enabled: bool,

    /// Maximum image dimension (longer side); larger images are downscaled.
    pub max_image_size: u32,

    /// Neighbourhood size for adaptive thresholding (odd, >= 3).
    pub block_size: u32,

    /// Constant subtracted from the local mean.
    pub threshold_offset: i32,

    /// Produce white text on black (inverse binary).
    pub invert: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_image_size: 2048,
            block_size: 15,
            threshold_offset: 10,
            invert: true,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Rules appended after the built-in rail fields.
    pub extra_fields: Vec<FieldRule>,
}

impl ExtractionConfig {
    /// Built-in table plus `extra_fields`.
    pub fn field_spec(&self) -> Result<FieldSpec, ExtractionError> {
        FieldSpec::rail().with_extra_rules(self.extra_fields.iter().cloned())
    }
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Format used when none is given on the command line.
    pub default_format: ExportFormat,

    /// Worksheet name for XLSX output.
    pub sheet_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_format: ExportFormat::Json,
            sheet_name: "Rail Fields".to_string(),
        }
    }
}

impl RailTextConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
