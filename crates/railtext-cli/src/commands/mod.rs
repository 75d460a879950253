//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod fields;
pub mod process;

use std::path::{Path, PathBuf};

use clap::{Args, ValueEnum};
use tracing::debug;

use railtext_core::models::config::{OcrBackend, RailTextConfig};
use railtext_core::ExportFormat;

/// Output format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
    /// Excel workbook (requires an output file)
    Xlsx,
    /// Raw OCR text
    Raw,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => ExportFormat::Json,
            OutputFormat::Csv => ExportFormat::Csv,
            OutputFormat::Text => ExportFormat::Text,
            OutputFormat::Xlsx => ExportFormat::Xlsx,
            OutputFormat::Raw => ExportFormat::Raw,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BackendArg {
    /// tesseract command-line binary
    Tesseract,
    /// pure-onnx-ocr with PaddleOCR models
    Onnx,
}

impl From<BackendArg> for OcrBackend {
    fn from(backend: BackendArg) -> Self {
        match backend {
            BackendArg::Tesseract => OcrBackend::Tesseract,
            BackendArg::Onnx => OcrBackend::Onnx,
        }
    }
}

/// OCR options shared by `process` and `batch`.
#[derive(Args)]
pub struct EngineArgs {
    /// OCR backend (overrides config)
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// Model directory for the onnx backend
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip image preprocessing
    #[arg(long)]
    no_preprocess: bool,
}

impl EngineArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut RailTextConfig) {
        if let Some(backend) = self.backend {
            config.ocr.backend = backend.into();
        }
        if let Some(dir) = &self.model_dir {
            config.ocr.model_dir = dir.clone();
        }
        if self.no_preprocess {
            config.preprocessing.enabled = false;
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("railtext")
        .join("config.json")
}

/// Load the config given with `--config`, else the default file if present,
/// else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RailTextConfig> {
    if let Some(path) = config_path {
        debug!("Loading config from {}", path);
        return Ok(RailTextConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        Ok(RailTextConfig::from_file(&default_path)?)
    } else {
        Ok(RailTextConfig::default())
    }
}
