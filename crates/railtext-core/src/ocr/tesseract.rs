//! OCR through the `tesseract` command-line binary.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{OcrEngine, OcrResult};

/// OCR engine that shells out to `tesseract <image> stdout`.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    language: String,
    oem: u8,
    psm: u8,
    /// Where the PNG handed to tesseract is written; system temp dir if unset.
    scratch_dir: Option<PathBuf>,
}

impl TesseractEngine {
    /// Engine with the default binary, `eng`, `--oem 3 --psm 6`.
    pub fn new() -> Self {
        Self::from_config(&OcrConfig::default())
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            binary: config.tesseract_path.clone(),
            language: config.language.clone(),
            oem: config.oem,
            psm: config.psm,
            scratch_dir: None,
        }
    }

    /// Use a different executable.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Check whether the executable can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn args(&self, image_path: &Path) -> Vec<OsString> {
        vec![
            image_path.as_os_str().to_owned(),
            "stdout".into(),
            "-l".into(),
            self.language.clone().into(),
            "--oem".into(),
            self.oem.to_string().into(),
            "--psm".into(),
            self.psm.to_string().into(),
        ]
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        info!("Running tesseract on {}x{} image", width, height);

        let mut builder = tempfile::Builder::new();
        builder.prefix("railtext-").suffix(".png");
        let mut tmp = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .map_err(|e| OcrError::InvalidImage(format!("failed to encode image: {}", e)))?;

        let args = self.args(tmp.path());
        debug!("{} {:?}", self.binary, args);

        let output = Command::new(&self.binary).args(&args).output().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                OcrError::EngineUnavailable(format!("'{}' not found (is tesseract installed?)", self.binary))
            } else {
                OcrError::EngineUnavailable(format!("failed to run '{}': {}", self.binary, e))
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Recognition(format!(
                "tesseract failed: {}",
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "OCR complete: {} chars in {}ms",
            text.len(),
            processing_time_ms
        );

        Ok(OcrResult {
            boxes: Vec::new(),
            text,
            processing_time_ms,
            image_size: (width, height),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn test_args_follow_config() {
        let config = OcrConfig {
            language: "deu".to_string(),
            psm: 4,
            ..OcrConfig::default()
        };
        let engine = TesseractEngine::from_config(&config);
        let args: Vec<String> = engine
            .args(Path::new("/tmp/plate.png"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(
            args,
            vec!["/tmp/plate.png", "stdout", "-l", "deu", "--oem", "3", "--psm", "4"]
        );
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let engine = TesseractEngine::new().with_binary("railtext-no-such-tesseract");
        assert!(!engine.is_available());

        let image = DynamicImage::ImageLuma8(GrayImage::new(8, 8));
        let err = engine.recognize(&image).unwrap_err();
        assert!(matches!(err, OcrError::EngineUnavailable(_)));
    }

    #[test]
    fn test_unwritable_scratch_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = TesseractEngine::new()
            .with_binary("railtext-no-such-tesseract")
            .with_scratch_dir(dir.path().join("missing"));

        let image = DynamicImage::ImageLuma8(GrayImage::new(8, 8));
        let err = engine.recognize(&image).unwrap_err();
        assert!(matches!(err, OcrError::Io(_)));
    }
}
