//! OCR collaborators: anything that turns an image into text.

mod preprocessing;
#[cfg(feature = "native")]
mod pure_engine;
mod tesseract;

pub use preprocessing::ImagePreprocessor;
#[cfg(feature = "native")]
pub use pure_engine::PureOcrEngine;
pub use tesseract::TesseractEngine;

pub use crate::models::config::OcrBackend;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::OcrError;
use crate::models::config::OcrConfig;

/// An OCR engine: given an image, return the recognized text.
pub trait OcrEngine {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Recognize text in `image`.
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError>;

    /// Convenience: extract text only.
    fn extract_text(&self, image: &DynamicImage) -> Result<String, OcrError> {
        Ok(self.recognize(image)?.text)
    }
}

/// Build the engine selected in `config`.
pub fn create_engine(config: &OcrConfig) -> Result<Box<dyn OcrEngine>, OcrError> {
    debug!("Creating {:?} OCR engine", config.backend);
    match config.backend {
        OcrBackend::Tesseract => Ok(Box::new(TesseractEngine::from_config(config))),
        #[cfg(feature = "native")]
        OcrBackend::Onnx => Ok(Box::new(PureOcrEngine::from_config(config)?)),
        #[cfg(not(feature = "native"))]
        OcrBackend::Onnx => Err(OcrError::EngineUnavailable(
            "railtext-core was built without the `native` feature".to_string(),
        )),
    }
}

/// Vertical distance within which two boxes count as the same line.
const LINE_TOLERANCE_PX: f32 = 20.0;

/// One recognized text region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Corner points, clockwise from the top-left.
    pub corners: [(f32, f32); 4],

    pub text: String,
}

impl TextBox {
    /// Axis-aligned bounds as `(left, top, right, bottom)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        self.corners.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(left, top, right, bottom), &(x, y)| {
                (left.min(x), top.min(y), right.max(x), bottom.max(y))
            },
        )
    }
}

/// What an engine saw in one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Detected regions; empty for engines that only return text.
    pub boxes: Vec<TextBox>,

    /// Recognized text, one marking line per text line.
    pub text: String,

    pub processing_time_ms: u64,

    /// (width, height) of the image given to the engine.
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Build a result from unordered boxes: group them into lines top to
    /// bottom, order each line left to right, and join the text.
    pub fn from_boxes(mut boxes: Vec<TextBox>, image_size: (u32, u32)) -> Self {
        boxes.sort_by(|a, b| a.bounds().1.total_cmp(&b.bounds().1));

        let mut lines: Vec<Vec<TextBox>> = Vec::new();
        for text_box in boxes {
            let top = text_box.bounds().1;
            match lines.last_mut() {
                Some(line) if top - line[0].bounds().1 <= LINE_TOLERANCE_PX => line.push(text_box),
                _ => lines.push(vec![text_box]),
            }
        }

        let mut text = String::new();
        let mut ordered = Vec::new();
        for mut line in lines {
            line.sort_by(|a, b| a.bounds().0.total_cmp(&b.bounds().0));
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(
                &line
                    .iter()
                    .map(|b| b.text.trim())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join(" "),
            );
            ordered.extend(line);
        }

        Self {
            boxes: ordered,
            text,
            processing_time_ms: 0,
            image_size,
        }
    }
}
