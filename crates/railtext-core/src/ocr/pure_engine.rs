//! ONNX backend: PaddleOCR detection and recognition models run by `pure-onnx-ocr`.

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::OcrConfig;

use super::{OcrEngine, OcrResult, TextBox};

/// Engine loaded from a model directory; needs no system libraries.
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl PureOcrEngine {
    /// Create an engine from the model files named in `config`.
    pub fn from_config(config: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = config.model_path(&config.detection_model);
        let rec_path = config.model_path(&config.recognition_model);
        let dict_path = config.model_path(&config.dictionary);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "model file not found: {}",
                    path.display()
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("Loaded pure-onnx-ocr engine from {}", config.model_dir.display());

        Ok(Self {
            engine,
            keep_unk: config.keep_unk,
        })
    }

    /// Blank out characters missing from the dictionary.
    fn clean(&self, text: &str) -> String {
        if self.keep_unk {
            text.to_string()
        } else {
            text.replace("[UNK]", " ")
        }
    }
}

impl OcrEngine for PureOcrEngine {
    fn name(&self) -> &str {
        "onnx"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        debug!("Running onnx OCR on {}x{} image", width, height);

        let regions = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let boxes = regions
            .iter()
            .map(|region| TextBox {
                corners: corners(&region.bounding_box),
                text: self.clean(&region.text),
            })
            .collect();

        let mut result = OcrResult::from_boxes(boxes, (width, height));
        result.processing_time_ms = start.elapsed().as_millis() as u64;
        info!(
            "onnx OCR found {} regions in {}ms",
            result.boxes.len(),
            result.processing_time_ms
        );

        Ok(result)
    }
}

/// First four exterior points of a detection polygon.
fn corners(polygon: &pure_onnx_ocr::Polygon<f64>) -> [(f32, f32); 4] {
    let mut points = [(0.0, 0.0); 4];
    for (point, coord) in points.iter_mut().zip(polygon.exterior().coords()) {
        *point = (coord.x as f32, coord.y as f32);
    }
    points
}
