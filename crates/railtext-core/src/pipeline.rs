//! Image in, extraction record out: preprocessing, OCR, field extraction.

use std::borrow::Cow;
use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::{RailTextError, Result};
use crate::fields::FieldExtractor;
use crate::models::config::RailTextConfig;
use crate::models::record::ExtractionRecord;
use crate::ocr::{create_engine, ImagePreprocessor, OcrEngine};

/// Image file extensions the pipeline runs OCR on.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Extension of already-recognized text files; OCR is skipped for these.
pub const TEXT_EXTENSION: &str = "txt";

/// Kind of input file, decided by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Text,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if ext == TEXT_EXTENSION {
            Some(InputKind::Text)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(InputKind::Image)
        } else {
            None
        }
    }
}

/// OCR engine, optional preprocessor, and field extractor wired together.
pub struct RailTextPipeline {
    engine: Box<dyn OcrEngine>,
    preprocessor: Option<ImagePreprocessor>,
    extractor: FieldExtractor,
}

impl RailTextPipeline {
    /// Pipeline with default preprocessing and the built-in field table.
    pub fn new(engine: Box<dyn OcrEngine>) -> Self {
        Self {
            engine,
            preprocessor: Some(ImagePreprocessor::new()),
            extractor: FieldExtractor::new(),
        }
    }

    /// Build engine, preprocessor, and field table from configuration.
    pub fn from_config(config: &RailTextConfig) -> Result<Self> {
        let engine = create_engine(&config.ocr)?;
        let spec = config.extraction.field_spec()?;
        let preprocessor = config
            .preprocessing
            .enabled
            .then(|| ImagePreprocessor::from_config(&config.preprocessing));

        Ok(Self {
            engine,
            preprocessor,
            extractor: FieldExtractor::with_spec(spec),
        })
    }

    /// Replace (or disable, with `None`) the preprocessor.
    pub fn with_preprocessor(mut self, preprocessor: Option<ImagePreprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    pub fn with_extractor(mut self, extractor: FieldExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn extractor(&self) -> &FieldExtractor {
        &self.extractor
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// The image as it will be handed to the OCR engine.
    pub fn prepare<'a>(&self, image: &'a DynamicImage) -> Cow<'a, DynamicImage> {
        match &self.preprocessor {
            Some(preprocessor) => Cow::Owned(preprocessor.process(image)),
            None => Cow::Borrowed(image),
        }
    }

    /// Preprocess, recognize, and extract fields from an image.
    pub fn process_image(&self, image: &DynamicImage, source: &str) -> Result<ExtractionRecord> {
        let start = Instant::now();
        let prepared = self.prepare(image);
        debug!("Prepared {} in {:?}", source, start.elapsed());

        self.process_prepared(&prepared, source)
    }

    /// Recognize and extract fields from an image that already went through
    /// [`prepare`](Self::prepare).
    pub fn process_prepared(&self, prepared: &DynamicImage, source: &str) -> Result<ExtractionRecord> {
        let start = Instant::now();

        let ocr = self.engine.recognize(prepared)?;
        if ocr.text.trim().is_empty() {
            warn!("No text detected in {}", source);
        }

        let record = self.process_text(&ocr.text, source);
        info!(
            "Processed {} with {}: {}/{} fields in {:?}",
            source,
            self.engine.name(),
            record.fields.found_count(),
            record.fields.len(),
            start.elapsed()
        );

        Ok(record)
    }

    /// Extract fields from already-recognized text.
    pub fn process_text(&self, text: &str, source: &str) -> ExtractionRecord {
        ExtractionRecord::new(source, text, self.extractor.extract(text))
    }

    /// Process an image or `.txt` file from disk.
    pub fn process_file(&self, path: &Path) -> Result<ExtractionRecord> {
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match InputKind::from_path(path) {
            Some(InputKind::Text) => {
                let text = std::fs::read_to_string(path)?;
                Ok(self.process_text(&text, &source))
            }
            Some(InputKind::Image) => {
                let image = image::open(path)?;
                self.process_image(&image, &source)
            }
            None => Err(RailTextError::UnsupportedInput(path.display().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OcrError;
    use crate::ocr::OcrResult;
    use image::{GenericImageView, GrayImage, Luma};
    use std::sync::{Arc, Mutex};

    /// Returns fixed text and remembers the size of the image it was given.
    struct Recording {
        text: &'static str,
        seen: Arc<Mutex<Option<(u32, u32)>>>,
    }

    impl Recording {
        fn new(text: &'static str) -> Self {
            Self {
                text,
                seen: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl OcrEngine for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn recognize(&self, image: &DynamicImage) -> std::result::Result<OcrResult, OcrError> {
            *self.seen.lock().unwrap() = Some(image.dimensions());
            Ok(OcrResult {
                boxes: Vec::new(),
                text: self.text.to_string(),
                processing_time_ms: 0,
                image_size: image.dimensions(),
            })
        }
    }

    fn plate() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(300, 100, Luma([200])))
    }

    #[test]
    fn test_process_image() {
        let pipeline = RailTextPipeline::new(Box::new(Recording::new("KM: 12.5\nWELD #: 7")));
        let record = pipeline.process_image(&plate(), "plate.jpg").unwrap();

        assert_eq!(record.source, "plate.jpg");
        assert_eq!(record.fields.value("KM"), Some("12.5"));
        assert_eq!(record.fields.value("WELD"), Some("7"));
        assert_eq!(record.raw_text, "KM: 12.5\nWELD #: 7");
    }

    #[test]
    fn test_preprocessor_downscales_before_ocr() {
        let engine = Recording::new("");
        let pipeline = RailTextPipeline::new(Box::new(engine))
            .with_preprocessor(Some(ImagePreprocessor::new().with_max_size(150)));

        let image = plate();
        let prepared = pipeline.prepare(&image);
        assert_eq!(prepared.dimensions(), (150, 50));
        assert!(matches!(prepared, Cow::Owned(_)));
    }

    #[test]
    fn test_process_prepared_skips_preprocessing() {
        let pipeline = RailTextPipeline::new(Box::new(Recording::new("KM: 3")))
            .with_preprocessor(Some(ImagePreprocessor::new().with_max_size(150)));

        let image = plate();
        let prepared = pipeline.prepare(&image);
        let record = pipeline.process_prepared(&prepared, "plate.png").unwrap();

        assert_eq!(record.fields.value("KM"), Some("3"));
    }

    #[test]
    fn test_process_prepared_hands_image_over_unchanged() {
        let engine = Recording::new("");
        let seen = Arc::clone(&engine.seen);
        let pipeline = RailTextPipeline::new(Box::new(engine))
            .with_preprocessor(Some(ImagePreprocessor::new().with_max_size(150)));

        pipeline.process_prepared(&plate(), "plate.png").unwrap();
        assert_eq!(*seen.lock().unwrap(), Some((300, 100)));

        pipeline.process_image(&plate(), "plate.png").unwrap();
        assert_eq!(*seen.lock().unwrap(), Some((150, 50)));
    }

    #[test]
    fn test_disabled_preprocessor_borrows() {
        let pipeline = RailTextPipeline::new(Box::new(Recording::new(""))).with_preprocessor(None);
        let image = plate();
        assert!(matches!(pipeline.prepare(&image), Cow::Borrowed(_)));
    }

    #[test]
    fn test_empty_ocr_text_is_not_an_error() {
        let pipeline = RailTextPipeline::new(Box::new(Recording::new("   ")));
        let record = pipeline.process_image(&plate(), "blank.png").unwrap();
        assert_eq!(record.fields.found_count(), 0);
        assert_eq!(record.fields.len(), 12);
    }

    #[test]
    fn test_process_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marking.txt");
        std::fs::write(&path, "DATE: 2024-05-01\nRAIL TYPE: 60E1 PEAK").unwrap();

        let pipeline = RailTextPipeline::new(Box::new(Recording::new("unused")));
        let record = pipeline.process_file(&path).unwrap();

        assert_eq!(record.source, "marking.txt");
        assert_eq!(record.fields.value("DATE"), Some("2024-05-01"));
        assert_eq!(record.fields.value("RAIL TYPE"), Some("60E1"));
    }

    #[test]
    fn test_process_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plate.png");
        plate().save(&path).unwrap();

        let pipeline = RailTextPipeline::new(Box::new(Recording::new("TRUCK: 4"))).with_preprocessor(None);
        let record = pipeline.process_file(&path).unwrap();
        assert_eq!(record.fields.value("TRUCK"), Some("4"));
    }

    #[test]
    fn test_unsupported_input() {
        let pipeline = RailTextPipeline::new(Box::new(Recording::new("")));
        let err = pipeline.process_file(Path::new("scan.pdf")).unwrap_err();
        assert!(matches!(err, RailTextError::UnsupportedInput(_)));
    }

    #[test]
    fn test_input_kind() {
        assert_eq!(InputKind::from_path(Path::new("a.JPG")), Some(InputKind::Image));
        assert_eq!(InputKind::from_path(Path::new("a.txt")), Some(InputKind::Text));
        assert_eq!(InputKind::from_path(Path::new("a.pdf")), None);
    }
}
