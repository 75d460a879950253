//! Image preprocessing for marker text on metal.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::debug;

use crate::models::config::PreprocessConfig;

/// Downscale, grayscale, and adaptive-threshold an image before OCR.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Maximum image dimension (0 = unlimited).
    max_size: u32,
    /// Neighbourhood size for the local mean (odd).
    block_size: u32,
    /// Constant subtracted from the local mean.
    offset: i32,
    /// Emit white strokes on black.
    invert: bool,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self {
            max_size: config.max_image_size,
            block_size: normalize_block_size(config.block_size),
            offset: config.threshold_offset,
            invert: config.invert,
        }
    }

    /// Set maximum image dimension.
    pub fn with_max_size(mut self, size: u32) -> Self {
        self.max_size = size;
        self
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = normalize_block_size(block_size);
        self
    }

    pub fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Run the full preprocessing chain.
    pub fn process(&self, image: &DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (new_width, new_height) = self.calculate_resize_dimensions(width, height);

        let gray = if (new_width, new_height) != (width, height) {
            debug!(
                "Resizing {}x{} to {}x{} before thresholding",
                width, height, new_width, new_height
            );
            image
                .resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
                .to_luma8()
        } else {
            image.to_luma8()
        };

        DynamicImage::ImageLuma8(self.adaptive_threshold(&gray))
    }

    fn calculate_resize_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let max_dim = width.max(height);

        if self.max_size == 0 || max_dim <= self.max_size {
            return (width, height);
        }

        let scale = self.max_size as f32 / max_dim as f32;
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;

        (new_width.max(1), new_height.max(1))
    }

    /// Mean adaptive threshold: a pixel is foreground when it is not brighter
    /// than the rounded mean of its `block_size` neighbourhood minus `offset`.
    /// Neighbourhoods reaching past the edge repeat the outermost pixels.
    fn adaptive_threshold(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mut result = GrayImage::new(width, height);
        if width == 0 || height == 0 {
            return result;
        }

        let half_block = self.block_size / 2;
        let integral = IntegralImage::with_border(image, half_block);
        let area = (self.block_size * self.block_size) as u64;
        let (fg, bg) = if self.invert { (255u8, 0u8) } else { (0u8, 255u8) };

        for y in 0..height {
            for x in 0..width {
                // Padded coordinates: pixel (x, y) sits at (x + half, y + half).
                let sum = integral.sum(x, y, x + self.block_size, y + self.block_size);
                let mean = ((sum + area / 2) / area) as i32;
                let threshold = mean - self.offset;
                let pixel_value = image.get_pixel(x, y)[0] as i32;

                let output = if pixel_value > threshold { bg } else { fg };
                result.put_pixel(x, y, Luma([output]));
            }
        }

        result
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_block_size(block_size: u32) -> u32 {
    block_size.max(3) | 1
}

/// Summed-area table over a grayscale image, optionally padded on every side
/// by repeating its edge pixels.
struct IntegralImage {
    stride: usize,
    sums: Vec<u64>,
}

impl IntegralImage {
    #[cfg(test)]
    fn new(image: &GrayImage) -> Self {
        Self::with_border(image, 0)
    }

    fn with_border(image: &GrayImage, border: u32) -> Self {
        let (width, height) = image.dimensions();
        let padded_width = (width + 2 * border) as usize;
        let padded_height = (height + 2 * border) as usize;
        let stride = padded_width + 1;
        let mut sums = vec![0u64; stride * (padded_height + 1)];

        let clamp = |v: usize, len: u32| (v as u32).saturating_sub(border).min(len - 1);
        for y in 0..padded_height {
            let src_y = clamp(y, height);
            let mut row_sum = 0u64;
            for x in 0..padded_width {
                row_sum += image.get_pixel(clamp(x, width), src_y)[0] as u64;
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }

        Self { stride, sums }
    }

    /// Sum over the half-open rectangle `[x0, x1) x [y0, y1)`.
    fn sum(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> u64 {
        let at = |x: u32, y: u32| self.sums[y as usize * self.stride + x as usize];
        at(x1, y1) + at(x0, y0) - at(x1, y0) - at(x0, y1)
    }
}
