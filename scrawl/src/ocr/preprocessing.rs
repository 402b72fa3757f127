use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use tracing::debug;

use crate::config::PreprocessConfig;
use crate::error::{Result, ScrawlError};

const UPSCALE_FACTOR: u32 = 2;
const BILATERAL_DIAMETER: u32 = 9;
const BILATERAL_SIGMA_COLOR: f64 = 75.0;
const BILATERAL_SIGMA_SPACE: f64 = 75.0;
const THRESHOLD_BLOCK_SIZE: usize = 41;
const THRESHOLD_OFFSET: i32 = 5;

/// Single-channel raster produced by the preprocessing pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessedImage {
    image: GrayImage,
}

impl PreprocessedImage {
    pub fn new(image: GrayImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.image
    }

    /// Lossless encoding for engines that only accept encoded bytes.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.image
            .write_to(&mut std::io::Cursor::new(&mut output), ImageFormat::Png)
            .map_err(|e| ScrawlError::Internal(format!("Failed to encode image: {e}")))?;
        Ok(output)
    }
}

/// Turns raw image bytes into a binarized raster ready for OCR.
pub trait ImagePreprocessor: Send + Sync {
    fn preprocess(&self, image_bytes: &[u8]) -> Result<PreprocessedImage>;
}

#[derive(Debug, Clone)]
pub struct HandwritingPreprocessor {
    config: PreprocessConfig,
}

impl HandwritingPreprocessor {
    pub fn new(config: &PreprocessConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Default for HandwritingPreprocessor {
    fn default() -> Self {
        Self::new(&PreprocessConfig::default())
    }
}

impl ImagePreprocessor for HandwritingPreprocessor {
    fn preprocess(&self, image_bytes: &[u8]) -> Result<PreprocessedImage> {
        preprocess_image(image_bytes, &self.config)
    }
}

/// Preprocess image bytes for OCR
///
/// Stages run in a fixed order, each feeding the next:
/// 1. Grayscale conversion (oversized inputs are first shrunk to fit)
/// 2. 2x cubic upscale
/// 3. Bilateral filter (d=9, sigma 75/75)
/// 4. Gaussian adaptive threshold (41px block, C=5) to pure black/white
///
/// The input buffer is never modified and identical input always yields
/// identical output.
pub fn preprocess_image(bytes: &[u8], config: &PreprocessConfig) -> Result<PreprocessedImage> {
    if bytes.is_empty() {
        return Err(ScrawlError::Decode("Empty image buffer".to_string()));
    }

    let img = image::load_from_memory(bytes)
        .map_err(|e| ScrawlError::Decode(format!("Failed to decode image: {e}")))?;

    let img = fit_for_upscale(img, config.max_dimension);
    let (target_w, target_h) = (img.width() * UPSCALE_FACTOR, img.height() * UPSCALE_FACTOR);

    let gray = img.to_luma8();
    let upscaled = image::imageops::resize(&gray, target_w, target_h, FilterType::CatmullRom);
    let smoothed = bilateral_filter(
        &upscaled,
        BILATERAL_DIAMETER,
        BILATERAL_SIGMA_COLOR,
        BILATERAL_SIGMA_SPACE,
    );
    let binary = adaptive_threshold_gaussian(&smoothed, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET);

    Ok(PreprocessedImage::new(binary))
}

/// Shrink an image, keeping its aspect ratio, so that its upscaled size
/// fits within `max_dim` on both axes.
fn fit_for_upscale(img: DynamicImage, max_dim: u32) -> DynamicImage {
    let limit = (max_dim / UPSCALE_FACTOR).max(1);
    if img.width() <= limit && img.height() <= limit {
        return img;
    }

    debug!(
        width = img.width(),
        height = img.height(),
        limit,
        "Downscaling oversized image before preprocessing"
    );
    img.resize(limit, limit, FilterType::Lanczos3)
}

/// Mirror an out-of-range coordinate back into `0..len` without repeating
/// the edge pixel (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(pos: i64, len: i64) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let mut p = pos.rem_euclid(period);
    if p >= len {
        p = period - p;
    }
    p as usize
}

/// Edge-preserving smoothing over a circular window of the given diameter.
fn bilateral_filter(
    src: &GrayImage,
    diameter: u32,
    sigma_color: f64,
    sigma_space: f64,
) -> GrayImage {
    let (width, height) = src.dimensions();
    let radius = (diameter / 2) as i64;

    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let color_weights: Vec<f64> = (0..256)
        .map(|d| ((d * d) as f64 * color_coeff).exp())
        .collect();

    let mut window: Vec<(i64, i64, f64)> = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = (dx * dx + dy * dy) as f64;
            if r2.sqrt() > radius as f64 {
                continue;
            }
            window.push((dx, dy, (r2 * space_coeff).exp()));
        }
    }

    let (w, h) = (width as i64, height as i64);
    GrayImage::from_fn(width, height, |x, y| {
        let center = src.get_pixel(x, y)[0] as i32;
        let mut sum = 0.0f64;
        let mut weight_sum = 0.0f64;

        for &(dx, dy, space_weight) in &window {
            let sx = reflect_101(x as i64 + dx, w) as u32;
            let sy = reflect_101(y as i64 + dy, h) as u32;
            let value = src.get_pixel(sx, sy)[0] as i32;
            let weight = space_weight * color_weights[(value - center).unsigned_abs() as usize];
            sum += value as f64 * weight;
            weight_sum += weight;
        }

        Luma([(sum / weight_sum).round().clamp(0.0, 255.0) as u8])
    })
}

/// Normalized 1-D Gaussian kernel. Sigma follows the usual derivation from
/// the kernel size: `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
fn gaussian_kernel(size: usize) -> Vec<f64> {
    let sigma = 0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8;
    let half = (size / 2) as f64;
    let scale = -0.5 / (sigma * sigma);

    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 - half;
            (x * x * scale).exp()
        })
        .collect();
    let total: f64 = raw.iter().sum();
    raw.into_iter().map(|v| v / total).collect()
}

/// Local Gaussian-weighted mean, edges replicated.
fn gaussian_mean(src: &GrayImage, block_size: usize) -> Vec<u8> {
    let (width, height) = (src.width() as usize, src.height() as usize);
    let kernel = gaussian_kernel(block_size);
    let half = (block_size / 2) as i64;
    let clamp = |v: i64, len: usize| v.clamp(0, len as i64 - 1) as usize;

    let raw = src.as_raw();
    let mut horizontal = vec![0.0f64; width * height];
    for y in 0..height {
        let row = &raw[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sx = clamp(x as i64 + k as i64 - half, width);
                acc += row[sx] as f64 * weight;
            }
            horizontal[y * width + x] = acc;
        }
    }

    let mut mean = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (k, weight) in kernel.iter().enumerate() {
                let sy = clamp(y as i64 + k as i64 - half, height);
                acc += horizontal[sy * width + x] * weight;
            }
            mean[y * width + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }

    mean
}

/// Binarize: a pixel turns white when it is brighter than its neighbourhood
/// mean minus `offset`, black otherwise.
fn adaptive_threshold_gaussian(src: &GrayImage, block_size: usize, offset: i32) -> GrayImage {
    let mean = gaussian_mean(src, block_size);
    let width = src.width() as usize;

    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        let value = src.get_pixel(x, y)[0] as i32;
        let local = mean[y as usize * width + x as usize] as i32;
        if value > local - offset {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}
