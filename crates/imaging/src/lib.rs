//! Logo similarity via perceptual hashing.
//!
//! Two signals are computed per image:
//! - a 64-bit DCT perceptual hash, compared by Hamming distance
//! - a 256-bucket grayscale histogram, compared by chi-squared distance
//!
//! The combined logo similarity is `0.7 * hash + 0.3 * histogram`, rounded.
//!
//! # Usage
//!
//! ```no_run
//! use clearmark_imaging::{compare_images, ImageFingerprint};
//!
//! let logo1 = std::fs::read("logo1.png").unwrap();
//! let logo2 = std::fs::read("logo2.png").unwrap();
//!
//! // Advisory score; undecodable input scores 0
//! let score = compare_images(&logo1, &logo2);
//!
//! // Or keep the fingerprint around for later comparisons
//! let fingerprint = ImageFingerprint::from_bytes(&logo1).unwrap();
//! let stored = fingerprint.hash.to_hex();
//! ```

pub mod histogram;
pub mod phash;

pub use histogram::{Histogram, HISTOGRAM_BINS};
pub use phash::{PerceptualHash, FREQ_SIZE, HASH_BITS, HASH_SIZE};

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

/// Weight of the perceptual hash in the combined score.
pub const HASH_WEIGHT: f64 = 0.7;
/// Weight of the histogram in the combined score.
pub const HISTOGRAM_WEIGHT: f64 = 0.3;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image: not a PNG, JPEG, GIF or WebP buffer")]
    UnsupportedImage,

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Fingerprint lengths differ: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Invalid fingerprint encoding: {0}")]
    InvalidEncoding(String),
}

pub type Result<T> = std::result::Result<T, ImageError>;

/// Image container formats accepted for logo comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    WebP,
}

const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const GIF_MAGIC: &[u8] = b"GIF";

/// Identify the container format from its magic bytes.
pub fn detect_kind(data: &[u8]) -> Option<ImageKind> {
    if data.starts_with(PNG_MAGIC) {
        Some(ImageKind::Png)
    } else if data.starts_with(JPEG_MAGIC) {
        Some(ImageKind::Jpeg)
    } else if data.starts_with(GIF_MAGIC) {
        Some(ImageKind::Gif)
    } else if data.len() >= 12 && &data[..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some(ImageKind::WebP)
    } else {
        None
    }
}

/// Reject buffers that are not a supported image before decoding.
pub fn validate(data: &[u8]) -> Result<ImageKind> {
    detect_kind(data).ok_or(ImageError::UnsupportedImage)
}

/// Fingerprint of one image: perceptual hash plus intensity histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFingerprint {
    pub hash: PerceptualHash,
    pub histogram: Histogram,
}

impl ImageFingerprint {
    /// Compute the fingerprint from raw image bytes.
    ///
    /// Supports JPEG, PNG, GIF, and WebP formats.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        validate(data)?;
        let image = image::load_from_memory(data)
            .map_err(|e| ImageError::Decode(e.to_string()))?
            .to_rgba8();
        Self::from_pixels(&image)
    }

    /// Compute the fingerprint from a decoded RGBA grid.
    pub fn from_pixels(image: &RgbaImage) -> Result<Self> {
        let luma = luminance_grid(image)?;
        Ok(Self {
            hash: phash::hash_luminance(&luma),
            histogram: Histogram::from_luminance(&luma),
        })
    }

    /// Combined logo similarity, 0..=100.
    pub fn similarity(&self, other: &Self) -> Result<u8> {
        let hash_similarity = self.hash.similarity(&other.hash)? as f64;
        let histogram_similarity = self.histogram.similarity(&other.histogram)? as f64;
        let combined = hash_similarity * HASH_WEIGHT + histogram_similarity * HISTOGRAM_WEIGHT;
        Ok(combined.round() as u8)
    }
}

/// Resample to `FREQ_SIZE` x `FREQ_SIZE` and convert to luminance, row-major.
fn luminance_grid(image: &RgbaImage) -> Result<Vec<f64>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::Decode("image has no pixels".to_string()));
    }

    let size = FREQ_SIZE as u32;
    let grid: Cow<'_, RgbaImage> = if (width, height) == (size, size) {
        Cow::Borrowed(image)
    } else {
        Cow::Owned(imageops::resize(image, size, size, FilterType::Triangle))
    };

    Ok(grid
        .pixels()
        .map(|p| {
            let [r, g, b, _] = p.0;
            0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
        })
        .collect())
}

/// Perceptual hash of an image buffer, as hex.
pub fn hash(data: &[u8]) -> Result<String> {
    Ok(ImageFingerprint::from_bytes(data)?.hash.to_hex())
}

/// Compare two image buffers.
///
/// Logo comparison is advisory: any validation, decode or comparison
/// failure yields 0 instead of an error.
pub fn compare_images(data1: &[u8], data2: &[u8]) -> u8 {
    let result = ImageFingerprint::from_bytes(data1).and_then(|fp1| {
        let fp2 = ImageFingerprint::from_bytes(data2)?;
        fp1.similarity(&fp2)
    });

    match result {
        Ok(similarity) => similarity,
        Err(e) => {
            tracing::warn!(error = %e, "Logo comparison failed");
            0
        }
    }
}

/// Compare two stored hex hashes; `None` if either is malformed or sizes differ.
pub fn compare_hex_hashes(hex1: &str, hex2: &str) -> Option<u8> {
    let hash1 = PerceptualHash::from_hex(hex1).ok()?;
    let hash2 = PerceptualHash::from_hex(hex2).ok()?;
    hash1.similarity(&hash2).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba};
    use std::io::Cursor;

    /// Checkerboard blocks over a diagonal ramp, intensities 40..=150.
    fn patterned(offset: u8) -> RgbaImage {
        RgbaImage::from_fn(FREQ_SIZE as u32, FREQ_SIZE as u32, |x, y| {
            let ramp = ((x * 7 + y * 3) % 50) as u8;
            let block = if (x / 8 + y / 8) % 2 == 0 { 60 } else { 0 };
            let v = 40 + ramp + block + offset;
            Rgba([v, v, v, 255])
        })
    }

    fn encode_png(image: &RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_detect_kind() {
        assert_eq!(detect_kind(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0]), Some(ImageKind::Png));
        assert_eq!(detect_kind(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(detect_kind(b"GIF89a"), Some(ImageKind::Gif));
        assert_eq!(detect_kind(b"RIFF\x24\x00\x00\x00WEBPVP8 "), Some(ImageKind::WebP));
        assert_eq!(detect_kind(b"%PDF-1.7"), None);
        assert_eq!(detect_kind(&[]), None);
    }

    #[test]
    fn test_unsupported_image_rejected_before_decode() {
        assert!(matches!(
            ImageFingerprint::from_bytes(b"not an image"),
            Err(ImageError::UnsupportedImage)
        ));
        assert!(matches!(hash(b"not an image"), Err(ImageError::UnsupportedImage)));
    }

    #[test]
    fn test_truncated_png_fails_decode() {
        let png = encode_png(&patterned(0));
        assert!(matches!(
            ImageFingerprint::from_bytes(&png[..16]),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn test_identical_images_score_full() {
        let png = encode_png(&patterned(0));
        assert_eq!(compare_images(&png, &png), 100);
    }

    #[test]
    fn test_compare_is_symmetric() {
        let a = encode_png(&patterned(0));
        let b = encode_png(&RgbaImage::from_fn(48, 40, |x, y| {
            Rgba([(x * 5) as u8, (y * 6) as u8, 90, 255])
        }));
        assert_eq!(compare_images(&a, &b), compare_images(&b, &a));
    }

    #[test]
    fn test_compare_failure_scores_zero() {
        let png = encode_png(&patterned(0));
        assert_eq!(compare_images(&png, b"garbage"), 0);
        assert_eq!(compare_images(b"\xFF\xD8\xFFbroken", &png), 0);
    }

    #[test]
    fn test_brightness_shift_keeps_hash() {
        let base = ImageFingerprint::from_pixels(&patterned(0)).unwrap();
        let brighter = ImageFingerprint::from_pixels(&patterned(50)).unwrap();

        let similarity = base.hash.similarity(&brighter.hash).unwrap();
        assert!(similarity > 90, "hash similarity {similarity}");
        // The histogram moves with the shift
        assert!(base.histogram.similarity(&brighter.histogram).unwrap() < 100);
    }

    #[test]
    fn test_hash_is_64_bit_hex() {
        let png = encode_png(&patterned(0));
        let hex = hash(&png).unwrap();
        assert_eq!(hex.len(), 16);
        assert_eq!(compare_hex_hashes(&hex, &hex), Some(100));
        assert_eq!(compare_hex_hashes(&hex, "abcd"), None);
    }

    #[test]
    fn test_resampled_input_hashes() {
        let large = RgbaImage::from_fn(128, 96, |x, y| {
            let v = if (x / 32 + y / 24) % 2 == 0 { 220 } else { 30 };
            Rgba([v, v, v, 255])
        });
        let fingerprint = ImageFingerprint::from_pixels(&large).unwrap();
        assert!(fingerprint.hash.is_standard_size());
        assert_eq!(
            fingerprint.histogram.bins().iter().sum::<u32>(),
            (FREQ_SIZE * FREQ_SIZE) as u32
        );
    }

    #[test]
    fn test_empty_image_rejected() {
        let empty = RgbaImage::new(0, 0);
        assert!(matches!(
            ImageFingerprint::from_pixels(&empty),
            Err(ImageError::Decode(_))
        ));
    }
}
