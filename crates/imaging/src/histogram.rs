//! Grayscale intensity histograms and their chi-squared comparison.

use crate::{ImageError, Result};
use serde::{Deserialize, Serialize};

/// One bucket per 8-bit intensity.
pub const HISTOGRAM_BINS: usize = 256;

/// Chi-squared distance units per similarity point.
const CHI_SQUARED_SCALE: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    bins: Vec<u32>,
}

impl Histogram {
    /// Bucket luminance values (0.0..=255.0) by rounded intensity.
    pub fn from_luminance(luma: &[f64]) -> Self {
        let mut bins = vec![0u32; HISTOGRAM_BINS];
        for value in luma {
            let bucket = value.round().clamp(0.0, (HISTOGRAM_BINS - 1) as f64) as usize;
            bins[bucket] += 1;
        }
        Self { bins }
    }

    pub fn from_bins(bins: Vec<u32>) -> Self {
        Self { bins }
    }

    pub fn bins(&self) -> &[u32] {
        &self.bins
    }

    /// `Σ (a - b)² / (a + b)` over buckets where `a + b > 0`.
    pub fn chi_squared(&self, other: &Self) -> Result<f64> {
        if self.bins.len() != other.bins.len() {
            return Err(ImageError::LengthMismatch {
                left: self.bins.len(),
                right: other.bins.len(),
            });
        }

        Ok(self
            .bins
            .iter()
            .zip(&other.bins)
            .filter(|(a, b)| **a + **b > 0)
            .map(|(a, b)| {
                let (a, b) = (*a as f64, *b as f64);
                (a - b).powi(2) / (a + b)
            })
            .sum())
    }

    /// Similarity 0..=100: `max(0, 100 - χ²/20)`, rounded.
    pub fn similarity(&self, other: &Self) -> Result<u8> {
        let chi_squared = self.chi_squared(other)?;
        Ok((100.0 - chi_squared / CHI_SQUARED_SCALE).max(0.0).round() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_luminance_rounds_and_clamps() {
        let hist = Histogram::from_luminance(&[0.4, 0.6, 254.7, 300.0, -3.0]);
        assert_eq!(hist.bins()[0], 2);
        assert_eq!(hist.bins()[1], 1);
        assert_eq!(hist.bins()[255], 2);
        assert_eq!(hist.bins().len(), HISTOGRAM_BINS);
    }

    #[test]
    fn test_identical_histograms() {
        let hist = Histogram::from_luminance(&[10.0, 20.0, 20.0]);
        assert_eq!(hist.chi_squared(&hist).unwrap(), 0.0);
        assert_eq!(hist.similarity(&hist).unwrap(), 100);
    }

    #[test]
    fn test_disjoint_histograms() {
        let a = Histogram::from_luminance(&vec![10.0; 1024]);
        let b = Histogram::from_luminance(&vec![200.0; 1024]);
        // χ² = 1024 + 1024
        assert_eq!(a.chi_squared(&b).unwrap(), 2048.0);
        assert_eq!(a.similarity(&b).unwrap(), 0);
    }

    #[test]
    fn test_partial_overlap() {
        let a = Histogram::from_bins(vec![100, 100]);
        let b = Histogram::from_bins(vec![100, 0]);
        // χ² = 0 + 100
        assert_eq!(a.similarity(&b).unwrap(), 95);
    }

    #[test]
    fn test_length_mismatch() {
        let a = Histogram::from_bins(vec![1, 2]);
        let b = Histogram::from_bins(vec![1, 2, 3]);
        assert!(matches!(a.chi_squared(&b), Err(ImageError::LengthMismatch { .. })));
    }
}
