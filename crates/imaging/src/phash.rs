//! DCT-based perceptual hashing.
//!
//! # Algorithm
//!
//! 1. Resample the image to a 32x32 grid and convert to luminance
//!    (`0.299R + 0.587G + 0.114B`).
//! 2. Apply an orthonormal 2D DCT-II (rows, then columns).
//! 3. Keep the top-left 8x8 low-frequency block.
//! 4. Emit one bit per coefficient: 1 when it exceeds the mean of the 63
//!    non-DC coefficients.
//!
//! Excluding the DC term from the mean makes the hash insensitive to
//! uniform brightness shifts, which only move the DC coefficient.

use crate::{ImageError, Result};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Side of the low-frequency block (8x8 = 64-bit hash).
pub const HASH_SIZE: usize = 8;

/// Number of bits in a standard hash.
pub const HASH_BITS: usize = HASH_SIZE * HASH_SIZE;

/// Side of the grid the DCT runs on.
pub const FREQ_SIZE: usize = 32;

/// A perceptual hash as a bit sequence, most significant bit first.
///
/// Serialized as a hex string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PerceptualHash {
    bits: Vec<bool>,
}

impl PerceptualHash {
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Check if this hash has the standard size (64 bits).
    pub fn is_standard_size(&self) -> bool {
        self.bits.len() == HASH_BITS
    }

    /// Number of differing bits.
    ///
    /// Hashes of different lengths cannot be compared.
    pub fn hamming_distance(&self, other: &Self) -> Result<u32> {
        if self.bits.len() != other.bits.len() {
            return Err(ImageError::LengthMismatch {
                left: self.bits.len(),
                right: other.bits.len(),
            });
        }

        Ok(self
            .bits
            .iter()
            .zip(&other.bits)
            .filter(|(a, b)| a != b)
            .count() as u32)
    }

    /// Similarity 0..=100 derived from the Hamming distance.
    pub fn similarity(&self, other: &Self) -> Result<u8> {
        let distance = self.hamming_distance(other)?;
        let max_distance = self.bits.len();
        if max_distance == 0 {
            return Ok(100);
        }
        let similarity = (max_distance - distance as usize) as f64 / max_distance as f64 * 100.0;
        Ok(similarity.round() as u8)
    }

    /// Pack the bits into bytes, zero-padding the last byte.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |byte, (i, bit)| byte | ((*bit as u8) << (7 - i)))
            })
            .collect()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let bits = bytes
            .iter()
            .flat_map(|byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
            .collect();
        Self { bits }
    }

    /// Get the hash as a hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Create a perceptual hash from a hexadecimal string.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| ImageError::InvalidEncoding(format!("invalid hex string: {}", e)))?;
        Ok(Self::from_bytes(&bytes))
    }

    /// The hash as a string of `0`/`1` characters.
    pub fn to_bit_string(&self) -> String {
        self.bits.iter().map(|b| if *b { '1' } else { '0' }).collect()
    }

    pub fn from_bit_string(s: &str) -> Result<Self> {
        let bits = s
            .trim()
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(ImageError::InvalidEncoding(format!(
                    "unexpected character {:?} in bit string",
                    other
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { bits })
    }
}

impl fmt::Display for PerceptualHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<PerceptualHash> for String {
    fn from(hash: PerceptualHash) -> Self {
        hash.to_hex()
    }
}

impl TryFrom<String> for PerceptualHash {
    type Error = ImageError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

/// Cosine basis for an n-point DCT-II, row-major `[u * n + x]`.
fn dct_basis(n: usize) -> Vec<f64> {
    let mut basis = Vec::with_capacity(n * n);
    for u in 0..n {
        let scale = if u == 0 {
            (1.0 / n as f64).sqrt()
        } else {
            (2.0 / n as f64).sqrt()
        };
        for x in 0..n {
            basis.push(scale * (PI * (2 * x + 1) as f64 * u as f64 / (2 * n) as f64).cos());
        }
    }
    basis
}

fn dct_1d(values: &[f64], basis: &[f64], out: &mut [f64]) {
    let n = values.len();
    for (u, slot) in out.iter_mut().enumerate() {
        *slot = basis[u * n..(u + 1) * n]
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum();
    }
}

/// Orthonormal 2D DCT of a square row-major matrix: rows first, then columns.
pub fn dct_2d(matrix: &[f64], n: usize) -> Vec<f64> {
    debug_assert_eq!(matrix.len(), n * n);
    let basis = dct_basis(n);

    let mut rows = vec![0.0; n * n];
    for (input, output) in matrix.chunks(n).zip(rows.chunks_mut(n)) {
        dct_1d(input, &basis, output);
    }

    let mut result = vec![0.0; n * n];
    let mut column = vec![0.0; n];
    let mut transformed = vec![0.0; n];
    for j in 0..n {
        for i in 0..n {
            column[i] = rows[i * n + j];
        }
        dct_1d(&column, &basis, &mut transformed);
        for i in 0..n {
            result[i * n + j] = transformed[i];
        }
    }
    result
}

/// Hash a `FREQ_SIZE` x `FREQ_SIZE` luminance grid.
pub fn hash_luminance(luma: &[f64]) -> PerceptualHash {
    let dct = dct_2d(luma, FREQ_SIZE);

    let low_freq: Vec<f64> = (0..HASH_SIZE)
        .flat_map(|i| (0..HASH_SIZE).map(move |j| (i, j)))
        .map(|(i, j)| dct[i * FREQ_SIZE + j])
        .collect();

    // DC term excluded
    let mean = low_freq[1..].iter().sum::<f64>() / (low_freq.len() - 1) as f64;

    PerceptualHash::from_bits(low_freq.iter().map(|c| *c > mean).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_of(pattern: &str) -> PerceptualHash {
        PerceptualHash::from_bit_string(pattern).unwrap()
    }

    #[test]
    fn test_dct_of_constant_is_dc_only() {
        let n = 8;
        let dct = dct_2d(&vec![10.0; n * n], n);
        assert!((dct[0] - 80.0).abs() < 1e-9);
        assert!(dct[1..].iter().all(|c| c.abs() < 1e-9));
    }

    #[test]
    fn test_dct_preserves_energy() {
        let n = 4;
        let matrix: Vec<f64> = (0..n * n).map(|v| (v * v % 7) as f64).collect();
        let dct = dct_2d(&matrix, n);
        let energy_in: f64 = matrix.iter().map(|v| v * v).sum();
        let energy_out: f64 = dct.iter().map(|v| v * v).sum();
        assert!((energy_in - energy_out).abs() < 1e-6);
    }

    #[test]
    fn test_hamming_distance() {
        let a = hash_of("0000");
        let b = hash_of("0110");
        assert_eq!(a.hamming_distance(&b).unwrap(), 2);
        assert_eq!(a.similarity(&b).unwrap(), 50);
        assert_eq!(a.similarity(&a).unwrap(), 100);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let a = hash_of("0101");
        let b = hash_of("01010");
        assert!(matches!(
            a.hamming_distance(&b),
            Err(ImageError::LengthMismatch { left: 4, right: 5 })
        ));
    }

    #[test]
    fn test_hex_and_bit_string_forms() {
        let hash = PerceptualHash::from_hex("deadbeefcafebabe").unwrap();
        assert!(hash.is_standard_size());
        assert_eq!(hash.to_hex(), "deadbeefcafebabe");
        assert!(hash.to_bit_string().starts_with("11011110"));
        assert_eq!(hash.to_bit_string().len(), HASH_BITS);

        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, "\"deadbeefcafebabe\"");
    }

    #[test]
    fn test_invalid_encodings() {
        assert!(PerceptualHash::from_hex("zz").is_err());
        assert!(PerceptualHash::from_bit_string("0102").is_err());
    }

    #[test]
    fn test_hash_luminance_is_64_bits() {
        let luma: Vec<f64> = (0..FREQ_SIZE * FREQ_SIZE).map(|i| (i % 97) as f64).collect();
        let hash = hash_luminance(&luma);
        assert_eq!(hash.len(), HASH_BITS);
        // DC dominates a positive image
        assert!(hash.bits()[0]);
    }
}
