//! Vector Similarity Functions
//!
//! Dot products over unit vectors, which equal cosine similarity.

use std::ops::Deref;

use crate::error::{Error, Result};

/// Tolerance used when checking unit length
pub const UNIT_EPSILON: f32 = 1e-4;

/// Compute dot product of two vectors
///
/// Uses unrolled loop for better CPU performance.
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vector dimensions must match");

    let len = a.len();
    let mut sum = 0.0f32;

    let chunks = len / 4;
    let remainder = len % 4;

    for i in 0..chunks {
        let idx = i * 4;
        sum += a[idx] * b[idx];
        sum += a[idx + 1] * b[idx + 1];
        sum += a[idx + 2] * b[idx + 2];
        sum += a[idx + 3] * b[idx + 3];
    }

    for i in (len - remainder)..len {
        sum += a[i] * b[i];
    }

    sum
}

/// Euclidean norm
#[inline]
pub fn magnitude(v: &[f32]) -> f32 {
    dot_product(v, v).sqrt()
}

/// Normalize a vector in place.
///
/// Returns `false` and leaves the vector untouched when it has zero norm.
pub fn normalize_in_place(v: &mut [f32]) -> bool {
    let mag = magnitude(v);
    if mag > 0.0 && mag.is_finite() {
        for x in v.iter_mut() {
            *x /= mag;
        }
        true
    } else {
        false
    }
}

/// Copy `src` into `dst` scaled to unit length; zero rows are copied as zeros.
pub fn normalize_into(src: &[f32], dst: &mut [f32]) -> bool {
    dst.copy_from_slice(src);
    normalize_in_place(dst)
}

/// Cosine similarity of two arbitrary vectors, 0.0 if either is zero
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let denom = magnitude(a) * magnitude(b);
    if denom > 0.0 {
        dot_product(a, b) / denom
    } else {
        0.0
    }
}

/// A vector with Euclidean norm 1
#[derive(Debug, Clone, PartialEq)]
pub struct UnitVector(Vec<f32>);

impl UnitVector {
    /// Normalize `v`; `word` only labels the error for zero vectors.
    pub fn new(word: &str, v: &[f32]) -> Result<Self> {
        let mut data = v.to_vec();
        if normalize_in_place(&mut data) {
            Ok(Self(data))
        } else {
            Err(Error::ZeroVector(word.to_string()))
        }
    }

    /// Similarity to another unit vector
    #[inline]
    pub fn similarity(&self, other: &[f32]) -> f32 {
        dot_product(&self.0, other)
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl Deref for UnitVector {
    type Target = [f32];

    fn deref(&self) -> &[f32] {
        &self.0
    }
}
