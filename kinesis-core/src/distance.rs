//! Squared Euclidean distance between embedding vectors.

use ndarray::ArrayView1;
use crate::error::{KinesisError, KinesisResult};

/// Squared Euclidean (L2) distance, the score reported by store searches.
///
/// Returns `KinesisError::ShapeMismatch` if the vectors have different lengths.
pub fn squared_l2(v1: ArrayView1<f32>, v2: ArrayView1<f32>) -> KinesisResult<f32> {
    if v1.len() != v2.len() {
        return Err(KinesisError::ShapeMismatch {
            expected: v1.len(),
            actual: vec![v2.len()],
        });
    }
    Ok(squared_l2_unchecked(v1, v2))
}

// Callers guarantee equal lengths.
#[inline]
pub(crate) fn squared_l2_unchecked(v1: ArrayView1<f32>, v2: ArrayView1<f32>) -> f32 {
    v1.iter()
        .zip(v2.iter())
        .map(|(a, b)| {
            let d = a - b;
            d * d
        })
        .sum()
}
