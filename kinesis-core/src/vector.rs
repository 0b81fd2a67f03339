use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewD, Ix1, Ix2};
use serde::{Serialize, Deserialize};
use crate::error::{KinesisError, KinesisResult};

/// Arbitrary JSON object stored alongside a vector. Never interpreted by the store.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A single embedding vector.
/// Uses `ndarray::Array1<f32>` for efficient numerical operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Embedding(pub Array1<f32>);

impl std::ops::Deref for Embedding {
    type Target = Array1<f32>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<f32>> for Embedding {
    fn from(vec: Vec<f32>) -> Self {
        Embedding(Array1::from(vec))
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(embedding: Embedding) -> Self {
        embedding.0.to_vec()
    }
}

/// Builds an `(n, dimension)` batch from row vectors.
///
/// Every row must have exactly `dimension` components; the first offending row
/// is reported as `ShapeMismatch`.
pub fn batch_from_rows(rows: &[Vec<f32>], dimension: usize) -> KinesisResult<Array2<f32>> {
    let mut flat = Vec::with_capacity(rows.len() * dimension);
    for row in rows {
        if row.len() != dimension {
            return Err(KinesisError::ShapeMismatch {
                expected: dimension,
                actual: vec![rows.len(), row.len()],
            });
        }
        flat.extend_from_slice(row);
    }
    Array2::from_shape_vec((rows.len(), dimension), flat)
        .map_err(|_| KinesisError::ShapeMismatch { expected: dimension, actual: vec![rows.len(), dimension] })
}

/// Interprets a dynamically shaped array as an embedding batch.
///
/// Only rank-2 arrays whose second axis equals `dimension` are accepted.
pub fn as_batch<'a>(array: ArrayViewD<'a, f32>, dimension: usize) -> KinesisResult<ArrayView2<'a, f32>> {
    let shape = array.shape().to_vec();
    let batch = array
        .into_dimensionality::<Ix2>()
        .map_err(|_| KinesisError::ShapeMismatch { expected: dimension, actual: shape.clone() })?;
    if batch.ncols() != dimension {
        return Err(KinesisError::ShapeMismatch { expected: dimension, actual: shape });
    }
    Ok(batch)
}

/// Interprets a dynamically shaped array as a single query vector.
///
/// Accepts a 1-D array of length `dimension` or a 2-D array with exactly one row.
pub fn as_query<'a>(array: ArrayViewD<'a, f32>, dimension: usize) -> KinesisResult<ArrayView1<'a, f32>> {
    let shape = array.shape().to_vec();
    let mismatch = || KinesisError::ShapeMismatch { expected: dimension, actual: shape.clone() };
    let query = match array.ndim() {
        1 => array.into_dimensionality::<Ix1>().map_err(|_| mismatch())?,
        2 if shape[0] == 1 => {
            let row = array.into_dimensionality::<Ix2>().map_err(|_| mismatch())?;
            row.index_axis_move(ndarray::Axis(0), 0)
        }
        _ => return Err(mismatch()),
    };
    if query.len() != dimension {
        return Err(mismatch());
    }
    Ok(query)
}
