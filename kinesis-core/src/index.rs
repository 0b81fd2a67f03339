use crate::distance::squared_l2_unchecked;
use crate::error::{KinesisError, KinesisResult};

use ndarray::{ArrayView1, ArrayView2};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Exact nearest-neighbour structure over fixed-dimension vectors.
///
/// Positions are assigned in insertion order and never change.
pub trait Index: std::fmt::Debug {
    /// Appends every row of `batch`. Rows must have `dimensions()` components.
    fn add(&mut self, batch: ArrayView2<f32>) -> KinesisResult<()>;

    /// Returns up to `k` neighbours of `query`, closest first.
    fn search(&self, query: ArrayView1<f32>, k: usize) -> KinesisResult<Vec<Neighbor>>;

    fn vector(&self, position: usize) -> Option<ArrayView1<'_, f32>>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn dimensions(&self) -> usize;
}

/// A stored position together with its squared L2 distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub distance: f32,
    pub position: usize,
}

impl Eq for Neighbor {}

// Larger distance sorts greater; equal distances fall back to position so the
// heap keeps the lowest positions on ties.
impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.position.cmp(&other.position))
    }
}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Brute-force index: every query is compared against every stored vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    data: Vec<f32>, // Row-major, len() == count * dimension
}

impl FlatIndex {
    pub fn new(dimension: usize) -> KinesisResult<Self> {
        if dimension == 0 {
            return Err(KinesisError::Configuration("index dimension must be greater than 0".to_string()));
        }
        Ok(FlatIndex { dimension, data: Vec::new() })
    }

    /// Rebuilds an index from a row-major buffer, e.g. one read back from disk.
    pub fn from_parts(dimension: usize, data: Vec<f32>) -> KinesisResult<Self> {
        if dimension == 0 || data.len() % dimension != 0 {
            return Err(KinesisError::ShapeMismatch {
                expected: dimension,
                actual: vec![data.len()],
            });
        }
        Ok(FlatIndex { dimension, data })
    }

    /// The raw row-major component buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, f32>> {
        self.data.chunks_exact(self.dimension).map(ArrayView1::from)
    }
}

impl Index for FlatIndex {
    fn add(&mut self, batch: ArrayView2<f32>) -> KinesisResult<()> {
        if batch.ncols() != self.dimension {
            return Err(KinesisError::ShapeMismatch {
                expected: self.dimension,
                actual: batch.shape().to_vec(),
            });
        }
        self.data.reserve(batch.len());
        // Logical iteration order is row-major whatever the memory layout.
        self.data.extend(batch.iter().copied());
        Ok(())
    }

    fn search(&self, query: ArrayView1<f32>, k: usize) -> KinesisResult<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(KinesisError::ShapeMismatch {
                expected: self.dimension,
                actual: vec![query.len()],
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        // Bounded max-heap: the root is the worst of the current k best.
        let mut heap: BinaryHeap<Neighbor> = BinaryHeap::with_capacity(k.min(self.len()) + 1);
        for (position, row) in self.rows().enumerate() {
            let candidate = Neighbor {
                distance: squared_l2_unchecked(query, row),
                position,
            };
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek() {
                if candidate < *worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }
        Ok(heap.into_sorted_vec())
    }

    fn vector(&self, position: usize) -> Option<ArrayView1<'_, f32>> {
        let start = position.checked_mul(self.dimension)?;
        let end = start.checked_add(self.dimension)?;
        self.data.get(start..end).map(ArrayView1::from)
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    fn dimensions(&self) -> usize {
        self.dimension
    }
}
