//! Flat vector index with exact L2 nearest-neighbor search.


pub mod builder;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::{CaselawError, Result};

/// A position in the index paired with its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Exhaustive-search vector index over Euclidean distance.
///
/// Vectors are kept in insertion order; the position of a vector is the join
/// key into the metadata store persisted next to the index, so order must
/// never change after a vector is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Append a vector. Every vector must match the index dimension.
    #[inline]
    pub fn add(&mut self, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(CaselawError::Dimension {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(())
    }

    /// Exact k-nearest-neighbor search.
    ///
    /// Returns up to `min(k, len)` neighbors sorted ascending by Euclidean
    /// distance, ties broken by insertion position.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(CaselawError::Dimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vector)| Neighbor {
                position,
                distance: euclidean_distance(query, vector),
            })
            .collect();

        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        neighbors.truncate(k);

        Ok(neighbors)
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum::<f32>()
        .sqrt()
}
