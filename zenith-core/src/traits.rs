//! Core traits for zenith

use crate::point::Point3f;

/// Trait for nearest neighbor search functionality
///
/// Implementations are built once from a fixed point set. Returned indices
/// refer to positions in that set.
pub trait NearestNeighborSearch {
    /// Find the k nearest neighbors to a query point, closest first
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)>;

    /// Find all neighbors within a given radius
    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)>;

    /// Number of indexed points
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single closest point to `query`
    fn nearest(&self, query: &Point3f) -> Option<(usize, f32)> {
        self.find_k_nearest(query, 1).into_iter().next()
    }
}
