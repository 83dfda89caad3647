//! Nearest neighbor search implementations

use rstar::primitives::GeomWithData;
use rstar::RTree;
use tracing::debug;
use zenith_core::{Error, NearestNeighborSearch, Point3f, Result};

type IndexedPoint = GeomWithData<[f32; 3], usize>;

/// R*-tree backed nearest neighbor search
///
/// Built once per dataset; each entry remembers its position in the source
/// slice so results can be mapped back to records.
pub struct RTreeIndex {
    tree: RTree<IndexedPoint>,
}

impl RTreeIndex {
    pub fn new(points: &[Point3f]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyIndex);
        }

        let entries: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| GeomWithData::new([p.x, p.y, p.z], idx))
            .collect();
        let tree = RTree::bulk_load(entries);
        debug!(points = tree.size(), "built r-tree index");

        Ok(Self { tree })
    }
}

impl NearestNeighborSearch for RTreeIndex {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        self.tree
            .nearest_neighbor_iter_with_distance_2(&[query.x, query.y, query.z])
            .take(k)
            .map(|(entry, distance_squared)| (entry.data, distance_squared.sqrt()))
            .collect()
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        let center = [query.x, query.y, query.z];
        let mut neighbors: Vec<(usize, f32)> = self
            .tree
            .locate_within_distance(center, radius * radius)
            .map(|entry| {
                let [x, y, z] = *entry.geom();
                let distance = (Point3f::new(x, y, z) - query).norm();
                (entry.data, distance)
            })
            .collect();

        neighbors.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        neighbors
    }

    fn len(&self) -> usize {
        self.tree.size()
    }
}

/// Simple brute force nearest neighbor search for small datasets
pub struct BruteForceSearch {
    points: Vec<Point3f>,
}

impl BruteForceSearch {
    pub fn new(points: &[Point3f]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyIndex);
        }
        Ok(Self {
            points: points.to_vec(),
        })
    }

    fn distances<'a>(&'a self, query: &'a Point3f) -> impl Iterator<Item = (usize, f32)> + 'a {
        self.points
            .iter()
            .enumerate()
            .map(move |(idx, point)| (idx, (point - query).norm()))
    }
}

impl NearestNeighborSearch for BruteForceSearch {
    fn find_k_nearest(&self, query: &Point3f, k: usize) -> Vec<(usize, f32)> {
        let mut distances: Vec<(usize, f32)> = self.distances(query).collect();

        // Stable sort keeps the lower index first on equal distances
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(k);
        distances
    }

    fn find_radius_neighbors(&self, query: &Point3f, radius: f32) -> Vec<(usize, f32)> {
        let mut neighbors: Vec<(usize, f32)> = self
            .distances(query)
            .filter(|&(_, distance)| distance <= radius)
            .collect();
        neighbors.sort_by(|a, b| a.1.total_cmp(&b.1));
        neighbors
    }

    fn len(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn grid() -> Vec<Point3f> {
        let mut points = Vec::new();
        for x in 0..5 {
            for y in 0..5 {
                points.push(Point3f::new(x as f32, y as f32, 0.0));
            }
        }
        points
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert_eq!(RTreeIndex::new(&[]).err(), Some(Error::EmptyIndex));
        assert_eq!(BruteForceSearch::new(&[]).err(), Some(Error::EmptyIndex));
    }

    #[test]
    fn test_rtree_nearest() {
        let index = RTreeIndex::new(&grid()).unwrap();
        let (idx, distance) = index.nearest(&Point3f::new(2.1, 3.0, 0.0)).unwrap();
        assert_eq!(idx, 2 * 5 + 3);
        assert_relative_eq!(distance, 0.1, epsilon = 1e-5);
        assert_eq!(index.len(), 25);
    }

    #[test]
    fn test_k_nearest_is_ascending_and_bounded() {
        let index = RTreeIndex::new(&grid()).unwrap();
        let result = index.find_k_nearest(&Point3f::new(0.0, 0.0, 0.0), 4);
        assert_eq!(result.len(), 4);
        assert_eq!(result[0], (0, 0.0));
        for pair in result.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }

        let small = BruteForceSearch::new(&[Point3f::origin()]).unwrap();
        assert_eq!(small.find_k_nearest(&Point3f::new(1.0, 0.0, 0.0), 3).len(), 1);
    }

    #[test]
    fn test_radius_neighbors() {
        let index = RTreeIndex::new(&grid()).unwrap();
        let result = index.find_radius_neighbors(&Point3f::new(2.0, 2.0, 0.0), 1.0);
        let mut indices: Vec<usize> = result.iter().map(|&(idx, _)| idx).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![7, 11, 12, 13, 17]);
        assert_eq!(result[0].0, 12);
    }

    #[test]
    fn test_rtree_agrees_with_brute_force() {
        let mut rng = StdRng::seed_from_u64(7);
        let points: Vec<Point3f> = (0..500)
            .map(|_| Point3f::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0)))
            .collect();
        let rtree = RTreeIndex::new(&points).unwrap();
        let brute = BruteForceSearch::new(&points).unwrap();

        for _ in 0..50 {
            let query = Point3f::new(rng.gen_range(-12.0..12.0), rng.gen_range(-12.0..12.0), rng.gen_range(-12.0..12.0));
            let (_, a) = rtree.nearest(&query).unwrap();
            let (_, b) = brute.nearest(&query).unwrap();
            assert_relative_eq!(a, b, epsilon = 1e-5);
        }
    }
}
