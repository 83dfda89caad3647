//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// Depth assigned to planar (x/y only) records so they sit on a common plane.
pub const PLANAR_Z: f32 = 1.0;

/// One input record: a position and the time it was observed at.
///
/// Sequences of timed points are expected to be sorted by `timestamp`
/// (non-decreasing). Nothing in zenith re-sorts them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedPoint {
    pub position: Point3f,
    pub timestamp: i64,
}

impl TimedPoint {
    pub fn new(position: Point3f, timestamp: i64) -> Self {
        Self { position, timestamp }
    }

    /// Build a record from 2D coordinates, placed on the `z = 1` plane
    pub fn planar(x: f32, y: f32, timestamp: i64) -> Self {
        Self {
            position: Point3f::new(x, y, PLANAR_Z),
            timestamp,
        }
    }
}

impl Default for TimedPoint {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            timestamp: 0,
        }
    }
}

impl From<TimedPoint> for Point3f {
    fn from(point: TimedPoint) -> Self {
        point.position
    }
}

/// Split a record sequence into its position and timestamp columns.
pub fn split_columns(points: &[TimedPoint]) -> (Vec<Point3f>, Vec<i64>) {
    points.iter().map(|p| (p.position, p.timestamp)).unzip()
}

/// Build planar positions from separate x and y columns.
///
/// Returns `None` if the columns differ in length.
pub fn planar_positions(xs: &[f32], ys: &[f32]) -> Option<Vec<Point3f>> {
    if xs.len() != ys.len() {
        return None;
    }
    Some(
        xs.iter()
            .zip(ys)
            .map(|(&x, &y)| Point3f::new(x, y, PLANAR_Z))
            .collect(),
    )
}
