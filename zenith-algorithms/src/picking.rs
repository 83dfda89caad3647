//! Mouse picking against rendered datasets
//!
//! The cursor is mapped into framebuffer pixels, the depth buffer of the
//! frame that was just drawn is sampled there, and the resulting window
//! coordinate is unprojected into a single world-space query point. Every
//! pickable dataset is then searched for its nearest visible record and the
//! globally closest one under the distance threshold wins.

use std::ops::Range;

use nalgebra::{Point2, Point3, Vector2};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};
use zenith_core::{CameraTransform, NearestNeighborSearch, Point3f, Viewport};

/// Picks farther than this from the query point (in world units) are rejected
pub const DEFAULT_PICK_THRESHOLD: f32 = 0.5;

/// Record index reported when nothing was picked
pub const NO_MATCH_INDEX: i64 = -1000;

/// Coordinate used for every axis of the position reported when nothing was picked
pub const NO_MATCH_COORDINATE: f32 = -1000.0;

/// Distance reported when nothing was picked
pub const NO_MATCH_DISTANCE: f32 = 1000.0;

/// Per-frame window geometry from the windowing system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    /// Cursor position in window coordinates, Y growing downwards
    pub cursor: Point2<f32>,
    /// Window size in screen units
    pub viewport_size: Vector2<f32>,
    /// Framebuffer size in pixels; differs from the viewport on high-DPI displays
    pub framebuffer_size: Vector2<f32>,
}

impl FrameInput {
    pub fn new(cursor: Point2<f32>, viewport_size: Vector2<f32>, framebuffer_size: Vector2<f32>) -> Self {
        Self {
            cursor,
            viewport_size,
            framebuffer_size,
        }
    }

    /// Cursor position in framebuffer pixels with Y growing upwards.
    ///
    /// Returns `None` if either size is empty.
    pub fn framebuffer_pixel(&self) -> Option<Point2<f32>> {
        let valid = |size: &Vector2<f32>| size.x > 0.0 && size.y > 0.0;
        if !valid(&self.viewport_size) || !valid(&self.framebuffer_size) {
            return None;
        }
        let scale = self.framebuffer_size.component_div(&self.viewport_size);
        Some(Point2::new(
            self.cursor.x * scale.x,
            self.framebuffer_size.y - self.cursor.y * scale.y,
        ))
    }
}

/// Reads back the depth buffer of the current frame.
///
/// Must only be called after the scene has been rendered for this frame.
pub trait DepthSampler {
    /// Depth in `[0, 1]` at the given framebuffer pixel
    fn sample_depth(&self, x: u32, y: u32) -> f32;
}

impl<F> DepthSampler for F
where
    F: Fn(u32, u32) -> f32,
{
    fn sample_depth(&self, x: u32, y: u32) -> f32 {
        self(x, y)
    }
}

/// One dataset offered to the resolver for the current frame
pub struct PickCandidate<'a> {
    pub dataset: u32,
    pub index: &'a dyn NearestNeighborSearch,
    /// Positions the index was built from
    pub positions: &'a [Point3f],
    /// Records currently drawn; only these can be picked
    pub visible: Range<usize>,
}

/// A successful pick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickHit {
    pub dataset: u32,
    pub record_index: usize,
    pub position: Point3f,
    pub distance: f32,
}

/// Outcome of one picking pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PickResult {
    Match(PickHit),
    NoMatch,
}

impl PickResult {
    /// `(record index, position, distance)` reported for [`PickResult::NoMatch`]
    pub fn sentinel() -> (i64, Point3f, f32) {
        (
            NO_MATCH_INDEX,
            Point3f::new(NO_MATCH_COORDINATE, NO_MATCH_COORDINATE, NO_MATCH_COORDINATE),
            NO_MATCH_DISTANCE,
        )
    }

    pub fn hit(&self) -> Option<&PickHit> {
        match self {
            PickResult::Match(hit) => Some(hit),
            PickResult::NoMatch => None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.hit().is_some()
    }

    pub fn record_index(&self) -> i64 {
        match self {
            PickResult::Match(hit) => hit.record_index as i64,
            PickResult::NoMatch => NO_MATCH_INDEX,
        }
    }

    pub fn position(&self) -> Point3f {
        match self {
            PickResult::Match(hit) => hit.position,
            PickResult::NoMatch => Self::sentinel().1,
        }
    }

    pub fn distance(&self) -> f32 {
        match self {
            PickResult::Match(hit) => hit.distance,
            PickResult::NoMatch => NO_MATCH_DISTANCE,
        }
    }
}

/// Resolves the cursor to the closest record across all pickable datasets
///
/// The resolver owns no dataset; it only remembers the last picked
/// position so the renderer can highlight it on the next frame.
#[derive(Debug, Clone)]
pub struct PickingResolver {
    threshold: f32,
    highlight: Point3f,
}

impl PickingResolver {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            highlight: PickResult::sentinel().1,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Position picked in the most recent pass, or the no-match sentinel
    pub fn highlight(&self) -> Point3f {
        self.highlight
    }

    /// Run one picking pass.
    ///
    /// `camera` must be the transform the frame was rendered with and
    /// `depth` must read that frame's depth buffer.
    pub fn resolve<D>(
        &mut self,
        frame: &FrameInput,
        camera: &CameraTransform,
        depth: &D,
        candidates: &[PickCandidate<'_>],
    ) -> PickResult
    where
        D: DepthSampler + ?Sized,
    {
        let result = if candidates.is_empty() {
            PickResult::NoMatch
        } else {
            match query_point(frame, camera, depth) {
                Some(query) => self.closest(&query, candidates),
                None => {
                    trace!("cursor could not be unprojected");
                    PickResult::NoMatch
                }
            }
        };

        self.highlight = result.position();
        result
    }

    fn closest(&self, query: &Point3f, candidates: &[PickCandidate<'_>]) -> PickResult {
        let mut best: Option<PickHit> = None;

        for candidate in candidates {
            let Some((record_index, distance)) = self.nearest_visible(query, candidate) else {
                continue;
            };
            if !distance.is_finite() {
                continue;
            }
            let Some(&position) = candidate.positions.get(record_index) else {
                warn!(
                    dataset = candidate.dataset,
                    record_index, "spatial index returned a record outside its dataset"
                );
                continue;
            };
            // Strict comparison: the first dataset wins ties
            if best.map_or(true, |b| distance < b.distance) {
                best = Some(PickHit {
                    dataset: candidate.dataset,
                    record_index,
                    position,
                    distance,
                });
            }
        }

        match best {
            Some(hit) if hit.distance < self.threshold => {
                trace!(dataset = hit.dataset, record_index = hit.record_index, distance = hit.distance, "picked");
                PickResult::Match(hit)
            }
            _ => PickResult::NoMatch,
        }
    }

    fn nearest_visible(&self, query: &Point3f, candidate: &PickCandidate<'_>) -> Option<(usize, f32)> {
        let (record_index, distance) = candidate.index.nearest(query)?;
        if candidate.visible.contains(&record_index) {
            return Some((record_index, distance));
        }
        // Every visible record is at least this far away
        if distance >= self.threshold {
            return None;
        }
        candidate
            .index
            .find_radius_neighbors(query, self.threshold)
            .into_iter()
            .find(|(idx, _)| candidate.visible.contains(idx))
    }
}

impl Default for PickingResolver {
    fn default() -> Self {
        Self::new(DEFAULT_PICK_THRESHOLD)
    }
}

/// Unproject the cursor and its depth sample into world space
fn query_point<D>(frame: &FrameInput, camera: &CameraTransform, depth: &D) -> Option<Point3f>
where
    D: DepthSampler + ?Sized,
{
    let pixel = frame.framebuffer_pixel()?;
    let size = frame.framebuffer_size;
    let sample_x = pixel.x.min(size.x - 1.0).max(0.0) as u32;
    let sample_y = pixel.y.min(size.y - 1.0).max(0.0) as u32;
    let depth = depth.sample_depth(sample_x, sample_y).clamp(0.0, 1.0);

    camera.unproject(
        &Point3::new(pixel.x, pixel.y, depth),
        &Viewport::new(size.x, size.y),
    )
}
