//! Camera transforms and screen-space projection

use nalgebra::{Matrix4, Point3, Vector4};
use serde::{Deserialize, Serialize};

/// A viewport rectangle in pixels: origin and extent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// A viewport anchored at the origin
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// The matrices used to draw one frame.
///
/// Vertices are transformed by `projection * view * model * rotation`, so
/// picking must go through the same composition to land on what was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTransform {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub rotation: Matrix4<f32>,
}

impl CameraTransform {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            model: Matrix4::identity(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            rotation: Matrix4::identity(),
        }
    }

    /// `view * model * rotation`
    pub fn model_view(&self) -> Matrix4<f32> {
        self.view * self.model * self.rotation
    }

    /// The full model-view-projection matrix
    pub fn mvp(&self) -> Matrix4<f32> {
        self.projection * self.model_view()
    }

    /// Map a world-space point to window coordinates.
    ///
    /// The returned `z` is the depth in `[0, 1]` for points inside the clip
    /// volume. Returns `None` when the point projects to infinity.
    pub fn project(&self, point: &Point3<f32>, viewport: &Viewport) -> Option<Point3<f32>> {
        let clip = self.mvp() * point.to_homogeneous();
        if clip.w == 0.0 {
            return None;
        }
        let ndc = clip / clip.w;
        Some(Point3::new(
            (ndc.x * 0.5 + 0.5) * viewport.width + viewport.x,
            (ndc.y * 0.5 + 0.5) * viewport.height + viewport.y,
            ndc.z * 0.5 + 0.5,
        ))
    }

    /// Map window coordinates plus a depth sample back into world space.
    ///
    /// Returns `None` for a degenerate viewport or a singular transform.
    pub fn unproject(&self, window: &Point3<f32>, viewport: &Viewport) -> Option<Point3<f32>> {
        if viewport.is_degenerate() {
            return None;
        }
        let inverse = self.mvp().try_inverse()?;
        let ndc = Vector4::new(
            (window.x - viewport.x) / viewport.width * 2.0 - 1.0,
            (window.y - viewport.y) / viewport.height * 2.0 - 1.0,
            window.z * 2.0 - 1.0,
            1.0,
        );
        let object = inverse * ndc;
        if object.w == 0.0 {
            return None;
        }
        Point3::from_homogeneous(object)
    }
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self::identity()
    }
}
