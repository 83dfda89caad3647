//! Camera state and mouse controls for 2D and 3D views

use nalgebra::{Matrix4, Orthographic3, Perspective3, Point2, Point3, Rotation3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use zenith_algorithms::FrameInput;
use zenith_core::CameraTransform;

use crate::config::CameraConfig;

/// Eye distance of orthographic views
const PLANAR_EYE_Z: f32 = 5.0;

/// Orthographic clip planes
const PLANAR_NEAR: f32 = 0.9;
const PLANAR_FAR: f32 = 100.0;

/// Perspective views always look at this depth
const LOOK_AT_DEPTH: f32 = -1000.0;

/// Smallest zoom an orthographic view can reach, and the fine step used below 1
const MIN_PLANAR_ZOOM: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionKind {
    Orthographic,
    Perspective,
}

/// Whether right-dragging rotates the model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RotationPolicy {
    Fixed,
    Orbit { speed: f32 },
}

/// Mouse button and modifier state for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MouseButtons {
    pub left: bool,
    pub right: bool,
    pub shift: bool,
}

/// Everything needed to rebuild the camera transform each frame
///
/// Passed by reference to playback and picking instead of living in
/// global state.
#[derive(Debug, Clone)]
pub struct CameraState {
    projection: ProjectionKind,
    rotation_policy: RotationPolicy,
    config: CameraConfig,
    zoom: f32,
    model: Matrix4<f32>,
    angle_x: f32,
    angle_y: f32,
    pan_anchor: Option<Point2<f32>>,
    rotate_anchor: Option<Point2<f32>>,
}

impl CameraState {
    pub fn new(projection: ProjectionKind, rotation_policy: RotationPolicy, config: CameraConfig) -> Self {
        Self {
            projection,
            rotation_policy,
            config,
            zoom: config.initial_zoom,
            model: Matrix4::identity(),
            angle_x: 0.0,
            angle_y: 0.0,
            pan_anchor: None,
            rotate_anchor: None,
        }
    }

    /// Orthographic camera without rotation, for x/y data
    pub fn planar(config: CameraConfig) -> Self {
        Self::new(ProjectionKind::Orthographic, RotationPolicy::Fixed, config)
    }

    /// Perspective camera that orbits on right-drag
    pub fn spatial(config: CameraConfig) -> Self {
        let speed = config.rotate_speed;
        Self::new(ProjectionKind::Perspective, RotationPolicy::Orbit { speed }, config)
    }

    pub fn projection(&self) -> ProjectionKind {
        self.projection
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        self.rotation_policy
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Accumulated rotation around the Y and X axes, in radians
    pub fn angles(&self) -> (f32, f32) {
        (self.angle_x, self.angle_y)
    }

    /// Model translation accumulated from panning
    pub fn translation(&self) -> Vector3<f32> {
        self.model.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Apply a scroll wheel delta
    pub fn scroll(&mut self, delta: f32) {
        if !delta.is_finite() || delta == 0.0 {
            return;
        }
        match self.projection {
            ProjectionKind::Orthographic => {
                if self.zoom + delta > 1.0 {
                    self.zoom += delta;
                } else {
                    // Fine steps once zoomed in close
                    let change = delta.signum() * MIN_PLANAR_ZOOM;
                    self.zoom = (self.zoom + change).max(MIN_PLANAR_ZOOM);
                }
            }
            ProjectionKind::Perspective => {
                let closest = LOOK_AT_DEPTH + 1.0;
                self.zoom = (self.zoom - delta / 2.0).max(closest);
            }
        }
    }

    /// How far a full-window drag pans, in world units
    pub fn mouse_speed(&self, framebuffer: Vector2<f32>) -> f32 {
        match self.projection {
            ProjectionKind::Orthographic => self.zoom,
            ProjectionKind::Perspective => {
                if framebuffer.y > 0.0 {
                    self.zoom.abs() * framebuffer.x / framebuffer.y
                } else {
                    0.0
                }
            }
        }
    }

    /// Feed the cursor for this frame: left-drag pans, right-drag orbits.
    ///
    /// Shift suppresses panning.
    pub fn handle_cursor(&mut self, frame: &FrameInput, buttons: MouseButtons) {
        self.pan(frame, buttons);
        self.rotate(frame, buttons);
    }

    fn pan(&mut self, frame: &FrameInput, buttons: MouseButtons) {
        let cursor = frame.cursor;
        if !buttons.left {
            self.pan_anchor = Some(cursor);
            return;
        }
        if buttons.shift {
            return;
        }
        let anchor = self.pan_anchor.replace(cursor).unwrap_or(cursor);
        let size = frame.viewport_size;
        if size.x <= 0.0 || size.y <= 0.0 {
            return;
        }

        let speed = self.mouse_speed(frame.framebuffer_size);
        let change_x = (anchor.x - cursor.x) / size.x * speed;
        let change_y = (anchor.y - cursor.y) / size.y * speed;
        self.model *= Matrix4::new_translation(&Vector3::new(-change_x, change_y, 0.0));
    }

    fn rotate(&mut self, frame: &FrameInput, buttons: MouseButtons) {
        let RotationPolicy::Orbit { speed } = self.rotation_policy else {
            return;
        };
        let cursor = frame.cursor;
        let anchor = self.rotate_anchor.replace(cursor).unwrap_or(cursor);
        let size = frame.viewport_size;
        if !buttons.right || size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        self.angle_x += (anchor.x - cursor.x) / size.x * speed;
        self.angle_y += (anchor.y - cursor.y) / size.y * speed;
    }

    /// Build the transform for a framebuffer of the given size
    pub fn transform(&self, framebuffer: Vector2<f32>) -> CameraTransform {
        let width = framebuffer.x.max(1.0);
        let height = framebuffer.y.max(1.0);

        let (view, projection) = match self.projection {
            ProjectionKind::Orthographic => {
                let factor = self.zoom / ((width + height) / 2.0);
                let half_width = width / 2.0 * factor;
                let half_height = height / 2.0 * factor;
                let projection = Orthographic3::new(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    PLANAR_NEAR,
                    PLANAR_FAR,
                );
                let eye = Point3::new(0.0, 0.0, PLANAR_EYE_Z);
                let view = Matrix4::look_at_rh(&eye, &(eye - Vector3::z()), &Vector3::y());
                (view, projection.to_homogeneous())
            }
            ProjectionKind::Perspective => {
                let projection = Perspective3::new(
                    width / height,
                    self.config.fov_degrees.to_radians(),
                    self.config.near,
                    self.config.far,
                );
                let view = Matrix4::look_at_rh(
                    &Point3::new(0.0, 0.0, self.zoom),
                    &Point3::new(0.0, 0.0, LOOK_AT_DEPTH),
                    &Vector3::y(),
                );
                (view, projection.to_homogeneous())
            }
        };

        CameraTransform {
            model: self.model,
            view,
            projection,
            rotation: self.rotation_matrix(),
        }
    }

    fn rotation_matrix(&self) -> Matrix4<f32> {
        match self.rotation_policy {
            RotationPolicy::Fixed => Matrix4::identity(),
            RotationPolicy::Orbit { .. } => {
                let around_y = Rotation3::from_axis_angle(&Vector3::y_axis(), self.angle_x);
                let around_x = Rotation3::from_axis_angle(&Vector3::x_axis(), self.angle_y);
                (around_y * around_x).to_homogeneous()
            }
        }
    }
}

impl Default for CameraState {
    fn default() -> Self {
        Self::planar(CameraConfig::default())
    }
}
