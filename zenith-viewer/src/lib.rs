//! Interactive viewer core for time-stamped point data
//!
//! Rendering and windowing are left to the host; this crate keeps the
//! state that sits between them:
//! - Layers with temporal playback windows
//! - Orthographic and orbiting perspective cameras
//! - Cursor picking across layers
//! - Configuration and optional tracing setup

pub mod camera;
pub mod config;
pub mod layer;
pub mod playback;
pub mod telemetry;
pub mod viewer;

pub use camera::*;
pub use config::*;
pub use layer::*;
pub use playback::*;
pub use telemetry::init_default_tracing;
pub use viewer::*;

pub use zenith_algorithms::{DepthSampler, FrameInput, PickResult, TemporalWindow, WindowIndex};
pub use zenith_core::{Error, Point3f, Result, TimedPoint};
