//! Core data structures and traits for zenith
//!
//! This crate provides the fundamental types shared by the viewer core:
//! timed point records, the nearest-neighbour search contract, camera
//! transforms with unprojection, and the common error type.

pub mod point;
pub mod traits;
pub mod transform;
pub mod error;

pub use point::*;
pub use traits::*;
pub use transform::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};
