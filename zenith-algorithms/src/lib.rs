//! # Zenith Algorithms
//!
//! The rendering-independent core of the zenith viewer.
//!
//! This crate provides the spatial index adapters used for picking, the
//! temporal windower that drives animated playback, and the picking resolver
//! that turns a cursor position into the closest visible record.

pub mod nearest_neighbor;
pub mod windowing;
pub mod picking;

// Re-export commonly used items
pub use nearest_neighbor::*;
pub use windowing::*;
pub use picking::*;
