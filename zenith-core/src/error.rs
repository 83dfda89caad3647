//! Error types for zenith

use thiserror::Error;

/// Main error type for zenith operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid window configuration: {0}")]
    InvalidWindowConfig(String),

    #[error("Cannot build a spatial index from an empty point set")]
    EmptyIndex,

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown layer: {0}")]
    UnknownLayer(u32),
}

/// Result type alias for zenith operations
pub type Result<T> = std::result::Result<T, Error>;
