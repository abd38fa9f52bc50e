//! Error types for the filmic engine.

use thiserror::Error;

/// Error type shared by the filmic crates.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid dimensions specified.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Buffers have incompatible sizes.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),

    /// A working buffer could not be allocated.
    #[error("allocation failed: {0}")]
    Allocation(String),
}

/// Result type for filmic operations.
pub type Result<T> = std::result::Result<T, CoreError>;
