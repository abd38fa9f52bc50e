//! Error types for the reconstruction stage.

use thiserror::Error;

/// Errors from highlight reconstruction.
#[derive(Debug, Error)]
pub enum ReconstructError {
    /// A working buffer could not be allocated or sized.
    ///
    /// Reconstruction needs several full-resolution scratch buffers;
    /// callers treat this as a signal to skip reconstruction and
    /// tone-map the unmodified input.
    #[error(transparent)]
    Core(#[from] filmic_core::CoreError),

    /// Input buffers disagree on dimensions.
    #[error("buffer size mismatch: {0}")]
    SizeMismatch(String),
}

/// Convenience alias for reconstruction results.
pub type Result<T> = std::result::Result<T, ReconstructError>;
