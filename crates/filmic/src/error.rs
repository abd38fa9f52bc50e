//! Error types for the engine crate.

use thiserror::Error;

/// Errors surfaced by the tone-mapping engine.
#[derive(Debug, Error)]
pub enum FilmicError {
    /// Curve construction hit a degenerate node layout.
    #[error(transparent)]
    Curve(#[from] filmic_curve::CurveError),

    /// Buffer allocation or sizing failed.
    #[error(transparent)]
    Core(#[from] filmic_core::CoreError),

    /// Highlight reconstruction failed outright.
    ///
    /// The render path downgrades reconstruction failures to a logged
    /// skip; this variant only escapes when reconstruction is invoked
    /// directly.
    #[error(transparent)]
    Reconstruct(#[from] filmic_reconstruct::ReconstructError),
}

/// Convenience alias for engine results.
pub type Result<T> = std::result::Result<T, FilmicError>;
