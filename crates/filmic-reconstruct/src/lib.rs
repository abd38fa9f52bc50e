//! # filmic-reconstruct
//!
//! Clipped-highlight reconstruction for the filmic tone mapper.
//!
//! Sensors clip; tone mapping clipped data produces flat magenta or white
//! patches. This crate rebuilds plausible content in those patches before
//! the curve runs:
//!
//! 1. [`mask`] detects clipped pixels and produces a soft weight mask
//! 2. [`noise`] inpaints seeded statistical noise over the clipped areas
//!    to give the diffusion something to chew on
//! 3. [`wavelets`] runs a multi-scale a-trous decomposition and
//!    resynthesizes the clipped areas from valid neighborhoods
//! 4. [`ratios`] splits an image into chromaticity ratios and norms for
//!    the optional high-quality refinement passes
//!
//! The blur kernel lives in [`bspline`]; all full-image loops parallelize
//! over rows with rayon.
//!
//! # Dependencies
//!
//! - [`filmic_core`] - buffers, norms, shared enums
//! - [`filmic_math`] - scalar helpers

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod bspline;
pub mod error;
pub mod mask;
pub mod noise;
pub mod ratios;
pub mod wavelets;

pub use bspline::blur_bspline;
pub use error::{ReconstructError, Result};
pub use mask::mask_clipped_pixels;
pub use noise::inpaint_noise;
pub use ratios::{compute_ratios, restore_ratios};
pub use wavelets::{reconstruct_highlights, scale_count, ReconstructMode, ReconstructWeights};
