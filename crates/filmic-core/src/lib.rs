//! # filmic-core
//!
//! Core types for the filmic tone-mapping engine.
//!
//! This crate provides the foundational types used throughout the filmic-rs
//! workspace:
//!
//! - [`RgbaBuffer`] - Dense row-major 4-channel (RGB + alpha) f32 pixel buffer
//! - [`PlaneBuffer`] - Single-channel f32 buffer (masks, norms)
//! - [`Roi`] - Region-of-interest descriptor with display scale
//! - [`NormMethod`] - Channel-combination norms for pixel brightness
//! - [`LuminanceProfile`] - Working-color-profile handle (luminance only)
//!
//! # Design
//!
//! The engine works on scene-referred linear RGB: values proportional to
//! scene light, unbounded above 1.0. All buffers are plain `Vec<f32>` in
//! row-major order so downstream crates can slice them into rows for
//! parallel processing.
//!
//! # Crate Structure
//!
//! This crate is the foundation of filmic-rs and has no internal
//! dependencies. All other filmic-rs crates depend on `filmic-core`:
//!
//! ```text
//! filmic-core (this crate)
//!    ^
//!    |
//!    +-- filmic-math (linear systems)
//!    +-- filmic-curve (spline builder, tone functions)
//!    +-- filmic-reconstruct (highlight reconstruction)
//!    +-- filmic (pipeline orchestration)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod error;
pub mod norm;
pub mod roi;

pub use buffer::{PlaneBuffer, RgbaBuffer, CHANNELS};
pub use error::{CoreError, Result};
pub use norm::{
    luminance_rec709, pixel_norm, profile_luminance, LuminanceProfile, NoiseDistribution,
    NormMethod, NORM_MIN,
};
pub use roi::Roi;
