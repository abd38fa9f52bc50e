//! # filmic
//!
//! Scene-to-display filmic tone mapping with highlight reconstruction.
//!
//! The engine converts scene-referred linear RGB, possibly containing
//! sensor-clipped highlights, into display-ready values: clipped areas
//! are rebuilt by a multi-scale wavelet pass, then every pixel goes
//! through a parametric S-shaped tone curve with extreme-luminance
//! desaturation and optional chroma preservation.
//!
//! # Usage
//!
//! ```rust
//! use filmic::{render, CpuBackend, Engine, RenderOptions};
//! use filmic_core::{RgbaBuffer, Roi};
//! use filmic_curve::FilmicParams;
//!
//! let engine = Engine::new(FilmicParams::default()).unwrap();
//! let input = RgbaBuffer::filled(64, 64, [0.1845, 0.1845, 0.1845, 1.0]);
//! let roi = Roi::full(64, 64);
//!
//! let (output, diagnostics) = render(
//!     &engine,
//!     &CpuBackend,
//!     &input,
//!     &roi,
//!     None,
//!     &RenderOptions::default(),
//! )
//! .unwrap();
//!
//! assert!(!diagnostics.reconstructed);
//! let px = output.pixel(0, 0);
//! assert!((px[0] - 0.1845).abs() < 1e-3); // grey maps to grey
//! ```
//!
//! # Architecture
//!
//! ```text
//! filmic (orchestration, backends, curve application)
//! ├── filmic-reconstruct (mask, noise, wavelets, ratios)
//! │   └── filmic-core
//! ├── filmic-curve (params, spline, tone functions)
//! │   ├── filmic-core
//! │   └── filmic-math
//! └── filmic-core (buffers, norms, roi)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod apply;
pub mod backend;
pub mod engine;
pub mod error;
pub mod pipeline;

pub use backend::{Backend, CpuBackend};
pub use engine::{DerivedParams, Engine};
pub use error::{FilmicError, Result};
pub use pipeline::{render, Diagnostics, RenderOptions};
