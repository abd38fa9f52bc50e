//! # filmic-curve
//!
//! The parametric filmic tone curve.
//!
//! A filmic curve remaps log-encoded scene exposure to display luminance
//! through an "S" shape: a compressive *toe* near black, a linear middle
//! segment (the *latitude*), and a compressive *shoulder* near white. This
//! crate builds the curve from a handful of user parameters and provides
//! the stateless per-pixel tone functions that surround it:
//!
//! - [`FilmicParams`] - the user-facing parameter set (serde-friendly)
//! - [`ToneCurve`] - the built 5-node piecewise curve with per-segment
//!   coefficients and a contrast-clamping diagnostic
//! - [`log_encode`] / [`exp_decode`] - scene exposure to normalized log
//!   domain and back
//! - [`desaturate_v1`] / [`desaturate_v2`] - extreme-luminance
//!   desaturation weights
//!
//! # Usage
//!
//! ```rust
//! use filmic_curve::{FilmicParams, ToneCurve, log_encode};
//!
//! let params = FilmicParams::default();
//! let curve = ToneCurve::build(&params).unwrap();
//!
//! let x = log_encode(0.1845, 0.1845, -8.0, 12.0); // middle grey
//! let y = curve.evaluate(x);
//! assert!(y > 0.0 && y < 1.0);
//! ```
//!
//! # Dependencies
//!
//! - [`filmic_core`] - shared enums and constants
//! - [`filmic_math`] - Gaussian elimination for segment coefficients

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod params;
pub mod spline;
pub mod tone;

pub use params::{presets, ColorScience, CurveShape, FilmicParams, Preset};
pub use spline::{CurveError, SegmentCoeffs, ToneCurve, SAFETY_MARGIN};
pub use tone::{
    desaturate_v1, desaturate_v2, exp_decode, linear_saturation, log_encode, log_encode_clipped,
};
