//! # filmic-math
//!
//! Math primitives for the filmic tone-mapping engine.
//!
//! The spline builder pins each curve segment with a handful of boundary
//! conditions (positions, slopes, curvatures), which turns into a small
//! dense linear system per segment. This crate provides the in-place
//! Gaussian-elimination solver for those systems, plus the scalar helpers
//! shared by the per-pixel code.
//!
//! # Usage
//!
//! ```rust
//! use filmic_math::gauss_solve;
//!
//! // 2x + y = 5 ; x - y = 1  =>  x = 2, y = 1
//! let mut a = [2.0, 1.0, 1.0, -1.0];
//! let mut b = [5.0, 1.0];
//! assert!(gauss_solve(&mut a, &mut b));
//! assert!((b[0] - 2.0).abs() < 1e-12);
//! assert!((b[1] - 1.0).abs() < 1e-12);
//! ```
//!
//! # Used By
//!
//! - `filmic-curve` - toe/shoulder polynomial coefficients

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod solve;

pub use solve::gauss_solve;

/// Clamps a value to [0, 1].
#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Squares a value.
#[inline]
pub fn sqf(x: f32) -> f32 {
    x * x
}

/// Linear interpolation between two values.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp01() {
        assert_eq!(clamp01(-0.5), 0.0);
        assert_eq!(clamp01(0.5), 0.5);
        assert_eq!(clamp01(1.5), 1.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
    }
}
