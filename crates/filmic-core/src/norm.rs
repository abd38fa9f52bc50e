//! Pixel norms and the working-profile luminance seam.
//!
//! A *norm* collapses an RGB triple into one scalar brightness, independent
//! of chromaticity. The chroma-preserving tone-mapping path applies the
//! curve to a norm and reconstitutes channels from ratios, so the choice of
//! norm shapes the rendering of saturated colors.
//!
//! Any newly added norm must be linear with respect to grey pixels:
//! `norm(x, x, x) = x`. The desaturation code in chroma-preservation mode
//! relies on this. [`NormMethod::EuclideanV1`] breaks the rule (it maps
//! grey to `x * sqrt(3)`) and is kept for legacy renders only;
//! [`NormMethod::EuclideanV2`] rescales it so `norm(1, 1, 1) = 1`.

use serde::{Deserialize, Serialize};

/// Smallest admissible norm, 2^-16.
///
/// The first non-null 16-bit integer level: anything below is sensor noise
/// and would blow up `log2` toward -inf.
pub const NORM_MIN: f32 = 1.52587890625e-5;

const INVERSE_SQRT_3: f32 = 0.577_350_26;

/// Rec.709 luma weights, used when no working profile is available.
const REC709_LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Channel-combination norm selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormMethod {
    /// Maximum of the three channels.
    MaxRgb,
    /// Luminance from the working profile (or the Rec.709 fallback).
    Luminance,
    /// Power norm `(R³+G³+B³) / (R²+G²+B²)`, a perceptual-ish compromise.
    #[default]
    PowerNorm,
    /// Euclidean norm, unscaled. Legacy: `norm(x, x, x) = x * sqrt(3)`.
    EuclideanV1,
    /// Euclidean norm scaled by `1/sqrt(3)` so `norm(1, 1, 1) = 1`.
    EuclideanV2,
}

/// Working color profile handle.
///
/// The engine is agnostic of color management; the only operation it ever
/// needs from the host's profile is RGB to scalar luminance. Hosts
/// implement this on their profile type; when no profile is available the
/// engine falls back to [`luminance_rec709`].
pub trait LuminanceProfile: Sync {
    /// Returns the scalar luminance of a linear RGB triple.
    fn luminance(&self, rgb: [f32; 3]) -> f32;
}

/// Fallback luminance: Rec.709 luma weights on linear RGB.
#[inline]
pub fn luminance_rec709(rgb: [f32; 3]) -> f32 {
    REC709_LUMA[0] * rgb[0] + REC709_LUMA[1] * rgb[1] + REC709_LUMA[2] * rgb[2]
}

/// Luminance through the profile if present, Rec.709 otherwise.
#[inline]
pub fn profile_luminance(rgb: [f32; 3], profile: Option<&dyn LuminanceProfile>) -> f32 {
    match profile {
        Some(p) => p.luminance(rgb),
        None => luminance_rec709(rgb),
    }
}

#[inline]
fn sqf(x: f32) -> f32 {
    x * x
}

/// Power norm `(R³+G³+B³) / (R²+G²+B²)`.
///
/// A weird, sort-of-perceptual norm. The denominator is floored to avoid
/// division by zero (1e-6 squared).
#[inline]
fn pixel_rgb_norm_power(rgb: [f32; 3]) -> f32 {
    let mut numerator = 0.0f32;
    let mut denominator = 0.0f32;
    for c in 0..3 {
        let value = rgb[c].abs();
        let square = value * value;
        numerator += square * value;
        denominator += square;
    }
    numerator / denominator.max(1e-12)
}

/// Computes the selected norm of an RGB triple.
///
/// # Example
///
/// ```rust
/// use filmic_core::{pixel_norm, NormMethod};
///
/// let n = pixel_norm([0.5, 0.5, 0.5], NormMethod::MaxRgb, None);
/// assert_eq!(n, 0.5);
/// ```
#[inline]
pub fn pixel_norm(
    rgb: [f32; 3],
    method: NormMethod,
    profile: Option<&dyn LuminanceProfile>,
) -> f32 {
    match method {
        NormMethod::MaxRgb => rgb[0].max(rgb[1]).max(rgb[2]),
        NormMethod::Luminance => profile_luminance(rgb, profile),
        NormMethod::PowerNorm => pixel_rgb_norm_power(rgb),
        NormMethod::EuclideanV1 => (sqf(rgb[0]) + sqf(rgb[1]) + sqf(rgb[2])).sqrt(),
        NormMethod::EuclideanV2 => {
            (sqf(rgb[0]) + sqf(rgb[1]) + sqf(rgb[2])).sqrt() * INVERSE_SQRT_3
        }
    }
}

/// Statistical distribution of the noise injected into clipped highlights.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseDistribution {
    /// Uniform noise in `[mu - sigma, mu + sigma]`.
    Uniform,
    /// Gaussian noise of mean `mu` and deviation `sigma`.
    #[default]
    Gaussian,
    /// Poissonian noise approximated by a Gaussian whose deviation scales
    /// with `sqrt(mu)`, so brighter pixels shot more.
    Poissonian,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grey_linearity() {
        // norm(x, x, x) = x for every non-legacy norm
        for method in [
            NormMethod::MaxRgb,
            NormMethod::Luminance,
            NormMethod::PowerNorm,
            NormMethod::EuclideanV2,
        ] {
            let n = pixel_norm([0.42, 0.42, 0.42], method, None);
            assert_relative_eq!(n, 0.42, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_euclidean_v1_legacy_scaling() {
        let n = pixel_norm([1.0, 1.0, 1.0], NormMethod::EuclideanV1, None);
        assert_relative_eq!(n, 3f32.sqrt(), max_relative = 1e-6);
    }

    #[test]
    fn test_power_norm_zero_safe() {
        let n = pixel_norm([0.0, 0.0, 0.0], NormMethod::PowerNorm, None);
        assert_eq!(n, 0.0);
    }

    #[test]
    fn test_luminance_fallback() {
        let n = pixel_norm([1.0, 0.0, 0.0], NormMethod::Luminance, None);
        assert_relative_eq!(n, 0.2126, max_relative = 1e-6);
    }

    struct DoubledLuma;
    impl LuminanceProfile for DoubledLuma {
        fn luminance(&self, rgb: [f32; 3]) -> f32 {
            2.0 * luminance_rec709(rgb)
        }
    }

    #[test]
    fn test_profile_override() {
        let profile = DoubledLuma;
        let n = pixel_norm(
            [1.0, 0.0, 0.0],
            NormMethod::Luminance,
            Some(&profile as &dyn LuminanceProfile),
        );
        assert_relative_eq!(n, 0.4252, max_relative = 1e-6);
    }
}
