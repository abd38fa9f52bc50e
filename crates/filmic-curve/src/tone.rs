//! Per-pixel tone helpers surrounding the spline.
//!
//! Scene-referred values are mapped into a normalized log domain before
//! the curve, and the desaturation weights are computed there as well.
//! All functions are branch-light and `#[inline]`: they sit inside the
//! per-pixel loops of the application stage.

use filmic_core::NORM_MIN;
use filmic_math::clamp01;

/// Encodes a scene-referred value into the normalized log domain.
///
/// `0.0` is the scene black point, `1.0` the white point, and middle
/// grey lands at `-black_ev / dynamic_range`. The input is floored at
/// [`NORM_MIN`] so zero and negative values stay finite.
#[inline]
pub fn log_encode(x: f32, grey: f32, black_ev: f32, dynamic_range: f32) -> f32 {
    let x = x.max(NORM_MIN);
    clamp01(((x / grey).log2() - black_ev) / dynamic_range)
}

/// Legacy log encoding that never reaches exactly zero.
///
/// Same mapping as [`log_encode`], but the output is clipped to
/// `[NORM_MIN, 1]` instead of `[0, 1]`. The first chroma pipeline
/// divides by this value downstream, so it must stay strictly positive.
#[inline]
pub fn log_encode_clipped(x: f32, grey: f32, black_ev: f32, dynamic_range: f32) -> f32 {
    let x = x.max(NORM_MIN);
    (((x / grey).log2() - black_ev) / dynamic_range).clamp(NORM_MIN, 1.0)
}

/// Decodes a normalized log value back to scene-referred linear.
///
/// Exact inverse of [`log_encode`] inside the open interval.
#[inline]
pub fn exp_decode(x: f32, grey: f32, black_ev: f32, dynamic_range: f32) -> f32 {
    grey * (dynamic_range * x + black_ev).exp2()
}

/// Blends a channel towards its luminance by `1 - saturation`.
#[inline]
pub fn linear_saturation(x: f32, luminance: f32, saturation: f32) -> f32 {
    luminance + saturation * (x - luminance)
}

/// Desaturation factor near the log-domain extremes, first variant.
///
/// Two Gaussian keys centered on 0 and 1 push saturation down where the
/// curve compresses hardest. Returns a factor in `[0, 1]` to feed into
/// [`linear_saturation`].
#[inline]
pub fn desaturate_v1(x: f32, sigma_toe: f32, sigma_shoulder: f32, saturation: f32) -> f32 {
    let radius_toe = x;
    let radius_shoulder = 1.0 - x;
    let key_toe = (-0.5 * radius_toe * radius_toe / sigma_toe).exp();
    let key_shoulder = (-0.5 * radius_shoulder * radius_shoulder / sigma_shoulder).exp();
    1.0 - clamp01((key_toe + key_shoulder) / saturation)
}

/// Desaturation factor near the log-domain extremes, second variant.
///
/// Reworked falloff where the saturation parameter also widens the keys,
/// which keeps midtone saturation stable when the user pushes the
/// control hard.
#[inline]
pub fn desaturate_v2(x: f32, sigma_toe: f32, sigma_shoulder: f32, saturation: f32) -> f32 {
    let radius_toe = x;
    let radius_shoulder = 1.0 - x;
    let sat2 = 0.5 / saturation.sqrt();
    let key_toe = (-radius_toe * radius_toe / sigma_toe * sat2).exp();
    let key_shoulder = (-radius_shoulder * radius_shoulder / sigma_shoulder * sat2).exp();
    saturation - (key_toe + key_shoulder) * saturation
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const GREY: f32 = 0.1845;
    const BLACK_EV: f32 = -8.0;
    const DR: f32 = 12.0;

    #[test]
    fn test_log_encode_anchors() {
        // grey lands at |black| / DR, black point at 0, white point at 1
        assert_relative_eq!(log_encode(GREY, GREY, BLACK_EV, DR), 8.0 / 12.0, epsilon = 1e-6);
        let black = GREY * BLACK_EV.exp2();
        assert_relative_eq!(log_encode(black, GREY, BLACK_EV, DR), 0.0, epsilon = 1e-6);
        let white = GREY * 4.0f32.exp2();
        assert_relative_eq!(log_encode(white, GREY, BLACK_EV, DR), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_log_encode_clamps() {
        assert_eq!(log_encode(0.0, GREY, BLACK_EV, DR), 0.0);
        assert_eq!(log_encode(-1.0, GREY, BLACK_EV, DR), 0.0);
        assert_eq!(log_encode(1e6, GREY, BLACK_EV, DR), 1.0);
        assert!(log_encode_clipped(0.0, GREY, BLACK_EV, DR) >= filmic_core::NORM_MIN);
    }

    #[test]
    fn test_exp_decode_inverts() {
        for ev in [-7.0f32, -4.0, 0.0, 2.0, 3.9] {
            let x = GREY * ev.exp2();
            let enc = log_encode(x, GREY, BLACK_EV, DR);
            assert_relative_eq!(exp_decode(enc, GREY, BLACK_EV, DR), x, max_relative = 1e-5);
        }
    }

    #[test]
    fn test_desaturate_full_at_extremes() {
        let sigma_toe = filmic_math::sqf(0.2 / 3.0);
        let sigma_shoulder = filmic_math::sqf(0.2 / 3.0);

        // v1: midtones keep saturation, extremes lose it
        let mid = desaturate_v1(0.5, sigma_toe, sigma_shoulder, 1.0);
        let toe = desaturate_v1(0.0, sigma_toe, sigma_shoulder, 1.0);
        assert!(mid > 0.99);
        assert!(toe < 0.01);

        // v2 behaves the same way with its own scale
        let mid2 = desaturate_v2(0.5, sigma_toe, sigma_shoulder, 1.0);
        let toe2 = desaturate_v2(0.0, sigma_toe, sigma_shoulder, 1.0);
        assert!(mid2 > 0.99);
        assert!(toe2 < 0.01);
    }

    #[test]
    fn test_linear_saturation() {
        assert_eq!(linear_saturation(0.8, 0.5, 1.0), 0.8);
        assert_eq!(linear_saturation(0.8, 0.5, 0.0), 0.5);
        assert_relative_eq!(linear_saturation(0.8, 0.5, 0.5), 0.65);
    }
}
