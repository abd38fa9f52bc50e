//! User-facing parameters for the filmic tone mapper.
//!
//! The parameter set mirrors what a raw developer exposes in its UI:
//! scene white/black exposure, look controls (contrast, latitude,
//! saturation, balance), display targets, and the highlight
//! reconstruction knobs. Everything serializes with serde so presets
//! and sidecar files round-trip cleanly.

use filmic_core::{NoiseDistribution, NormMethod};
use serde::{Deserialize, Serialize};

/// Polynomial family used for the toe and shoulder segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveShape {
    /// Fourth-order polynomial. Hardest roll-off, can overshoot.
    Poly4,
    /// Third-order polynomial. Softer roll-off, can still overshoot.
    Poly3,
    /// Rational segment. Monotone by construction, never overshoots.
    #[default]
    Rational,
}

/// Chrominance handling version for the curve application stage.
///
/// Later versions preserve hue better at the cost of more work per
/// pixel. `V1` and `V2`/`V3` without a norm fall back to applying the
/// curve per channel with luminance-masked desaturation; `V2`/`V3` with
/// a norm tone-map a single scalar and rebuild RGB from ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScience {
    /// Original chroma handling, desaturation in display space.
    V1,
    /// Desaturation in log space, ratio-preserving tone mapping.
    V2,
    /// Like `V2` plus renormalized ratios before scaling.
    #[default]
    V3,
}

/// Full parameter set for one filmic rendering.
///
/// Exposure values are in EV relative to `grey_source`; percentages are
/// in the 0..100 UI range unless noted. Defaults reproduce a neutral
/// starting point with about 12 EV of dynamic range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilmicParams {
    /// Scene-referred middle grey, percent (18.45 = standard grey card).
    pub grey_point_source: f32,
    /// Scene black relative exposure, EV below grey (negative).
    pub black_point_source: f32,
    /// Scene white relative exposure, EV above grey (positive).
    pub white_point_source: f32,
    /// Clipping threshold offset, EV above the white point.
    pub reconstruct_threshold: f32,
    /// Transition softness around the clipping threshold, EV.
    pub reconstruct_feather: f32,
    /// Bloom vs. details balance, -100..100.
    pub reconstruct_bloom_vs_details: f32,
    /// Grey vs. color balance, -100..100.
    pub reconstruct_grey_vs_color: f32,
    /// Structure vs. texture balance, -100..100.
    pub reconstruct_structure_vs_texture: f32,
    /// Display-referred middle grey target, percent.
    pub grey_point_target: f32,
    /// Display black target, percent.
    pub black_point_target: f32,
    /// Display white target, percent.
    pub white_point_target: f32,
    /// Display gamma / output power function exponent.
    pub output_power: f32,
    /// Latitude, percent of the dynamic range kept linear.
    pub latitude: f32,
    /// Slope of the linear mid-section, unitless.
    pub contrast: f32,
    /// Extreme-luminance desaturation strength, -50..50.
    pub saturation: f32,
    /// Shadows/highlights latitude balance, -50..50.
    pub balance: f32,
    /// Amplitude of the noise inpainted over clipped areas.
    pub noise_level: f32,
    /// Chrominance preservation norm, `None` applies the curve per channel.
    pub preserve_color: Option<NormMethod>,
    /// Chrominance handling version.
    pub version: ColorScience,
    /// Use `grey_point_source` as-is instead of the fixed 18.45% pivot.
    pub custom_grey: bool,
    /// Extra multi-scale refinement passes over reconstructed areas.
    pub high_quality_reconstruction: u32,
    /// Statistical distribution of the inpainted noise.
    pub noise_distribution: NoiseDistribution,
    /// Shadows segment polynomial family.
    pub shadows: CurveShape,
    /// Highlights segment polynomial family.
    pub highlights: CurveShape,
}

impl Default for FilmicParams {
    fn default() -> Self {
        Self {
            grey_point_source: 18.45,
            black_point_source: -8.0,
            white_point_source: 4.0,
            reconstruct_threshold: 3.0,
            reconstruct_feather: 3.0,
            reconstruct_bloom_vs_details: 100.0,
            reconstruct_grey_vs_color: 100.0,
            reconstruct_structure_vs_texture: 0.0,
            grey_point_target: 18.45,
            black_point_target: 0.015_176_34,
            white_point_target: 100.0,
            output_power: 4.0,
            latitude: 50.0,
            contrast: 1.1,
            saturation: 0.0,
            balance: 0.0,
            noise_level: 0.2,
            preserve_color: Some(NormMethod::PowerNorm),
            version: ColorScience::V3,
            custom_grey: false,
            high_quality_reconstruction: 1,
            noise_distribution: NoiseDistribution::Gaussian,
            shadows: CurveShape::Rational,
            highlights: CurveShape::Rational,
        }
    }
}

/// Lowest admissible scene white point, EV above grey.
const WHITE_EV_MIN: f32 = 0.1;
/// Highest admissible scene black point, EV below grey.
const BLACK_EV_MAX: f32 = -0.1;
/// Lowest admissible output power.
const HARDNESS_MIN: f32 = 0.1;

impl FilmicParams {
    /// Scene dynamic range in EV.
    #[inline]
    pub fn dynamic_range(&self) -> f32 {
        self.white_point_source - self.black_point_source
    }

    /// Returns a copy with out-of-range values pulled back to the nearest
    /// admissible ones, and whether anything moved.
    ///
    /// Inconsistent parameters are never fatal: the curve is built from
    /// the corrected copy and the clamping diagnostic reports the
    /// correction, so a host UI can warn instead of failing the render.
    pub fn sanitized(&self) -> (Self, bool) {
        let mut p = self.clone();
        p.white_point_source = p.white_point_source.max(WHITE_EV_MIN);
        p.black_point_source = p.black_point_source.min(BLACK_EV_MAX);
        p.output_power = p.output_power.max(HARDNESS_MIN);
        let changed = p != *self;
        (p, changed)
    }
}

/// A named starting point for common shooting conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Around 10 EV, typical daylight scenes.
    StandardDaylight,
    /// Around 13.5 EV, backlit or high-contrast scenes.
    BacklitHdr,
    /// Around 7.5 EV, flat overcast or studio light.
    LowContrast,
}

/// Preset parameter sets.
///
/// Each preset only moves the scene white/black points and contrast;
/// look controls keep their defaults so presets compose with user edits.
pub mod presets {
    use super::{FilmicParams, Preset};

    /// Returns the parameter set for a preset.
    pub fn params(preset: Preset) -> FilmicParams {
        match preset {
            Preset::StandardDaylight => FilmicParams {
                white_point_source: 3.5,
                black_point_source: -6.5,
                contrast: 1.2,
                ..FilmicParams::default()
            },
            Preset::BacklitHdr => FilmicParams {
                white_point_source: 5.5,
                black_point_source: -8.0,
                contrast: 1.0,
                ..FilmicParams::default()
            },
            Preset::LowContrast => FilmicParams {
                white_point_source: 2.5,
                black_point_source: -5.0,
                contrast: 1.4,
                ..FilmicParams::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dynamic_range() {
        let p = FilmicParams::default();
        assert_eq!(p.dynamic_range(), 12.0);
    }

    #[test]
    fn test_serde_roundtrip() {
        let p = presets::params(Preset::BacklitHdr);
        let json = serde_json::to_string(&p).unwrap();
        let back: FilmicParams = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn test_sanitized_pulls_back_invalid_points() {
        let bad = FilmicParams {
            white_point_source: -1.0,
            output_power: 0.0,
            ..FilmicParams::default()
        };
        let (p, changed) = bad.sanitized();
        assert!(changed);
        assert!(p.white_point_source > 0.0);
        assert!(p.output_power > 0.0);
        assert!(p.dynamic_range() > 0.0);

        let (_, changed) = FilmicParams::default().sanitized();
        assert!(!changed);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let p: FilmicParams = serde_json::from_str(r#"{"contrast": 1.5}"#).unwrap();
        assert_eq!(p.contrast, 1.5);
        assert_eq!(p.white_point_source, 4.0);
        assert_eq!(p.version, ColorScience::V3);
    }
}
