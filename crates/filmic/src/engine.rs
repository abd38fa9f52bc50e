//! Parameter commit: user parameters to per-frame derived data.
//!
//! The engine is built once per parameter change and then shared,
//! immutably, by every pixel loop of a frame. It owns the tone curve
//! and all the derived scalars the hot loops need, so nothing is
//! recomputed per pixel.

use filmic_curve::{FilmicParams, ToneCurve};
use filmic_math::sqf;
use filmic_reconstruct::ReconstructWeights;

use crate::error::Result;

/// Scalars derived from [`FilmicParams`] once per commit.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedParams {
    /// Scene middle grey as a linear fraction.
    pub grey_source: f32,
    /// Scene black point in EV, negative.
    pub black_source: f32,
    /// Scene dynamic range in EV.
    pub dynamic_range: f32,
    /// Display transfer exponent.
    pub output_power: f32,
    /// Desaturation strength factor, from the -50..50 user control.
    pub saturation: f32,
    /// Variance of the desaturation bump at the toe.
    pub sigma_toe: f32,
    /// Variance of the desaturation bump at the shoulder.
    pub sigma_shoulder: f32,
    /// Clipping threshold in scene-linear units.
    pub reconstruct_threshold: f32,
    /// Sigmoid feathering term of the clipping mask.
    pub reconstruct_feather: f32,
    /// Precomputed `feather / threshold` for the mask sigmoid.
    pub normalize: f32,
    /// Amplitude of the inpainted noise, before view-scale compensation.
    pub noise_level: f32,
    /// Blending weights of the wavelet resynthesis.
    pub weights: ReconstructWeights,
}

/// A committed tone-mapping configuration.
///
/// # Example
///
/// ```rust
/// use filmic::Engine;
/// use filmic_curve::FilmicParams;
///
/// let engine = Engine::new(FilmicParams::default()).unwrap();
/// assert!(!engine.curve().contrast_clamped());
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    params: FilmicParams,
    derived: DerivedParams,
    curve: ToneCurve,
}

impl Engine {
    /// Builds the curve and derives the per-frame scalars.
    ///
    /// Out-of-range parameters are pulled back to admissible values and
    /// reported through the curve's clamping diagnostic; the derived
    /// scalars come from the corrected copy so the pixel loops never see
    /// an inverted dynamic range.
    pub fn new(params: FilmicParams) -> Result<Self> {
        let (params, _) = params.sanitized();
        let curve = ToneCurve::build(&params)?;

        let grey_source = if params.custom_grey {
            params.grey_point_source / 100.0
        } else {
            0.1845
        };

        let reconstruct_threshold =
            (params.white_point_source + params.reconstruct_threshold).exp2() * grey_source;
        let reconstruct_feather = (12.0 / params.reconstruct_feather).exp2();

        let derived = DerivedParams {
            grey_source,
            black_source: params.black_point_source,
            dynamic_range: params.dynamic_range(),
            output_power: params.output_power,
            saturation: 2.0 * params.saturation / 100.0 + 1.0,
            sigma_toe: sqf(curve.latitude_min() / 3.0),
            sigma_shoulder: sqf((1.0 - curve.latitude_max()) / 3.0),
            reconstruct_threshold,
            reconstruct_feather,
            normalize: reconstruct_feather / reconstruct_threshold,
            noise_level: params.noise_level,
            weights: ReconstructWeights::from_user(
                params.reconstruct_structure_vs_texture,
                params.reconstruct_grey_vs_color,
                params.reconstruct_bloom_vs_details,
            ),
        };

        Ok(Self {
            params,
            derived,
            curve,
        })
    }

    /// The committed user parameters.
    #[inline]
    pub fn params(&self) -> &FilmicParams {
        &self.params
    }

    /// The derived per-frame scalars.
    #[inline]
    pub fn derived(&self) -> &DerivedParams {
        &self.derived
    }

    /// The built tone curve.
    #[inline]
    pub fn curve(&self) -> &ToneCurve {
        &self.curve
    }
}
