//! Piecewise tone curve construction and evaluation.
//!
//! The curve lives in normalized coordinates: x is the log-encoded scene
//! exposure in [0, 1], y the display luminance before the output power
//! function. Five nodes pin it down: black, toe, grey, shoulder, white.
//! Between toe and shoulder the curve is the straight contrast line; on
//! each side a polynomial or rational segment joins the line to the
//! display black/white with matched value and slope.
//!
//! Polynomial segments come from small linear systems solved with
//! [`filmic_math::gauss_solve`]; the rational segments have a closed
//! form and are monotone by construction.

use filmic_math::gauss_solve;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::{CurveShape, FilmicParams};

/// Margin keeping toe and shoulder nodes strictly inside the display range.
pub const SAFETY_MARGIN: f32 = 0.01;

/// Errors from curve construction.
///
/// Out-of-range parameters are not errors; they are clamped and reported
/// through the curve's clamping diagnostic.
#[derive(Debug, Error)]
pub enum CurveError {
    /// The node layout degenerated and a segment system became singular.
    #[error("degenerate curve nodes: {0}")]
    DegenerateNodes(String),
}

/// Coefficients of one curved segment (toe or shoulder).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SegmentCoeffs {
    /// Third-order polynomial, coefficients in ascending powers of x.
    Poly3([f32; 4]),
    /// Fourth-order polynomial, coefficients in ascending powers of x.
    Poly4([f32; 5]),
    /// Rational segment `pivot -/+ a * r / (r + c)` with
    /// `r = xi * (xi * b + 1)` and xi the distance to the joining node.
    Rational {
        /// Numerator scale, `c * contrast`.
        a: f32,
        /// Quadratic term of the distance polynomial.
        b: f32,
        /// Denominator offset controlling the asymptote.
        c: f32,
        /// Display value at the joining node.
        pivot: f32,
    },
}

/// A built tone curve, ready for per-pixel evaluation.
///
/// Construction happens once per parameter change; [`evaluate`] runs per
/// pixel and is branch-cheap. The x/y node arrays are kept around for
/// diagnostics and plotting.
///
/// [`evaluate`]: ToneCurve::evaluate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToneCurve {
    /// Node abscissae: black, toe, grey, shoulder, white.
    pub nodes_x: [f32; 5],
    /// Node ordinates in display space (before the output power).
    pub nodes_y: [f32; 5],
    latitude_min: f32,
    latitude_max: f32,
    slope: f32,
    intercept: f32,
    toe: SegmentCoeffs,
    shoulder: SegmentCoeffs,
    contrast_clamped: bool,
}

impl ToneCurve {
    /// Builds the curve from user parameters.
    ///
    /// The requested contrast is converted to a slope of the display-space
    /// line through grey, then clamped so the line can still reach the
    /// display black and white inside [0, 1]. Sign-invalid scene exposure
    /// points and a non-positive output power are pulled back to the
    /// nearest admissible values the same way. When any of these clamps
    /// engage, [`contrast_clamped`](ToneCurve::contrast_clamped) reports
    /// it so a UI can warn the user; only a degenerate node layout is an
    /// error.
    pub fn build(params: &FilmicParams) -> Result<Self, CurveError> {
        let (sanitized, inputs_clamped) = params.sanitized();
        let p = &sanitized;

        let hardness = p.output_power;
        let grey_display = if p.custom_grey {
            (p.grey_point_target
                .clamp(p.black_point_target, p.white_point_target)
                / 100.0)
                .powf(1.0 / hardness)
        } else {
            0.1845_f32.powf(1.0 / hardness)
        };

        let dynamic_range = p.dynamic_range();

        // abscissae after log encoding
        let black_log = 0.0_f32;
        let grey_log = p.black_point_source.abs() / dynamic_range;
        let white_log = 1.0_f32;

        // display targets, brought back before the output power function
        let black_display =
            (p.black_point_target.clamp(0.0, p.grey_point_target) / 100.0).powf(1.0 / hardness);
        let white_display =
            (p.white_point_target.max(p.grey_point_target) / 100.0).powf(1.0 / hardness);

        let balance = p.balance.clamp(-50.0, 50.0) / 100.0;
        let latitude = p.latitude.clamp(0.0, 100.0) / 100.0;

        // slope at grey depends on contrast only; solve for the slope of
        // the pre-power line that yields it after the power function
        let slope = p.contrast * dynamic_range / 8.0;
        let mut min_contrast = 1.0_f32;
        min_contrast = min_contrast.max((white_display - grey_display) / (white_log - grey_log));
        min_contrast = min_contrast.max((grey_display - black_display) / (grey_log - black_log));
        min_contrast += SAFETY_MARGIN;

        let contrast = slope / (hardness * grey_display.powf(hardness - 1.0));
        let clamped_contrast = contrast.clamp(min_contrast, 100.0);
        let contrast_clamped = clamped_contrast != contrast;
        let contrast = clamped_contrast;

        let intercept = grey_display - contrast * grey_log;

        // x positions where the contrast line meets the display bounds
        let xmin = (black_display + SAFETY_MARGIN * (white_display - black_display) - intercept)
            / contrast;
        let xmax = (white_display - SAFETY_MARGIN * (white_display - black_display) - intercept)
            / contrast;

        let mut toe_log = (1.0 - latitude) * grey_log + latitude * xmin;
        let mut shoulder_log = (1.0 - latitude) * grey_log + latitude * xmax;

        // latitude balance slides both nodes along the line
        let balance_correction = if balance > 0.0 {
            2.0 * balance * (shoulder_log - grey_log)
        } else {
            2.0 * balance * (grey_log - toe_log)
        };
        toe_log = (toe_log - balance_correction).max(xmin);
        shoulder_log = (shoulder_log - balance_correction).min(xmax);

        let toe_display = toe_log * contrast + intercept;
        let shoulder_display = shoulder_log * contrast + intercept;

        let nodes_x = [black_log, toe_log, grey_log, shoulder_log, white_log];
        let nodes_y = [
            black_display,
            toe_display,
            grey_display,
            shoulder_display,
            white_display,
        ];

        let toe = solve_toe(p.shadows, &nodes_x, &nodes_y, contrast)?;
        let shoulder = solve_shoulder(p.highlights, &nodes_x, &nodes_y, contrast)?;

        Ok(Self {
            nodes_x,
            nodes_y,
            latitude_min: toe_log,
            latitude_max: shoulder_log,
            slope: contrast,
            intercept,
            toe,
            shoulder,
            contrast_clamped: contrast_clamped || inputs_clamped,
        })
    }

    /// Evaluates the curve at a log-encoded abscissa.
    ///
    /// The output is display luminance before the output power function
    /// and is not clamped; callers clamp once after this.
    #[inline]
    pub fn evaluate(&self, x: f32) -> f32 {
        if x < self.latitude_min {
            match self.toe {
                SegmentCoeffs::Poly3(c) => c[0] + x * (c[1] + x * (c[2] + x * c[3])),
                SegmentCoeffs::Poly4(c) => {
                    c[0] + x * (c[1] + x * (c[2] + x * (c[3] + x * c[4])))
                }
                SegmentCoeffs::Rational { a, b, c, pivot } => {
                    let xi = self.latitude_min - x;
                    let rat = xi * (xi * b + 1.0);
                    pivot - a * rat / (rat + c)
                }
            }
        } else if x > self.latitude_max {
            match self.shoulder {
                SegmentCoeffs::Poly3(c) => c[0] + x * (c[1] + x * (c[2] + x * c[3])),
                SegmentCoeffs::Poly4(c) => {
                    c[0] + x * (c[1] + x * (c[2] + x * (c[3] + x * c[4])))
                }
                SegmentCoeffs::Rational { a, b, c, pivot } => {
                    let xi = x - self.latitude_max;
                    let rat = xi * (xi * b + 1.0);
                    pivot + a * rat / (rat + c)
                }
            }
        } else {
            self.intercept + x * self.slope
        }
    }

    /// Lower bound of the linear latitude, in log coordinates.
    #[inline]
    pub fn latitude_min(&self) -> f32 {
        self.latitude_min
    }

    /// Upper bound of the linear latitude, in log coordinates.
    #[inline]
    pub fn latitude_max(&self) -> f32 {
        self.latitude_max
    }

    /// Slope of the linear mid-section in display space.
    #[inline]
    pub fn slope(&self) -> f32 {
        self.slope
    }

    /// True if the requested contrast, scene exposure points, or output
    /// power had to be clamped to keep the curve inside the display range.
    #[inline]
    pub fn contrast_clamped(&self) -> bool {
        self.contrast_clamped
    }
}

fn solve_toe(
    shape: CurveShape,
    x: &[f32; 5],
    y: &[f32; 5],
    slope: f32,
) -> Result<SegmentCoeffs, CurveError> {
    let tl = f64::from(x[1]);
    let tl2 = tl * tl;
    let tl3 = tl2 * tl;
    let tl4 = tl3 * tl;

    match shape {
        CurveShape::Poly4 => {
            // position and slope at both ends, zero curvature at the node
            let mut a = [
                0.0, 0.0, 0.0, 0.0, 1.0, //
                0.0, 0.0, 0.0, 1.0, 0.0, //
                tl4, tl3, tl2, tl, 1.0, //
                4.0 * tl3, 3.0 * tl2, 2.0 * tl, 1.0, 0.0, //
                12.0 * tl2, 6.0 * tl, 2.0, 0.0, 0.0,
            ];
            let mut b = [f64::from(y[0]), 0.0, f64::from(y[1]), f64::from(slope), 0.0];
            if !gauss_solve(&mut a, &mut b) {
                return Err(CurveError::DegenerateNodes("toe system is singular".into()));
            }
            // solutions come back highest order first
            Ok(SegmentCoeffs::Poly4([
                b[4] as f32,
                b[3] as f32,
                b[2] as f32,
                b[1] as f32,
                b[0] as f32,
            ]))
        }
        CurveShape::Poly3 => {
            let mut a = [
                0.0, 0.0, 0.0, 1.0, //
                tl3, tl2, tl, 1.0, //
                3.0 * tl2, 2.0 * tl, 1.0, 0.0, //
                6.0 * tl, 2.0, 0.0, 0.0,
            ];
            let mut b = [f64::from(y[0]), f64::from(y[1]), f64::from(slope), 0.0];
            if !gauss_solve(&mut a, &mut b) {
                return Err(CurveError::DegenerateNodes("toe system is singular".into()));
            }
            Ok(SegmentCoeffs::Poly3([
                b[3] as f32,
                b[2] as f32,
                b[1] as f32,
                b[0] as f32,
            ]))
        }
        CurveShape::Rational => Ok(rational_coeffs(
            x[1] - x[0],
            y[1] - y[0],
            slope,
            y[1],
        )),
    }
}

fn solve_shoulder(
    shape: CurveShape,
    x: &[f32; 5],
    y: &[f32; 5],
    slope: f32,
) -> Result<SegmentCoeffs, CurveError> {
    let sl = f64::from(x[3]);
    let sl2 = sl * sl;
    let sl3 = sl2 * sl;
    let sl4 = sl3 * sl;

    match shape {
        CurveShape::Poly3 => {
            let mut a = [
                1.0, 1.0, 1.0, 1.0, //
                sl3, sl2, sl, 1.0, //
                3.0 * sl2, 2.0 * sl, 1.0, 0.0, //
                6.0 * sl, 2.0, 0.0, 0.0,
            ];
            let mut b = [f64::from(y[4]), f64::from(y[3]), f64::from(slope), 0.0];
            if !gauss_solve(&mut a, &mut b) {
                return Err(CurveError::DegenerateNodes(
                    "shoulder system is singular".into(),
                ));
            }
            Ok(SegmentCoeffs::Poly3([
                b[3] as f32,
                b[2] as f32,
                b[1] as f32,
                b[0] as f32,
            ]))
        }
        CurveShape::Poly4 => {
            // extra condition: flat slope at the white point
            let mut a = [
                1.0, 1.0, 1.0, 1.0, 1.0, //
                4.0, 3.0, 2.0, 1.0, 0.0, //
                sl4, sl3, sl2, sl, 1.0, //
                4.0 * sl3, 3.0 * sl2, 2.0 * sl, 1.0, 0.0, //
                12.0 * sl2, 6.0 * sl, 2.0, 0.0, 0.0,
            ];
            let mut b = [f64::from(y[4]), 0.0, f64::from(y[3]), f64::from(slope), 0.0];
            if !gauss_solve(&mut a, &mut b) {
                return Err(CurveError::DegenerateNodes(
                    "shoulder system is singular".into(),
                ));
            }
            Ok(SegmentCoeffs::Poly4([
                b[4] as f32,
                b[3] as f32,
                b[2] as f32,
                b[1] as f32,
                b[0] as f32,
            ]))
        }
        CurveShape::Rational => Ok(rational_coeffs(
            x[4] - x[3],
            y[4] - y[3],
            slope,
            y[3],
        )),
    }
}

/// Closed-form rational segment joining the latitude line to an endpoint.
///
/// `x_span`/`y_span` are the distances from the joining node to the
/// endpoint. The discriminant is floored at zero: very soft slopes can
/// push it slightly negative in f32 and a flat segment beats a NaN.
fn rational_coeffs(x_span: f32, y_span: f32, slope: f32, pivot: f32) -> SegmentCoeffs {
    let x = x_span;
    let y = y_span;
    let g = slope;
    let disc = (filmic_math::sqf(x * g / y + 1.0) - 4.0).max(0.0);
    let b = g / (2.0 * y) + (disc.sqrt() - 1.0) / (2.0 * x);
    let c = y / g * (b * filmic_math::sqf(x) + x) / (b * filmic_math::sqf(x) + x - y / g);
    let a = c * g;
    SegmentCoeffs::Rational { a, b, c, pivot }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn curve_with(shadows: CurveShape, highlights: CurveShape) -> ToneCurve {
        let params = FilmicParams {
            shadows,
            highlights,
            ..FilmicParams::default()
        };
        ToneCurve::build(&params).unwrap()
    }

    const ALL_SHAPES: [CurveShape; 3] =
        [CurveShape::Poly4, CurveShape::Poly3, CurveShape::Rational];

    #[test]
    fn test_grey_maps_to_grey_display() {
        let curve = curve_with(CurveShape::Rational, CurveShape::Rational);
        let grey_log = 8.0 / 12.0;
        let grey_display = 0.1845_f32.powf(1.0 / 4.0);
        assert_relative_eq!(curve.evaluate(grey_log), grey_display, epsilon = 1e-5);
    }

    #[test]
    fn test_endpoints_hit_display_targets() {
        for shape in ALL_SHAPES {
            let curve = curve_with(shape, shape);
            assert_relative_eq!(curve.evaluate(0.0), curve.nodes_y[0], epsilon = 1e-4);
            assert_relative_eq!(curve.evaluate(1.0), curve.nodes_y[4], epsilon = 1e-4);
        }
    }

    #[test]
    fn test_segments_join_continuously() {
        for shape in ALL_SHAPES {
            let curve = curve_with(shape, shape);
            let eps = 1e-4_f32;

            let lo = curve.latitude_min();
            let inside = curve.evaluate(lo + eps);
            let outside = curve.evaluate(lo - eps);
            assert!(
                (inside - outside).abs() < 1e-3,
                "toe join discontinuous for {shape:?}: {inside} vs {outside}"
            );

            let hi = curve.latitude_max();
            let inside = curve.evaluate(hi - eps);
            let outside = curve.evaluate(hi + eps);
            assert!(
                (inside - outside).abs() < 1e-3,
                "shoulder join discontinuous for {shape:?}: {inside} vs {outside}"
            );
        }
    }

    #[test]
    fn test_rational_is_monotone() {
        let curve = curve_with(CurveShape::Rational, CurveShape::Rational);
        let mut prev = curve.evaluate(0.0);
        for i in 1..=512 {
            let x = i as f32 / 512.0;
            let y = curve.evaluate(x);
            assert!(y >= prev - 1e-6, "non-monotone at x={x}: {y} < {prev}");
            prev = y;
        }
    }

    #[test]
    fn test_latitude_is_linear() {
        let curve = curve_with(CurveShape::Rational, CurveShape::Rational);
        let lo = curve.latitude_min();
        let hi = curve.latitude_max();
        let mid = 0.5 * (lo + hi);
        let expected = 0.5 * (curve.evaluate(lo) + curve.evaluate(hi));
        assert_relative_eq!(curve.evaluate(mid), expected, epsilon = 1e-5);
    }

    #[test]
    fn test_contrast_clamping_flag() {
        let soft = FilmicParams {
            contrast: 0.1,
            ..FilmicParams::default()
        };
        let curve = ToneCurve::build(&soft).unwrap();
        assert!(curve.contrast_clamped());

        let normal = ToneCurve::build(&FilmicParams::default()).unwrap();
        assert!(!normal.contrast_clamped());
    }

    #[test]
    fn test_balance_shifts_latitude() {
        let shadows = FilmicParams {
            balance: 50.0,
            ..FilmicParams::default()
        };
        let highlights = FilmicParams {
            balance: -50.0,
            ..FilmicParams::default()
        };
        let c_shadows = ToneCurve::build(&shadows).unwrap();
        let c_highlights = ToneCurve::build(&highlights).unwrap();
        // positive balance drags the latitude towards the shadows
        assert!(c_shadows.latitude_min() < c_highlights.latitude_min());
        assert!(c_shadows.latitude_max() < c_highlights.latitude_max());
    }

    #[test]
    fn test_out_of_range_params_clamped_not_fatal() {
        // sign-invalid exposure points build a valid curve with the
        // clamping diagnostic raised instead of failing the render
        let bad = FilmicParams {
            white_point_source: -1.0,
            black_point_source: 1.0,
            ..FilmicParams::default()
        };
        let curve = ToneCurve::build(&bad).unwrap();
        assert!(curve.contrast_clamped());
        for i in 0..=64 {
            assert!(curve.evaluate(i as f32 / 64.0).is_finite());
        }

        let bad_power = FilmicParams {
            output_power: 0.0,
            ..FilmicParams::default()
        };
        let curve = ToneCurve::build(&bad_power).unwrap();
        assert!(curve.contrast_clamped());
    }
}
