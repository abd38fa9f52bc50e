//! Per-pixel curve application.
//!
//! Four specialized row-parallel loops, one per combination of chroma
//! handling (per-channel split vs. norm-preserving chroma) and color
//! science generation. The dispatch happens once per frame in
//! [`Backend::apply`](crate::Backend::apply) rather than per pixel, so
//! each loop body stays branch-free apart from the spline segments.
//!
//! Alpha always passes through from the tone-mapping input.

use filmic_core::{
    pixel_norm, profile_luminance, LuminanceProfile, NormMethod, PlaneBuffer, RgbaBuffer,
    CHANNELS, NORM_MIN,
};
use filmic_curve::{
    desaturate_v1, desaturate_v2, linear_saturation, log_encode, log_encode_clipped,
};
use filmic_math::clamp01;
use rayon::prelude::*;

use crate::engine::Engine;

/// Runs `body` on every (input pixel, output pixel) pair, rows in parallel.
fn for_each_pixel<F>(input: &RgbaBuffer, output: &mut RgbaBuffer, body: F)
where
    F: Fn(&[f32], &mut [f32]) + Sync,
{
    let row_len = input.width() * CHANNELS;
    output
        .data_mut()
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, out_row)| {
            let in_row = input.row(y);
            for (px, out) in in_row.chunks_exact(CHANNELS).zip(out_row.chunks_exact_mut(CHANNELS)) {
                body(px, out);
            }
        });
}

/// Per-channel application, first-generation desaturation.
pub fn split_v1(
    input: &RgbaBuffer,
    output: &mut RgbaBuffer,
    engine: &Engine,
    profile: Option<&dyn LuminanceProfile>,
) {
    let d = engine.derived();
    let curve = engine.curve();

    for_each_pixel(input, output, |px, out| {
        let mut temp = [0.0f32; 3];
        for c in 0..3 {
            temp[c] = log_encode_clipped(
                px[c].max(NORM_MIN),
                d.grey_source,
                d.black_source,
                d.dynamic_range,
            );
        }
        let lum = profile_luminance(temp, profile);
        let desaturation = desaturate_v1(lum, d.sigma_toe, d.sigma_shoulder, d.saturation);

        for c in 0..3 {
            out[c] = clamp01(curve.evaluate(linear_saturation(temp[c], lum, desaturation)))
                .powf(d.output_power);
        }
        out[3] = px[3];
    });
}

/// Per-channel application, reworked desaturation.
pub fn split_v2_v3(
    input: &RgbaBuffer,
    output: &mut RgbaBuffer,
    engine: &Engine,
    profile: Option<&dyn LuminanceProfile>,
) {
    let d = engine.derived();
    let curve = engine.curve();

    for_each_pixel(input, output, |px, out| {
        let mut temp = [0.0f32; 3];
        for c in 0..3 {
            temp[c] = log_encode(
                px[c].max(NORM_MIN),
                d.grey_source,
                d.black_source,
                d.dynamic_range,
            );
        }
        let lum = profile_luminance(temp, profile);
        let desaturation = desaturate_v2(lum, d.sigma_toe, d.sigma_shoulder, d.saturation);

        for c in 0..3 {
            out[c] = clamp01(curve.evaluate(linear_saturation(temp[c], lum, desaturation)))
                .powf(d.output_power);
        }
        out[3] = px[3];
    });
}

/// Norm-preserving application, first-generation color science.
///
/// The curve maps a single scalar norm; chroma is desaturated in
/// display space via luminance blending on the scaled ratios.
pub fn chroma_v1(
    input: &RgbaBuffer,
    output: &mut RgbaBuffer,
    engine: &Engine,
    method: NormMethod,
    profile: Option<&dyn LuminanceProfile>,
) {
    let d = engine.derived();
    let curve = engine.curve();

    for_each_pixel(input, output, |px, out| {
        let mut norm = pixel_norm([px[0], px[1], px[2]], method, profile).max(NORM_MIN);

        let mut ratios = [px[0] / norm, px[1] / norm, px[2] / norm];
        let min_ratio = ratios[0].min(ratios[1]).min(ratios[2]);
        if min_ratio < 0.0 {
            for r in &mut ratios {
                *r -= min_ratio;
            }
        }

        norm = log_encode_clipped(norm, d.grey_source, d.black_source, d.dynamic_range);
        let desaturation = desaturate_v1(norm, d.sigma_toe, d.sigma_shoulder, d.saturation);

        for r in &mut ratios {
            *r *= norm;
        }
        let lum = profile_luminance(ratios, profile);
        for r in &mut ratios {
            *r = linear_saturation(*r, lum, desaturation) / norm;
        }

        norm = clamp01(curve.evaluate(norm)).powf(d.output_power);

        for c in 0..3 {
            out[c] = ratios[c] * norm;
        }
        out[3] = px[3];
    });
}

/// Norm-preserving application, second/third-generation color science.
///
/// Desaturation happens on the ratios themselves (pulling them toward
/// 1, i.e. white); the third generation renormalizes afterwards so the
/// tone-mapped norm survives the desaturation. Ends with a gamut clamp
/// that trades chroma for staying inside [0, 1].
pub fn chroma_v2_v3(
    input: &RgbaBuffer,
    output: &mut RgbaBuffer,
    engine: &Engine,
    method: NormMethod,
    renormalize: bool,
    profile: Option<&dyn LuminanceProfile>,
) {
    let d = engine.derived();
    let curve = engine.curve();

    for_each_pixel(input, output, |px, out| {
        let mut norm = pixel_norm([px[0], px[1], px[2]], method, profile).max(NORM_MIN);

        let mut ratios = [px[0] / norm, px[1] / norm, px[2] / norm];
        let min_ratio = ratios[0].min(ratios[1]).min(ratios[2]);
        if min_ratio < 0.0 {
            for r in &mut ratios {
                *r -= min_ratio;
            }
        }

        norm = log_encode(norm, d.grey_source, d.black_source, d.dynamic_range);
        let desaturation = desaturate_v2(norm, d.sigma_toe, d.sigma_shoulder, d.saturation);
        norm = clamp01(curve.evaluate(norm)).powf(d.output_power);

        for r in &mut ratios {
            *r = (*r + (1.0 - *r) * (1.0 - desaturation)).max(0.0);
        }

        // the desaturation moved the ratios, so their norm is no longer 1
        if renormalize {
            norm /= pixel_norm(ratios, method, profile).max(NORM_MIN);
        }

        for c in 0..3 {
            out[c] = ratios[c] * norm;
        }

        // gamut clamp: spend chroma to stay inside the display range
        let max_pix = out[0].max(out[1]).max(out[2]);
        if max_pix > 1.0 {
            for c in 0..3 {
                ratios[c] = (ratios[c] + (1.0 - max_pix)).max(0.0);
                out[c] = clamp01(ratios[c] * norm);
            }
        }
        out[3] = px[3];
    });
}

/// Writes the clipping mask as a greyscale image, for diagnostic display.
pub fn display_mask(mask: &PlaneBuffer, output: &mut RgbaBuffer) {
    let width = output.width();
    output
        .data_mut()
        .par_chunks_mut(width * CHANNELS)
        .enumerate()
        .for_each(|(y, out_row)| {
            let mask_row = &mask.data()[y * width..(y + 1) * width];
            for (x, &weight) in mask_row.iter().enumerate() {
                let px = &mut out_row[x * CHANNELS..(x + 1) * CHANNELS];
                px[0] = weight;
                px[1] = weight;
                px[2] = weight;
                px[3] = 1.0;
            }
        });
}
