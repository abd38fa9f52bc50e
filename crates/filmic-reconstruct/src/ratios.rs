//! Chromaticity ratio split for the high-quality refinement passes.
//!
//! A refinement pass reruns the wavelet reconstruction on chromaticity
//! instead of intensity: the image is split into per-pixel norms and
//! RGB/norm ratios, the ratios are diffused, then the norms are
//! reapplied. Splitting and merging live here.

use filmic_core::{
    pixel_norm, LuminanceProfile, NormMethod, PlaneBuffer, RgbaBuffer, CHANNELS, NORM_MIN,
};
use filmic_math::clamp01;
use rayon::prelude::*;

/// Splits an image into norms and chromaticity ratios.
///
/// Norms are floored at [`NORM_MIN`] so the division stays finite on
/// black pixels. Alpha is carried into the ratios buffer unchanged.
pub fn compute_ratios(
    input: &RgbaBuffer,
    norms: &mut PlaneBuffer,
    ratios: &mut RgbaBuffer,
    method: NormMethod,
    profile: Option<&dyn LuminanceProfile>,
) {
    let width = input.width();
    let norm_data = norms.data_mut();

    ratios
        .data_mut()
        .par_chunks_mut(width * CHANNELS)
        .zip(norm_data.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (ratio_row, norm_row))| {
            let in_row = input.row(y);
            for x in 0..width {
                let px = &in_row[x * CHANNELS..(x + 1) * CHANNELS];
                let norm = pixel_norm([px[0], px[1], px[2]], method, profile).max(NORM_MIN);
                norm_row[x] = norm;
                let out = &mut ratio_row[x * CHANNELS..(x + 1) * CHANNELS];
                for c in 0..3 {
                    out[c] = px[c] / norm;
                }
                out[3] = px[3];
            }
        });
}

/// Merges diffused ratios back with their norms, in place.
///
/// Ratios are clamped to [0, 1] first: the diffusion can overshoot and
/// chromaticity outside that range has no meaning.
pub fn restore_ratios(buffer: &mut RgbaBuffer, norms: &PlaneBuffer) {
    let width = buffer.width();
    buffer
        .data_mut()
        .par_chunks_mut(width * CHANNELS)
        .enumerate()
        .for_each(|(y, row)| {
            let norm_row = &norms.data()[y * width..(y + 1) * width];
            for x in 0..width {
                let norm = norm_row[x];
                let px = &mut row[x * CHANNELS..(x + 1) * CHANNELS];
                for c in 0..3 {
                    px[c] = clamp01(px[c]) * norm;
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_split_and_restore_roundtrip() {
        let mut img = RgbaBuffer::filled(8, 8, [0.4, 0.2, 0.1, 1.0]);
        img.set_pixel(2, 2, [1.5, 0.7, 0.3, 1.0]);

        let mut norms = PlaneBuffer::try_new(8, 8).unwrap();
        let mut ratios = RgbaBuffer::try_new(8, 8).unwrap();
        compute_ratios(&img, &mut norms, &mut ratios, NormMethod::EuclideanV1, None);

        // ratios of the Euclidean norm are unit vectors
        let px = ratios.pixel(2, 2);
        let mag = (px[0] * px[0] + px[1] * px[1] + px[2] * px[2]).sqrt();
        assert_relative_eq!(mag, 1.0, epsilon = 1e-5);

        restore_ratios(&mut ratios, &norms);
        for (&got, &want) in ratios.data().iter().zip(img.data()) {
            assert_relative_eq!(got, want, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_black_pixels_stay_finite() {
        let img = RgbaBuffer::try_new(4, 4).unwrap();
        let mut norms = PlaneBuffer::try_new(4, 4).unwrap();
        let mut ratios = RgbaBuffer::try_new(4, 4).unwrap();
        compute_ratios(&img, &mut norms, &mut ratios, NormMethod::EuclideanV1, None);

        assert!(ratios.data().iter().all(|v| v.is_finite()));
        assert!(norms.data().iter().all(|&n| n >= NORM_MIN));
    }

    #[test]
    fn test_restore_clamps_overshoot() {
        let mut buf = RgbaBuffer::filled(2, 2, [1.7, -0.3, 0.5, 1.0]);
        let mut norms = PlaneBuffer::try_new(2, 2).unwrap();
        norms.data_mut().fill(2.0);
        restore_ratios(&mut buf, &norms);
        assert_eq!(buf.pixel(0, 0), [2.0, 0.0, 1.0, 1.0]);
    }
}
