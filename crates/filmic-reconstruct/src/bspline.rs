//! Separable dilated B-spline blur.
//!
//! The a-trous decomposition uses one filter at every scale: the 5-tap
//! cubic B-spline `[1 4 6 4 1] / 16`, dilated by inserting `2^scale - 1`
//! holes between taps. Separability turns the 25-tap 2D kernel into a
//! vertical and a horizontal pass of 5 taps each; edges clamp.

use filmic_core::{RgbaBuffer, CHANNELS};
use rayon::prelude::*;

/// 5-tap filter footprint at scale 0.
pub const BSPLINE_FSIZE: usize = 5;

const WEIGHTS: [f32; BSPLINE_FSIZE] = [
    1.0 / 16.0,
    4.0 / 16.0,
    6.0 / 16.0,
    4.0 / 16.0,
    1.0 / 16.0,
];

#[inline]
fn clamped(center: usize, tap: usize, mult: usize, max: usize) -> usize {
    // taps at center + (tap - 2) * mult, clamped to the image
    let offset = (tap as isize - 2) * mult as isize;
    (center as isize + offset).clamp(0, max as isize - 1) as usize
}

/// Blurs `input` into `output` with the B-spline kernel dilated by `mult`.
///
/// `scratch` holds the intermediate vertical pass and must match the
/// input dimensions; it is overwritten. `mult` is `2^scale` for the
/// a-trous scheme, `1` for a plain blur.
pub fn blur_bspline(
    input: &RgbaBuffer,
    output: &mut RgbaBuffer,
    scratch: &mut RgbaBuffer,
    mult: usize,
) {
    debug_assert_eq!(input.data().len(), output.data().len());
    debug_assert_eq!(input.data().len(), scratch.data().len());

    let width = input.width();
    let height = input.height();
    let row_len = width * CHANNELS;

    // vertical pass: input -> scratch
    scratch
        .data_mut()
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, out_row)| {
            out_row.fill(0.0);
            for (tap, &w) in WEIGHTS.iter().enumerate() {
                let src_row = input.row(clamped(y, tap, mult, height));
                for (dst, &src) in out_row.iter_mut().zip(src_row) {
                    *dst += w * src;
                }
            }
        });

    // horizontal pass: scratch -> output
    let scratch_data = scratch.data();
    output
        .data_mut()
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, out_row)| {
            let src_row = &scratch_data[y * row_len..(y + 1) * row_len];
            for x in 0..width {
                let mut acc = [0.0f32; CHANNELS];
                for (tap, &w) in WEIGHTS.iter().enumerate() {
                    let sx = clamped(x, tap, mult, width);
                    let px = &src_row[sx * CHANNELS..(sx + 1) * CHANNELS];
                    for c in 0..CHANNELS {
                        acc[c] += w * px[c];
                    }
                }
                out_row[x * CHANNELS..(x + 1) * CHANNELS].copy_from_slice(&acc);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn blur(input: &RgbaBuffer, mult: usize) -> RgbaBuffer {
        let mut out = RgbaBuffer::try_new(input.width(), input.height()).unwrap();
        let mut scratch = RgbaBuffer::try_new(input.width(), input.height()).unwrap();
        blur_bspline(input, &mut out, &mut scratch, mult);
        out
    }

    #[test]
    fn test_constant_image_unchanged() {
        // the kernel sums to 1, so flat fields are fixed points
        let img = RgbaBuffer::filled(16, 16, [0.3, 0.5, 0.7, 1.0]);
        let out = blur(&img, 1);
        for (&a, &b) in out.data().iter().zip(img.data()) {
            assert_relative_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_spike_spreads_and_conserves_energy() {
        let mut img = RgbaBuffer::try_new(17, 17).unwrap();
        img.set_pixel(8, 8, [16.0, 0.0, 0.0, 0.0]);
        let out = blur(&img, 1);

        // center keeps the kernel's central weight
        assert_relative_eq!(out.pixel(8, 8)[0], 16.0 * (6.0 / 16.0) * (6.0 / 16.0), epsilon = 1e-5);
        // interior spike: no edge clamping, total energy preserved
        let total: f32 = out.data().iter().step_by(CHANNELS).sum();
        assert_relative_eq!(total, 16.0, epsilon = 1e-4);
    }

    #[test]
    fn test_dilation_widens_support() {
        let mut img = RgbaBuffer::try_new(33, 33).unwrap();
        img.set_pixel(16, 16, [1.0, 0.0, 0.0, 0.0]);

        let narrow = blur(&img, 1);
        let wide = blur(&img, 4);

        // at mult=1 the support ends 2 pixels out; at mult=4 it reaches 8
        assert_eq!(narrow.pixel(16 + 4, 16)[0], 0.0);
        assert!(wide.pixel(16 + 8, 16)[0] > 0.0);
        // holes of the dilated kernel get no contribution
        assert_eq!(wide.pixel(16 + 3, 16)[0], 0.0);
    }
}
