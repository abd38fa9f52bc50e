//! Soft detection of clipped pixels.

use filmic_core::{PlaneBuffer, RgbaBuffer, CHANNELS};
use filmic_math::{clamp01, sqf};
use rayon::prelude::*;
use tracing::trace;

/// Pixels with a sigmoid argument above this produce opacity below 6%,
/// not worth reconstructing.
const ARGUMENT_CUTOFF: f32 = 4.0;

/// Minimum number of detected pixels for reconstruction to be worthwhile.
const MIN_CLIPPED_PIXELS: usize = 9;

/// Builds the soft clipping mask and decides whether reconstruction pays.
///
/// Each pixel gets a weight in `[0, 1]` from a sigmoid centered on the
/// clipping threshold: `1 / (1 + 2^(-norm * normalize + feather))` where
/// the norm is the Euclidean magnitude of the RGB triple. `normalize` and
/// `feather` are the precomputed threshold terms, see
/// `DerivedParams` in the engine crate.
///
/// Returns `true` if enough pixels are close to clipping that the
/// wavelet reconstruction is worth its cost.
pub fn mask_clipped_pixels(
    input: &RgbaBuffer,
    mask: &mut PlaneBuffer,
    normalize: f32,
    feather: f32,
) -> bool {
    debug_assert_eq!(input.pixel_count(), mask.data().len());
    let width = input.width();

    let clipped: usize = mask
        .data_mut()
        .par_chunks_mut(width)
        .enumerate()
        .map(|(y, mask_row)| {
            let row = input.row(y);
            let mut count = 0usize;
            for (x, weight) in mask_row.iter_mut().enumerate() {
                let px = &row[x * CHANNELS..x * CHANNELS + 3];
                let norm = (sqf(px[0]) + sqf(px[1]) + sqf(px[2])).sqrt().max(0.0);
                let argument = -norm * normalize + feather;
                *weight = clamp01(1.0 / (1.0 + argument.exp2()));
                count += usize::from(argument < ARGUMENT_CUTOFF);
            }
            count
        })
        .sum();

    trace!(clipped, "clipping mask built");
    clipped > MIN_CLIPPED_PIXELS
}

#[cfg(test)]
mod tests {
    use super::*;
    use filmic_core::PlaneBuffer;

    // derived from defaults: grey 0.1845, white +4 EV, threshold +3 EV
    fn default_mask_terms() -> (f32, f32) {
        let threshold = (4.0f32 + 3.0).exp2() * 0.1845;
        let feather = (12.0f32 / 3.0).exp2();
        (feather / threshold, feather)
    }

    #[test]
    fn test_unclipped_image_skips_reconstruction() {
        let (normalize, feather) = default_mask_terms();
        let img = RgbaBuffer::filled(16, 16, [0.18, 0.18, 0.18, 1.0]);
        let mut mask = PlaneBuffer::try_new(16, 16).unwrap();
        assert!(!mask_clipped_pixels(&img, &mut mask, normalize, feather));
        assert!(mask.data().iter().all(|&w| w < 1e-3));
    }

    #[test]
    fn test_clipped_patch_detected() {
        let (normalize, feather) = default_mask_terms();
        let mut img = RgbaBuffer::filled(16, 16, [0.18, 0.18, 0.18, 1.0]);
        // a 4x4 patch far above the clipping threshold
        for y in 4..8 {
            for x in 4..8 {
                img.set_pixel(x, y, [60.0, 60.0, 60.0, 1.0]);
            }
        }
        let mut mask = PlaneBuffer::try_new(16, 16).unwrap();
        assert!(mask_clipped_pixels(&img, &mut mask, normalize, feather));
        assert!(mask.get(5, 5) > 0.9);
        assert!(mask.get(0, 0) < 1e-3);
    }

    #[test]
    fn test_tiny_clipped_area_not_worthwhile() {
        let (normalize, feather) = default_mask_terms();
        let mut img = RgbaBuffer::filled(16, 16, [0.18, 0.18, 0.18, 1.0]);
        // fewer than the minimum pixel count
        for x in 0..4 {
            img.set_pixel(x, 0, [60.0, 60.0, 60.0, 1.0]);
        }
        let mut mask = PlaneBuffer::try_new(16, 16).unwrap();
        assert!(!mask_clipped_pixels(&img, &mut mask, normalize, feather));
    }
}
