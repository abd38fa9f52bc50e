//! Multi-scale a-trous reconstruction of clipped highlights.
//!
//! The inpainted image is decomposed into wavelet scales by repeated
//! B-spline blurring with growing dilation. At each scale the clipped
//! areas are resynthesized from a weighted mix of blurred high
//! frequencies (structure), raw high frequencies (texture), and an
//! achromatic term built from all channels; the coarsest scale also
//! contributes the low-frequency residual. The accumulation is masked,
//! so valid pixels keep their original content bit for bit.
//!
//! Only two low-frequency buffers are needed: the decomposition at scale
//! `s` reads the LF of scale `s - 1` and writes its own, so the pair
//! alternates roles. [`PingPong`] makes that alternation explicit.

use filmic_core::{PlaneBuffer, RgbaBuffer, Roi, CHANNELS};
use rayon::prelude::*;
use tracing::debug;

use crate::bspline::{blur_bspline, BSPLINE_FSIZE};
use crate::error::{ReconstructError, Result};

/// Hard cap on the number of wavelet scales.
pub const MAX_SCALES: usize = 10;

/// Which domain the reconstruction runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructMode {
    /// Reconstruct RGB intensities. High frequencies are favored since
    /// they carry the texture worth recovering.
    Rgb,
    /// Reconstruct chromaticity ratios. Ratios are low-frequency by
    /// nature, so the blending leans achromatic and smooth.
    Ratios,
}

/// Blending weights of the resynthesis, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructWeights {
    /// Structure inpainting vs. texture duplication.
    pub structure_vs_texture: f32,
    /// Achromatic vs. colorful reconstruction.
    pub grey_vs_color: f32,
    /// Bloom vs. details.
    pub bloom_vs_details: f32,
}

impl ReconstructWeights {
    /// Rescales the -100..100 user controls to blending weights.
    pub fn from_user(structure_vs_texture: f32, grey_vs_color: f32, bloom_vs_details: f32) -> Self {
        let rescale = |v: f32| (v / 100.0 + 1.0) / 2.0;
        Self {
            structure_vs_texture: rescale(structure_vs_texture),
            grey_vs_color: rescale(grey_vs_color),
            bloom_vs_details: rescale(bloom_vs_details),
        }
    }
}

/// Number of wavelet scales needed for the current view.
///
/// [`Roi`] dimensions are already at display scale, so the buffer extent
/// alone sets the count. The coarsest filter then covers the same
/// fraction of the image whether it is a full-resolution export or a
/// zoomed-out preview of the same frame. Always in `[1, MAX_SCALES]`.
pub fn scale_count(roi: &Roi) -> usize {
    let size = roi.max_dimension() as f32;
    let footprint = ((BSPLINE_FSIZE - 1) * BSPLINE_FSIZE) as f32;
    let scales = (2.0 * size / footprint - 1.0).log2().floor();
    (scales as isize).clamp(1, MAX_SCALES as isize) as usize
}

/// Two buffers alternating between detail source and low-frequency sink.
struct PingPong {
    a: RgbaBuffer,
    b: RgbaBuffer,
    flipped: bool,
}

impl PingPong {
    fn try_new(width: usize, height: usize) -> Result<Self> {
        Ok(Self {
            a: RgbaBuffer::try_new(width, height)?,
            b: RgbaBuffer::try_new(width, height)?,
            flipped: false,
        })
    }

    /// Front buffer (last scale's output) and back buffer (this scale's
    /// sink), borrowed simultaneously.
    fn split_mut(&mut self) -> (&RgbaBuffer, &mut RgbaBuffer) {
        if self.flipped {
            (&self.b, &mut self.a)
        } else {
            (&self.a, &mut self.b)
        }
    }

    fn swap(&mut self) {
        self.flipped = !self.flipped;
    }
}

/// Seeds the accumulator with the valid part of the image.
///
/// Simple premultiplied blend: RGB is scaled by `1 - mask` so the
/// masked accumulation can add the reconstruction on top; alpha passes
/// through untouched.
fn init_reconstruct(input: &RgbaBuffer, mask: &PlaneBuffer, reconstructed: &mut RgbaBuffer) {
    let width = input.width();
    reconstructed
        .data_mut()
        .par_chunks_mut(width * CHANNELS)
        .enumerate()
        .for_each(|(y, out_row)| {
            let in_row = input.row(y);
            let mask_row = &mask.data()[y * width..(y + 1) * width];
            for x in 0..width {
                let keep = 1.0 - mask_row[x];
                let px = &in_row[x * CHANNELS..(x + 1) * CHANNELS];
                let out = &mut out_row[x * CHANNELS..(x + 1) * CHANNELS];
                for c in 0..3 {
                    out[c] = (px[c] * keep).max(0.0);
                }
                out[3] = px[3];
            }
        });
}

/// Computes `texture = detail - lf` for every channel.
fn detail_level(detail: &RgbaBuffer, lf: &RgbaBuffer, texture: &mut RgbaBuffer) {
    texture
        .data_mut()
        .par_iter_mut()
        .zip(detail.data())
        .zip(lf.data())
        .for_each(|((t, &d), &l)| *t = d - l);
}

#[inline]
fn max_abs(a: f32, b: f32) -> f32 {
    if a.abs() > b.abs() { a } else { b }
}

#[allow(clippy::too_many_arguments)]
fn accumulate(
    mode: ReconstructMode,
    hf: &RgbaBuffer,
    lf: &RgbaBuffer,
    texture: &RgbaBuffer,
    mask: &PlaneBuffer,
    reconstructed: &mut RgbaBuffer,
    weights: &ReconstructWeights,
    scale: usize,
    scales: usize,
) {
    let gamma = weights.structure_vs_texture;
    let gamma_comp = 1.0 - gamma;
    let beta = weights.grey_vs_color;
    let beta_comp = 1.0 - beta;
    let delta = weights.bloom_vs_details;
    let last_scale = scale == scales - 1;
    let width = reconstructed.width();

    reconstructed
        .data_mut()
        .par_chunks_mut(width * CHANNELS)
        .enumerate()
        .for_each(|(y, out_row)| {
            let hf_row = hf.row(y);
            let lf_row = lf.row(y);
            let tt_row = texture.row(y);
            let mask_row = &mask.data()[y * width..(y + 1) * width];

            for x in 0..width {
                let alpha = mask_row[x];
                let o = x * CHANNELS;
                let hf_c = &hf_row[o..o + 3];
                let lf_c = &lf_row[o..o + 3];
                let tt_c = &tt_row[o..o + 3];

                // the sharpest valid channel lends its texture to the
                // clipped ones
                let grey_texture = max_abs(max_abs(tt_c[0], tt_c[1]), tt_c[2]);
                // smoother fallback term that fills holes where the
                // texture is near zero
                let grey_details = (hf_c[0] + hf_c[1] + hf_c[2]) / 3.0;

                match mode {
                    ReconstructMode::Rgb => {
                        let grey_hf = beta_comp * (gamma_comp * grey_details + gamma * grey_texture);
                        let grey_residual = beta_comp * (lf_c[0] + lf_c[1] + lf_c[2]) / 3.0;

                        for c in 0..3 {
                            let details = (gamma_comp * hf_c[c] + gamma * tt_c[c]) * beta + grey_hf;
                            let residual = if last_scale {
                                grey_residual + lf_c[c] * beta
                            } else {
                                0.0
                            };
                            out_row[o + c] += alpha * (delta * details + residual);
                        }
                    }
                    ReconstructMode::Ratios => {
                        // ratios are mostly low frequency; favor the
                        // achromatic solution and smooth details
                        let grey_hf = gamma_comp * grey_details + gamma * grey_texture;

                        for c in 0..3 {
                            let details = 0.5 * ((gamma_comp * hf_c[c] + gamma * tt_c[c]) + grey_hf);
                            let residual = if last_scale { lf_c[c] } else { 0.0 };
                            out_row[o + c] += alpha * (delta * details + residual);
                        }
                    }
                }
            }
        });
}

/// Rebuilds clipped areas of `input` into `reconstructed`.
///
/// `scales` usually comes from [`scale_count`]. Working buffers are
/// allocated here and reported as [`ReconstructError::Core`] on failure,
/// which callers treat as "skip reconstruction", not as a fatal error.
pub fn reconstruct_highlights(
    input: &RgbaBuffer,
    mask: &PlaneBuffer,
    reconstructed: &mut RgbaBuffer,
    mode: ReconstructMode,
    weights: &ReconstructWeights,
    scales: usize,
) -> Result<()> {
    input.check_same_size(reconstructed)?;
    if input.pixel_count() != mask.data().len() {
        return Err(ReconstructError::SizeMismatch(format!(
            "mask has {} pixels, image has {}",
            mask.data().len(),
            input.pixel_count()
        )));
    }

    let width = input.width();
    let height = input.height();

    let mut lf_pair = PingPong::try_new(width, height)?;
    let mut hf = RgbaBuffer::try_new(width, height)?;
    let mut texture = RgbaBuffer::try_new(width, height)?;
    let mut scratch = RgbaBuffer::try_new(width, height)?;

    debug!(?mode, scales, width, height, "reconstructing highlights");

    init_reconstruct(input, mask, reconstructed);

    for s in 0..scales {
        let mult = 1usize << s;
        let (front, back) = lf_pair.split_mut();
        let detail = if s == 0 { input } else { front };

        // low frequencies of this scale
        blur_bspline(detail, back, &mut scratch, mult);
        // unblurred high frequencies carry the texture
        detail_level(detail, back, &mut texture);
        // blurred high frequencies diffuse valid detail into the holes
        blur_bspline(&texture, &mut hf, &mut scratch, 1);

        accumulate(mode, &hf, back, &texture, mask, reconstructed, weights, s, scales);
        lf_pair.swap();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn default_weights() -> ReconstructWeights {
        ReconstructWeights::from_user(0.0, 100.0, 100.0)
    }

    #[test]
    fn test_weights_rescaled() {
        let w = default_weights();
        assert_relative_eq!(w.structure_vs_texture, 0.5);
        assert_relative_eq!(w.grey_vs_color, 1.0);
        assert_relative_eq!(w.bloom_vs_details, 1.0);
    }

    #[test]
    fn test_scale_count_ranges() {
        assert_eq!(scale_count(&Roi::full(512, 512)), 5);
        assert_eq!(scale_count(&Roi::full(32, 32)), 1);
        // tiny images never go below one scale
        assert_eq!(scale_count(&Roi::full(4, 4)), 1);
        // enormous images cap out
        assert_eq!(scale_count(&Roi::full(4_000_000, 4_000_000)), MAX_SCALES);
    }

    #[test]
    fn test_scale_count_is_zoom_invariant() {
        // the same frame as a full export and as a quarter-size preview:
        // the coarsest filter must cover the same fraction of the image
        let export = Roi::full(2048, 2048);
        let mut preview = Roi::full(512, 512);
        preview.scale = 0.25;

        let coverage = |roi: &Roi| {
            let s = scale_count(roi);
            ((1usize << (s - 1)) * (BSPLINE_FSIZE - 1)) as f32 / roi.max_dimension() as f32
        };

        assert_eq!(scale_count(&export), 7);
        assert_eq!(scale_count(&preview), 5);
        assert_relative_eq!(coverage(&export), coverage(&preview));
    }

    #[test]
    fn test_valid_pixels_unchanged() {
        let mut img = RgbaBuffer::filled(32, 32, [0.2, 0.3, 0.4, 1.0]);
        img.set_pixel(10, 10, [0.9, 0.1, 0.5, 1.0]);
        let mask = PlaneBuffer::try_new(32, 32).unwrap(); // nothing clipped
        let mut rec = RgbaBuffer::try_new(32, 32).unwrap();

        reconstruct_highlights(
            &img,
            &mask,
            &mut rec,
            ReconstructMode::Rgb,
            &default_weights(),
            3,
        )
        .unwrap();

        for (&got, &want) in rec.data().iter().zip(img.data()) {
            assert_relative_eq!(got, want, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_flat_clipped_field_restored() {
        // fully masked flat field: every scale contributes zero detail
        // and the coarsest residual restores the flat value exactly
        for mode in [ReconstructMode::Rgb, ReconstructMode::Ratios] {
            let img = RgbaBuffer::filled(32, 32, [2.0, 2.0, 2.0, 1.0]);
            let mut mask = PlaneBuffer::try_new(32, 32).unwrap();
            mask.data_mut().fill(1.0);
            let mut rec = RgbaBuffer::try_new(32, 32).unwrap();

            reconstruct_highlights(&img, &mask, &mut rec, mode, &default_weights(), 3).unwrap();

            for px in rec.data().chunks_exact(CHANNELS) {
                for c in 0..3 {
                    assert_relative_eq!(px[c], 2.0, epsilon = 1e-4);
                }
            }
        }
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let img = RgbaBuffer::try_new(16, 16).unwrap();
        let mask = PlaneBuffer::try_new(8, 8).unwrap();
        let mut rec = RgbaBuffer::try_new(16, 16).unwrap();
        let result = reconstruct_highlights(
            &img,
            &mask,
            &mut rec,
            ReconstructMode::Rgb,
            &default_weights(),
            1,
        );
        assert!(result.is_err());
    }
}
