//! Coordinate-seeded noise inpainting over clipped areas.
//!
//! Clipped pixels carry no texture, and the wavelet diffusion needs
//! particles to propagate. This pass blends statistical noise into the
//! clipped areas, weighted by the soft mask. The generator is seeded
//! from pixel coordinates, so the result is fully deterministic and
//! independent of threading or tiling.

use filmic_core::{NoiseDistribution, PlaneBuffer, RgbaBuffer, CHANNELS};
use rayon::prelude::*;

/// Mixes a seed into a well-distributed 32-bit value.
#[inline]
fn splitmix32(seed: u64) -> u32 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (z ^ (z >> 31)) as u32
}

/// xoshiro128+ step, returning a uniform sample in [0, 1].
#[inline]
fn xoshiro128plus(state: &mut [u32; 4]) -> f32 {
    let result = state[0].wrapping_add(state[3]);
    let t = state[1] << 9;

    state[2] ^= state[0];
    state[3] ^= state[1];
    state[1] ^= state[2];
    state[0] ^= state[3];
    state[2] ^= t;
    state[3] = state[3].rotate_left(11);

    result as f32 / u32::MAX as f32
}

#[inline]
fn uniform_noise(mu: f32, sigma: f32, state: &mut [u32; 4]) -> f32 {
    mu + 2.0 * (xoshiro128plus(state) - 0.5) * sigma
}

/// Box-Muller transform; `flip` alternates between the sine and cosine
/// branch so consecutive channels decorrelate.
#[inline]
fn gaussian_noise(mu: f32, sigma: f32, flip: bool, state: &mut [u32; 4]) -> f32 {
    let u1 = xoshiro128plus(state).max(f32::MIN_POSITIVE);
    let u2 = xoshiro128plus(state);
    let factor = (-2.0 * u1.ln()).sqrt();
    let angle = 2.0 * std::f32::consts::PI * u2;
    let noise = if flip {
        factor * angle.cos()
    } else {
        factor * angle.sin()
    };
    noise * sigma + mu
}

#[inline]
fn poissonian_noise(mu: f32, sigma: f32, flip: bool, state: &mut [u32; 4]) -> f32 {
    // shot noise approximation: deviation grows with the signal
    gaussian_noise(mu, sigma * mu.max(0.0).sqrt(), flip, state)
}

#[inline]
fn sample(
    distribution: NoiseDistribution,
    mu: f32,
    sigma: f32,
    flip: bool,
    state: &mut [u32; 4],
) -> f32 {
    match distribution {
        NoiseDistribution::Uniform => uniform_noise(mu, sigma, state),
        NoiseDistribution::Gaussian => gaussian_noise(mu, sigma, flip, state),
        NoiseDistribution::Poissonian => poissonian_noise(mu, sigma, flip, state),
    }
}

/// Blends noise into clipped areas, weighted by the mask.
///
/// `noise_level` should already be divided by the view downscale factor
/// so noise does not amplify when zoomed out; `threshold` is the derived
/// clipping threshold, which scales the per-channel deviation relative
/// to the pixel value. Fully valid pixels (mask weight 0) pass through
/// untouched; alpha always passes through.
pub fn inpaint_noise(
    input: &RgbaBuffer,
    mask: &PlaneBuffer,
    output: &mut RgbaBuffer,
    noise_level: f32,
    threshold: f32,
    distribution: NoiseDistribution,
) {
    debug_assert_eq!(input.pixel_count(), mask.data().len());
    let width = input.width();
    const FLIP: [bool; 3] = [true, false, true];

    output
        .data_mut()
        .par_chunks_mut(width * CHANNELS)
        .enumerate()
        .for_each(|(i, out_row)| {
            let in_row = input.row(i);
            let mask_row = &mask.data()[i * width..(i + 1) * width];
            for j in 0..width {
                // seeded from coordinates: deterministic across runs and threads
                let mut state = [
                    splitmix32(j as u64 + 1),
                    splitmix32((j as u64 + 1) * (i as u64 + 3)),
                    splitmix32(1337),
                    splitmix32(666),
                ];
                for _ in 0..4 {
                    xoshiro128plus(&mut state);
                }

                let weight = mask_row[j];
                let px = &in_row[j * CHANNELS..(j + 1) * CHANNELS];
                let out = &mut out_row[j * CHANNELS..(j + 1) * CHANNELS];
                for c in 0..3 {
                    let sigma = px[c] * noise_level / threshold;
                    let noise = sample(distribution, px[c], sigma, FLIP[c], &mut state);
                    out[c] = (px[c] * (1.0 - weight) + weight * noise).max(0.0);
                }
                out[3] = px[3];
            }
        });
}
