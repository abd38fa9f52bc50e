//! Render orchestration.
//!
//! One render is a fixed stage sequence: build the clipping mask,
//! optionally inpaint and reconstruct the clipped highlights, then
//! apply the tone curve. Reconstruction is best-effort: if any of its
//! working buffers fails to allocate, the stage is skipped with a log
//! message and the curve runs on the unmodified input.

use filmic_core::{LuminanceProfile, PlaneBuffer, RgbaBuffer, Roi};
use filmic_reconstruct::{compute_ratios, restore_ratios, scale_count, ReconstructMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::apply::display_mask;
use crate::backend::{Backend, REFINE_NORM};
use crate::engine::Engine;
use crate::error::Result;

/// Per-render options from the host.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Skip reconstruction entirely (preview / thumbnail path).
    pub fast: bool,
    /// Output the clipping mask instead of the render.
    pub show_mask: bool,
}

/// What a render did, for host-side display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Enough clipping was detected to justify reconstruction.
    pub clipping_detected: bool,
    /// Reconstruction actually ran and its output was used.
    pub reconstructed: bool,
    /// Wavelet scales used (0 when reconstruction was skipped).
    pub scales: usize,
    /// The curve builder had to raise the requested contrast.
    pub contrast_clamped: bool,
}

/// Renders one frame.
///
/// `roi` describes the view: its dimensions must match `input` and set
/// the wavelet scale count; its scale factor drives the noise amplitude
/// compensation. Returns the output buffer and diagnostics.
pub fn render(
    engine: &Engine,
    backend: &dyn Backend,
    input: &RgbaBuffer,
    roi: &Roi,
    profile: Option<&dyn LuminanceProfile>,
    options: &RenderOptions,
) -> Result<(RgbaBuffer, Diagnostics)> {
    let width = input.width();
    let height = input.height();

    let mut diagnostics = Diagnostics {
        contrast_clamped: engine.curve().contrast_clamped(),
        ..Diagnostics::default()
    };

    let mut mask = PlaneBuffer::try_new(width, height)?;
    diagnostics.clipping_detected = backend.build_mask(engine, input, &mut mask);

    if options.show_mask {
        let mut output = RgbaBuffer::try_new(width, height)?;
        display_mask(&mask, &mut output);
        return Ok((output, diagnostics));
    }

    let mut reconstructed = None;
    if !options.fast && diagnostics.clipping_detected {
        let scales = scale_count(roi);
        match reconstruct_pass(engine, backend, input, &mask, roi, scales, profile) {
            Ok(buffer) => {
                diagnostics.reconstructed = true;
                diagnostics.scales = scales;
                reconstructed = Some(buffer);
            }
            // degraded but valid: tone-map the unreconstructed input
            Err(err) => warn!(error = %err, "highlight reconstruction skipped"),
        }
    }

    let source = reconstructed.as_ref().unwrap_or(input);
    let mut output = RgbaBuffer::try_new(width, height)?;
    backend.apply(engine, source, &mut output, profile);

    debug!(?diagnostics, "render complete");
    Ok((output, diagnostics))
}

/// Noise inpainting, the RGB reconstruction pass, and the optional
/// ratio refinement passes.
fn reconstruct_pass(
    engine: &Engine,
    backend: &dyn Backend,
    input: &RgbaBuffer,
    mask: &PlaneBuffer,
    roi: &Roi,
    scales: usize,
    profile: Option<&dyn LuminanceProfile>,
) -> Result<RgbaBuffer> {
    let width = input.width();
    let height = input.height();

    // don't amplify noise when the view is downscaled
    let noise_level = engine.derived().noise_level / roi.downscale_factor();

    let mut inpainted = RgbaBuffer::try_new(width, height)?;
    backend.inpaint(engine, input, mask, &mut inpainted, noise_level);

    let mut reconstructed = RgbaBuffer::try_new(width, height)?;
    backend.reconstruct(
        engine,
        &inpainted,
        mask,
        &mut reconstructed,
        ReconstructMode::Rgb,
        scales,
    )?;
    drop(inpainted);

    let refinements = engine.params().high_quality_reconstruction;
    if refinements > 0 {
        let mut norms = PlaneBuffer::try_new(width, height)?;
        let mut ratios = RgbaBuffer::try_new(width, height)?;

        for _ in 0..refinements {
            compute_ratios(&reconstructed, &mut norms, &mut ratios, REFINE_NORM, profile);
            backend.reconstruct(
                engine,
                &ratios,
                mask,
                &mut reconstructed,
                ReconstructMode::Ratios,
                scales,
            )?;
            restore_ratios(&mut reconstructed, &norms);
        }
    }

    Ok(reconstructed)
}
