//! Execution backends.
//!
//! The pipeline is written once against the [`Backend`] trait, whose
//! methods are the four stage boundaries of a render: mask, inpaint,
//! reconstruct, apply. [`CpuBackend`] is the reference implementation;
//! an accelerator backend implements the same stages with
//! bit-approximate results and the host orchestration stays identical.

use filmic_core::{LuminanceProfile, NormMethod, PlaneBuffer, RgbaBuffer};
use filmic_curve::ColorScience;
use filmic_reconstruct::{
    inpaint_noise, mask_clipped_pixels, reconstruct_highlights, ReconstructMode,
};

use crate::apply;
use crate::engine::Engine;
use crate::error::Result;

/// One execution backend: the four render stages.
pub trait Backend: Sync {
    /// Builds the soft clipping mask. Returns `true` if enough pixels
    /// are clipped for reconstruction to be worthwhile.
    fn build_mask(&self, engine: &Engine, input: &RgbaBuffer, mask: &mut PlaneBuffer) -> bool;

    /// Inpaints coordinate-seeded noise over the masked areas.
    ///
    /// `noise_level` is already compensated for the view scale.
    fn inpaint(
        &self,
        engine: &Engine,
        input: &RgbaBuffer,
        mask: &PlaneBuffer,
        output: &mut RgbaBuffer,
        noise_level: f32,
    );

    /// Runs the multi-scale wavelet reconstruction.
    fn reconstruct(
        &self,
        engine: &Engine,
        input: &RgbaBuffer,
        mask: &PlaneBuffer,
        reconstructed: &mut RgbaBuffer,
        mode: ReconstructMode,
        scales: usize,
    ) -> Result<()>;

    /// Applies the tone curve, desaturation, and chroma handling.
    fn apply(
        &self,
        engine: &Engine,
        input: &RgbaBuffer,
        output: &mut RgbaBuffer,
        profile: Option<&dyn LuminanceProfile>,
    );
}

/// Reference CPU backend, row-parallel with rayon.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl Backend for CpuBackend {
    fn build_mask(&self, engine: &Engine, input: &RgbaBuffer, mask: &mut PlaneBuffer) -> bool {
        let d = engine.derived();
        mask_clipped_pixels(input, mask, d.normalize, d.reconstruct_feather)
    }

    fn inpaint(
        &self,
        engine: &Engine,
        input: &RgbaBuffer,
        mask: &PlaneBuffer,
        output: &mut RgbaBuffer,
        noise_level: f32,
    ) {
        inpaint_noise(
            input,
            mask,
            output,
            noise_level,
            engine.derived().reconstruct_threshold,
            engine.params().noise_distribution,
        );
    }

    fn reconstruct(
        &self,
        engine: &Engine,
        input: &RgbaBuffer,
        mask: &PlaneBuffer,
        reconstructed: &mut RgbaBuffer,
        mode: ReconstructMode,
        scales: usize,
    ) -> Result<()> {
        reconstruct_highlights(
            input,
            mask,
            reconstructed,
            mode,
            &engine.derived().weights,
            scales,
        )?;
        Ok(())
    }

    fn apply(
        &self,
        engine: &Engine,
        input: &RgbaBuffer,
        output: &mut RgbaBuffer,
        profile: Option<&dyn LuminanceProfile>,
    ) {
        let params = engine.params();
        // dispatch once: each loop body is specialized for its chroma
        // handling and color science generation
        match (params.preserve_color, params.version) {
            (None, ColorScience::V1) => apply::split_v1(input, output, engine, profile),
            (None, _) => apply::split_v2_v3(input, output, engine, profile),
            (Some(method), ColorScience::V1) => {
                apply::chroma_v1(input, output, engine, method, profile)
            }
            (Some(method), version) => apply::chroma_v2_v3(
                input,
                output,
                engine,
                method,
                version == ColorScience::V3,
                profile,
            ),
        }
    }
}

/// Norm used by the high-quality ratio refinement passes.
///
/// The unscaled Euclidean norm keeps the refinement compatible with
/// renders produced before the norm rework.
pub const REFINE_NORM: NormMethod = NormMethod::EuclideanV1;
