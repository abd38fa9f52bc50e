//! Region-of-interest descriptor.

use serde::{Deserialize, Serialize};

/// Region of interest handed to the engine by the host pipeline.
///
/// The engine uses the ROI only to size its working buffers and to derive
/// the wavelet scale count: the coarsest reconstruction filter should cover
/// a constant fraction of the image no matter the preview zoom, so the
/// scale count depends on the pixel extent of the region at its current
/// display scale.
///
/// # Example
///
/// ```rust
/// use filmic_core::Roi;
///
/// let roi = Roi::full(1920, 1080);
/// assert_eq!(roi.scale, 1.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Roi {
    /// Horizontal origin in pixels.
    pub x: u32,
    /// Vertical origin in pixels.
    pub y: u32,
    /// Region width in pixels, at the current display scale.
    pub width: u32,
    /// Region height in pixels, at the current display scale.
    pub height: u32,
    /// Display scale relative to full resolution (1.0 = 100%).
    pub scale: f32,
}

impl Roi {
    /// A full-resolution region starting at the origin.
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height, scale: 1.0 }
    }

    /// Largest dimension of the region, in pixels.
    #[inline]
    pub fn max_dimension(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Factor by which preview downscaling shrinks image features.
    ///
    /// Used to attenuate injected noise on zoomed-out previews; magnified
    /// views (> 100%) never amplify it.
    #[inline]
    pub fn downscale_factor(&self) -> f32 {
        (1.0 / self.scale).max(1.0)
    }
}
