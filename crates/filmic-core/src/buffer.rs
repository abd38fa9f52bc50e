//! Pixel buffer types for the filmic engine.
//!
//! Two containers cover every stage of the pipeline:
//!
//! - [`RgbaBuffer`] - interleaved 4-channel (RGB + alpha) f32 image
//! - [`PlaneBuffer`] - single-channel f32 image (clipping mask, norms)
//!
//! # Memory Layout
//!
//! Buffers store pixels in **row-major** order, top-to-bottom, channels
//! interleaved: `[R G B A R G B A ...]` for one row, then the next row.
//! A row of an `RgbaBuffer` is therefore `width * 4` contiguous floats,
//! which is the unit the parallel loops in downstream crates split on.
//!
//! # Allocation
//!
//! Reconstruction allocates several full-resolution working buffers per
//! pass. [`RgbaBuffer::try_new`] reports allocation failure as an error
//! instead of aborting, so the pipeline can degrade to the
//! non-reconstructed path.

use crate::{CoreError, Result};

/// Number of interleaved channels in an [`RgbaBuffer`].
pub const CHANNELS: usize = 4;

/// Owned 4-channel float image buffer.
///
/// # Example
///
/// ```rust
/// use filmic_core::RgbaBuffer;
///
/// let mut img = RgbaBuffer::filled(16, 16, [0.18, 0.18, 0.18, 1.0]);
/// img.set_pixel(3, 4, [1.0, 0.5, 0.25, 1.0]);
/// assert_eq!(img.pixel(3, 4), [1.0, 0.5, 0.25, 1.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RgbaBuffer {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl RgbaBuffer {
    /// Creates a zero-filled buffer, reporting allocation failure as an error.
    pub fn try_new(width: usize, height: usize) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(CHANNELS))
            .ok_or_else(|| CoreError::InvalidDimensions("image dimensions overflow".into()))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| CoreError::Allocation(format!("{width}x{height} rgba buffer")))?;
        data.resize(len, 0.0);
        Ok(Self { data, width, height })
    }

    /// Creates a buffer filled with a constant pixel value.
    pub fn filled(width: usize, height: usize, pixel: [f32; CHANNELS]) -> Self {
        let mut data = Vec::with_capacity(width * height * CHANNELS);
        for _ in 0..width * height {
            data.extend_from_slice(&pixel);
        }
        Self { data, width, height }
    }

    /// Creates a buffer from existing interleaved pixel data.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDimensions`] if `data.len()` is not
    /// `width * height * 4`.
    pub fn from_data(width: usize, height: usize, data: Vec<f32>) -> Result<Self> {
        let expected = width * height * CHANNELS;
        if data.len() != expected {
            return Err(CoreError::InvalidDimensions(format!(
                "expected {} elements, got {}",
                expected,
                data.len()
            )));
        }
        Ok(Self { data, width, height })
    }

    /// Returns the buffer width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the buffer height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the total number of pixels.
    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Returns `true` if the buffer has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns the raw interleaved pixel data.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the raw interleaved pixel data, mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Returns the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [f32; CHANNELS] {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let offset = (y * self.width + x) * CHANNELS;
        let mut out = [0.0; CHANNELS];
        out.copy_from_slice(&self.data[offset..offset + CHANNELS]);
        out
    }

    /// Sets the pixel at (x, y).
    ///
    /// # Panics
    ///
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: [f32; CHANNELS]) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let offset = (y * self.width + x) * CHANNELS;
        self.data[offset..offset + CHANNELS].copy_from_slice(&pixel);
    }

    /// Returns one row of interleaved pixels.
    #[inline]
    pub fn row(&self, y: usize) -> &[f32] {
        debug_assert!(y < self.height, "row out of bounds");
        let start = y * self.width * CHANNELS;
        &self.data[start..start + self.width * CHANNELS]
    }

    /// Checks that `other` has the same dimensions.
    pub fn check_same_size(&self, other: &RgbaBuffer) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(CoreError::SizeMismatch(format!(
                "{}x{} vs {}x{}",
                self.width, self.height, other.width, other.height
            )));
        }
        Ok(())
    }
}

/// Owned single-channel float image buffer.
///
/// Used for the clipping mask and for per-pixel norms in the ratio
/// refinement pass. Same row-major layout as [`RgbaBuffer`], one float
/// per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaneBuffer {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl PlaneBuffer {
    /// Creates a zero-filled plane, reporting allocation failure as an error.
    pub fn try_new(width: usize, height: usize) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .ok_or_else(|| CoreError::InvalidDimensions("plane dimensions overflow".into()))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| CoreError::Allocation(format!("{width}x{height} plane buffer")))?;
        data.resize(len, 0.0);
        Ok(Self { data, width, height })
    }

    /// Returns the plane width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the plane height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the raw data.
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the raw data, mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Returns the value at (x, y).
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        debug_assert!(x < self.width && y < self.height);
        self.data[y * self.width + x]
    }

    /// Sum of all values, in f64 to avoid cancellation over large planes.
    pub fn sum(&self) -> f64 {
        self.data.iter().map(|&v| v as f64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_new_and_fill() {
        let img = RgbaBuffer::try_new(8, 4).unwrap();
        assert_eq!(img.width(), 8);
        assert_eq!(img.height(), 4);
        assert_eq!(img.data().len(), 8 * 4 * CHANNELS);

        let filled = RgbaBuffer::filled(2, 2, [1.0, 0.5, 0.25, 1.0]);
        assert_eq!(filled.pixel(1, 1), [1.0, 0.5, 0.25, 1.0]);
    }

    #[test]
    fn test_rgba_set_get_pixel() {
        let mut img = RgbaBuffer::try_new(4, 4).unwrap();
        img.set_pixel(2, 3, [2.0, 0.0, 0.0, 1.0]);
        assert_eq!(img.pixel(2, 3), [2.0, 0.0, 0.0, 1.0]);
        assert_eq!(img.pixel(0, 0), [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rgba_from_data_wrong_size() {
        let result = RgbaBuffer::from_data(4, 4, vec![0.0; 7]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rgba_row() {
        let img = RgbaBuffer::filled(3, 2, [0.1, 0.2, 0.3, 1.0]);
        let row = img.row(1);
        assert_eq!(row.len(), 3 * CHANNELS);
        assert_eq!(&row[0..4], &[0.1, 0.2, 0.3, 1.0]);
    }

    #[test]
    fn test_size_check() {
        let a = RgbaBuffer::try_new(4, 4).unwrap();
        let b = RgbaBuffer::try_new(4, 5).unwrap();
        assert!(a.check_same_size(&b).is_err());
        assert!(a.check_same_size(&a.clone()).is_ok());
    }

    #[test]
    fn test_plane_sum() {
        let mut plane = PlaneBuffer::try_new(4, 4).unwrap();
        plane.data_mut()[5] = 0.5;
        plane.data_mut()[10] = 0.25;
        assert!((plane.sum() - 0.75).abs() < 1e-9);
    }
}
