use crate::utils::error::DigitError;
use crate::Result;
use image::{Rgba, RgbaImage};

pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Full-resolution canvas snapshot after thresholding. Every pixel is either
/// [`BLACK`] or [`WHITE`].
pub type BinaryBitmap = RgbaImage;

/// Canvas reduced to the classifier resolution. Edge pixels may be gray.
pub type ResampledBitmap = RgbaImage;

/// A square RGBA canvas snapshot of a known side length.
///
/// Construction is the only place the dimension precondition is checked; the
/// preprocessing functions downstream assume it holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBitmap {
    pixels: RgbaImage,
}

impl SourceBitmap {
    /// Wraps `pixels`, rejecting anything that is not `size`x`size`.
    pub fn new(pixels: RgbaImage, size: u32) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        if width != size || height != size {
            return Err(DigitError::BitmapSize {
                width,
                height,
                expected: size,
            });
        }
        Ok(Self { pixels })
    }

    /// Builds a bitmap from tightly packed RGBA bytes, row-major.
    ///
    /// The declared dimensions are checked against `size` before the buffer
    /// length is computed from them.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>, size: u32) -> Result<Self> {
        if width != size || height != size {
            return Err(DigitError::BitmapSize {
                width,
                height,
                expected: size,
            });
        }
        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| {
                DigitError::InvalidInput(format!("{}x{} canvas is too large", width, height))
            })?;
        if data.len() != expected_len {
            return Err(DigitError::InvalidInput(format!(
                "RGBA buffer holds {} bytes, {}x{} needs {}",
                data.len(),
                width,
                height,
                expected_len
            )));
        }
        let pixels = RgbaImage::from_raw(width, height, data).ok_or_else(|| {
            DigitError::InvalidInput("RGBA buffer does not match dimensions".to_string())
        })?;
        Self::new(pixels, size)
    }

    /// A cleared canvas: opaque black everywhere.
    pub fn blank(size: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(size, size, BLACK),
        }
    }

    /// A canvas painted entirely with `color`.
    pub fn filled(size: u32, color: Rgba<u8>) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(size, size, color),
        }
    }

    /// Side length in pixels.
    pub fn size(&self) -> u32 {
        self.pixels.width()
    }

    /// Borrow the underlying pixels.
    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_dimensions() {
        let err = SourceBitmap::new(RgbaImage::new(280, 200), 280).unwrap_err();
        assert!(matches!(
            err,
            DigitError::BitmapSize {
                width: 280,
                height: 200,
                expected: 280
            }
        ));
    }

    #[test]
    fn rejects_short_rgba_buffer() {
        let err = SourceBitmap::from_rgba(4, 4, vec![0; 10], 4).unwrap_err();
        assert!(matches!(err, DigitError::InvalidInput(_)));
    }

    #[test]
    fn huge_declared_dimensions_are_rejected() {
        let err = SourceBitmap::from_rgba(u32::MAX, u32::MAX, vec![0; 4], 280).unwrap_err();
        assert!(matches!(
            err,
            DigitError::BitmapSize {
                width: u32::MAX,
                height: u32::MAX,
                expected: 280
            }
        ));
    }

    #[test]
    fn rgba_dimensions_must_match_canvas() {
        let err = SourceBitmap::from_rgba(8, 8, vec![0; 8 * 8 * 4], 4).unwrap_err();
        assert!(matches!(err, DigitError::BitmapSize { expected: 4, .. }));
    }

    #[test]
    fn blank_canvas_is_opaque_black() {
        let bitmap = SourceBitmap::blank(8);
        assert_eq!(bitmap.size(), 8);
        assert!(bitmap.as_image().pixels().all(|p| *p == BLACK));
    }
}
