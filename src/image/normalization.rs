//! Mean/std standardization of the resampled canvas into the classifier's
//! input layout.

use crate::image::bitmap::ResampledBitmap;
use ndarray::Array4;

/// Classifier input, shaped `[1, 1, H, W]` and stored row-major.
pub type InputTensor = Array4<f32>;

/// Standardize a resampled bitmap into a single-batch, single-channel tensor.
///
/// Each pixel's red channel is scaled to `[0, 1]` and mapped through
/// `(v - mean) / std`. Channels are equal after binarization, so red stands
/// in for the whole pixel.
pub fn normalize(resampled: &ResampledBitmap, mean: f32, std: f32) -> InputTensor {
    let (width, height) = resampled.dimensions();

    Array4::from_shape_fn((1, 1, height as usize, width as usize), |(_, _, y, x)| {
        standardize(resampled.get_pixel(x as u32, y as u32).0[0], mean, std)
    })
}

/// Standardize a single 8-bit intensity.
#[inline]
pub fn standardize(value: u8, mean: f32, std: f32) -> f32 {
    (value as f32 / 255.0 - mean) / std
}
