use crate::config::{PreprocessConfig, ResampleFilter, ThresholdChannel};
use crate::image::bitmap::{BinaryBitmap, ResampledBitmap, SourceBitmap, BLACK, WHITE};
use crate::image::transforms::ImageTransforms;
use image::{Rgba, RgbaImage};

/// Canvas preprocessing: threshold to two colors, then shrink.
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Threshold then downsample a canvas snapshot to the classifier
    /// resolution.
    ///
    /// The order matters. Shrinking a strictly two-color image only yields a
    /// handful of gray levels along stroke edges, which differs from the
    /// smooth gradients in the training digits. Resampling the raw canvas
    /// instead would change classifier behavior, so the order is kept as is.
    pub fn binarize_and_resample(
        source: &SourceBitmap,
        config: &PreprocessConfig,
    ) -> ResampledBitmap {
        let binary = Self::binarize(source.as_image(), config.threshold, config.channel);

        if tracing::enabled!(tracing::Level::DEBUG) {
            let has_stroke = binary.pixels().any(|p| *p == WHITE);
            tracing::debug!(
                "Binarized {}x{} canvas, stroke present: {}",
                binary.width(),
                binary.height(),
                has_stroke
            );
        }

        Self::resample(&binary, config.input_size, config.filter)
    }

    /// Map every pixel to opaque white when its intensity is at or above
    /// `threshold`, opaque black otherwise.
    ///
    /// With [`ThresholdChannel::Red`] only the red channel is inspected. That
    /// is exact only when strokes are drawn in a neutral color (r == g == b);
    /// use [`ThresholdChannel::Luminance`] for colored strokes.
    pub fn binarize(image: &RgbaImage, threshold: u8, channel: ThresholdChannel) -> BinaryBitmap {
        let mut binary = RgbaImage::new(image.width(), image.height());

        for (src, dst) in image.pixels().zip(binary.pixels_mut()) {
            let intensity = Self::intensity(src, channel);
            *dst = if intensity >= threshold { WHITE } else { BLACK };
        }

        binary
    }

    /// Downsample a binary bitmap to `size`x`size`.
    pub fn resample(binary: &BinaryBitmap, size: u32, filter: ResampleFilter) -> ResampledBitmap {
        if binary.width() == size && binary.height() == size {
            return binary.clone();
        }
        ImageTransforms::resize_square(binary, size, filter)
    }

    fn intensity(pixel: &Rgba<u8>, channel: ThresholdChannel) -> u8 {
        match channel {
            ThresholdChannel::Red => pixel.0[0],
            ThresholdChannel::Luminance => ImageTransforms::luma(pixel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PreprocessConfig {
        PreprocessConfig::default()
    }

    #[test]
    fn threshold_is_inclusive() {
        let img = RgbaImage::from_fn(3, 1, |x, _| match x {
            0 => Rgba([127, 127, 127, 255]),
            1 => Rgba([128, 128, 128, 255]),
            _ => Rgba([255, 255, 255, 0]),
        });
        let binary = ImagePreprocessor::binarize(&img, 128, ThresholdChannel::Red);
        assert_eq!(*binary.get_pixel(0, 0), BLACK);
        assert_eq!(*binary.get_pixel(1, 0), WHITE);
        // alpha is forced opaque
        assert_eq!(*binary.get_pixel(2, 0), WHITE);
    }

    #[test]
    fn red_channel_ignores_green_and_blue() {
        let img = RgbaImage::from_pixel(1, 1, Rgba([10, 250, 250, 255]));
        let binary = ImagePreprocessor::binarize(&img, 128, ThresholdChannel::Red);
        assert_eq!(*binary.get_pixel(0, 0), BLACK);

        let binary = ImagePreprocessor::binarize(&img, 128, ThresholdChannel::Luminance);
        assert_eq!(*binary.get_pixel(0, 0), WHITE);
    }

    #[test]
    fn binary_output_has_two_colors() {
        let img = RgbaImage::from_fn(16, 16, |x, y| {
            let v = ((x * 16 + y) % 256) as u8;
            Rgba([v, v, v, 200])
        });
        let binary = ImagePreprocessor::binarize(&img, 128, ThresholdChannel::Red);
        assert!(binary.pixels().all(|p| *p == BLACK || *p == WHITE));
    }

    #[test]
    fn all_black_canvas_resamples_to_zero() {
        let out = ImagePreprocessor::binarize_and_resample(&SourceBitmap::blank(280), &config());
        assert_eq!(out.dimensions(), (28, 28));
        assert!(out.pixels().all(|p| p.0[..3] == [0, 0, 0]));
    }

    #[test]
    fn all_white_canvas_resamples_to_full_intensity() {
        let source = SourceBitmap::filled(280, WHITE);
        let out = ImagePreprocessor::binarize_and_resample(&source, &config());
        assert!(out.pixels().all(|p| p.0[..3] == [255, 255, 255]));
    }

    #[test]
    fn light_gray_canvas_becomes_uniform_white() {
        let source = SourceBitmap::filled(280, Rgba([180, 180, 180, 255]));
        let out = ImagePreprocessor::binarize_and_resample(&source, &config());
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn stroke_edges_are_averaged() {
        // a vertical bar 5 pixels wide straddling one output column boundary
        let img = RgbaImage::from_fn(280, 280, |x, _| {
            if (135..140).contains(&x) {
                WHITE
            } else {
                BLACK
            }
        });
        let source = SourceBitmap::new(img, 280).unwrap();
        let out = ImagePreprocessor::binarize_and_resample(&source, &config());

        // output column 13 covers source columns 130..140, half of it white
        let edge = out.get_pixel(13, 10).0[0];
        assert!(edge > 0 && edge < 255, "edge value {edge}");
        assert_eq!(out.get_pixel(0, 10).0[0], 0);
    }
}
