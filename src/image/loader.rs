use crate::image::bitmap::SourceBitmap;
use crate::utils::error::DigitError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, ImageFormat};
use std::path::Path;

/// Upper bound on an encoded canvas upload.
pub const MAX_IMAGE_BYTES: usize = 4 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// Decode a base64 string, with or without a `data:image/...;base64,`
    /// prefix, into raw bytes.
    pub fn decode_base64(base64_data: &str) -> Result<Vec<u8>> {
        let base64_clean = match base64_data.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => base64_data,
        };

        let bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean.trim())?;

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(DigitError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        Ok(bytes)
    }

    /// Load an encoded image (PNG, ...) from a base64 string or data URL.
    pub fn from_base64(base64_data: &str) -> Result<DynamicImage> {
        let bytes = Self::decode_base64(base64_data)?;
        Self::from_bytes(&bytes)
    }

    /// Load an encoded image from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(DigitError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        if let Some(format) = Self::detect_format(bytes) {
            if !Self::is_supported_format(format) {
                return Err(DigitError::UnsupportedFormat(format!("{:?}", format)));
            }
        }

        Ok(image::load_from_memory(bytes)?)
    }

    /// Load an image file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<DynamicImage> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::WebP
        )
    }

    /// Convert a decoded image into a canvas snapshot of side `size`.
    ///
    /// The image must already be `size`x`size`; scaling here would hide a
    /// client that captured the wrong surface.
    pub fn to_source_bitmap(image: DynamicImage, size: u32) -> Result<SourceBitmap> {
        SourceBitmap::new(image.into_rgba8(), size)
    }

    /// Raw RGBA pixels as read straight off a canvas, base64 encoded.
    pub fn from_rgba_base64(
        base64_data: &str,
        width: u32,
        height: u32,
        size: u32,
    ) -> Result<SourceBitmap> {
        let data = Self::decode_base64(base64_data)?;
        SourceBitmap::from_rgba(width, height, data, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(img: &RgbaImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[test]
    fn strips_data_url_prefix() {
        let img = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(&img));

        let plain = ImageLoader::from_base64(&encoded).unwrap();
        let url = ImageLoader::from_base64(&format!("data:image/png;base64,{encoded}")).unwrap();
        assert_eq!(plain.to_rgba8(), url.to_rgba8());
    }

    #[test]
    fn rejects_garbage_base64() {
        assert!(matches!(
            ImageLoader::from_base64("not base64 !!"),
            Err(DigitError::Base64(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            ImageLoader::from_path("no/such/canvas.png"),
            Err(DigitError::Io(_))
        ));
    }

    #[test]
    fn to_source_bitmap_checks_size() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(28, 28));
        assert!(ImageLoader::to_source_bitmap(img.clone(), 28).is_ok());
        assert!(matches!(
            ImageLoader::to_source_bitmap(img, 280),
            Err(DigitError::BitmapSize { .. })
        ));
    }

    #[test]
    fn raw_rgba_round_trip() {
        let pixels = vec![255u8; 2 * 2 * 4];
        let encoded = base64::engine::general_purpose::STANDARD.encode(&pixels);
        let bitmap = ImageLoader::from_rgba_base64(&encoded, 2, 2, 2).unwrap();
        assert_eq!(bitmap.as_image().get_pixel(1, 1).0, [255, 255, 255, 255]);
    }
}
