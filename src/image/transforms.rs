use crate::config::ResampleFilter;
use image::{imageops, Rgba, RgbaImage};

/// Image transform helpers
pub struct ImageTransforms;

impl ImageTransforms {
    /// Resize a square image to `size`x`size`.
    pub fn resize_square(image: &RgbaImage, size: u32, filter: ResampleFilter) -> RgbaImage {
        match filter.filter_type() {
            None => Self::resize_area(image, size, size),
            Some(kernel) => imageops::resize(image, size, size, kernel),
        }
    }

    /// Area-averaging resize: each output pixel is the coverage-weighted mean
    /// of the source pixels under its footprint. Non-integer ratios split
    /// border pixels fractionally.
    pub fn resize_area(image: &RgbaImage, dst_w: u32, dst_h: u32) -> RgbaImage {
        let (src_w, src_h) = image.dimensions();
        if src_w == 0 || src_h == 0 || dst_w == 0 || dst_h == 0 {
            return RgbaImage::new(dst_w, dst_h);
        }

        let cols = Self::coverage(src_w, dst_w);
        let rows = Self::coverage(src_h, dst_h);

        let mut out = RgbaImage::new(dst_w, dst_h);
        for (y, row_weights) in rows.iter().enumerate() {
            for (x, col_weights) in cols.iter().enumerate() {
                let mut acc = [0.0f64; 4];
                let mut total = 0.0f64;

                for &(sy, wy) in row_weights {
                    for &(sx, wx) in col_weights {
                        let w = wy * wx;
                        let p = image.get_pixel(sx, sy);
                        for (c, value) in acc.iter_mut().enumerate() {
                            *value += p[c] as f64 * w;
                        }
                        total += w;
                    }
                }

                let mut px = [0u8; 4];
                for (c, value) in acc.iter().enumerate() {
                    px[c] = (value / total).round().clamp(0.0, 255.0) as u8;
                }
                out.put_pixel(x as u32, y as u32, Rgba(px));
            }
        }

        out
    }

    /// For every destination index along one axis, the source indices it
    /// covers and by how much.
    fn coverage(src_len: u32, dst_len: u32) -> Vec<Vec<(u32, f64)>> {
        let scale = src_len as f64 / dst_len as f64;

        (0..dst_len)
            .map(|d| {
                let start = d as f64 * scale;
                let end = (d + 1) as f64 * scale;
                let first = start.floor() as u32;
                let last = (end.ceil() as u32).min(src_len);

                (first..last)
                    .filter_map(|s| {
                        let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                        (overlap > 1e-9).then_some((s, overlap))
                    })
                    .collect()
            })
            .collect()
    }

    /// Rec. 601 luma of an RGBA pixel, ignoring alpha.
    pub fn luma(pixel: &Rgba<u8>) -> u8 {
        let [r, g, b, _] = pixel.0;
        let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        y.round().clamp(0.0, 255.0) as u8
    }
}
