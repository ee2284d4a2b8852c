//! End-to-end preprocessing tests on synthetic canvases.

use approx::assert_abs_diff_eq;
use image::{Rgba, RgbaImage};
use onnx_digit::{
    config::{PreprocessConfig, ResampleFilter},
    image::{bitmap::WHITE, normalize, select_label, ImagePreprocessor, Label, SourceBitmap},
    DigitPipeline,
};

const BACKGROUND: f32 = (0.0 - 0.1307) / 0.3081;
const FOREGROUND: f32 = (1.0 - 0.1307) / 0.3081;

/// A "1": vertical anti-aliased stroke down the middle of the canvas.
fn draw_one() -> SourceBitmap {
    let img = RgbaImage::from_fn(280, 280, |x, y| {
        let dx = (x as i32 - 140).abs();
        if !(40..240).contains(&y) || dx > 14 {
            Rgba([0, 0, 0, 255])
        } else if dx > 12 {
            // soft edge from the stroke's round cap
            Rgba([100, 100, 100, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    });
    SourceBitmap::new(img, 280).unwrap()
}

#[test]
fn blank_canvas_end_to_end() {
    let tensor = DigitPipeline::default()
        .preprocess(&SourceBitmap::blank(280))
        .unwrap();

    assert_eq!(tensor.len(), 784);
    for v in tensor.iter() {
        assert_abs_diff_eq!(*v, BACKGROUND, epsilon = 1e-5);
    }
    assert_abs_diff_eq!(BACKGROUND, -0.4242, epsilon = 1e-4);
}

#[test]
fn stroke_lands_in_the_center_columns() {
    let tensor = DigitPipeline::default().preprocess(&draw_one()).unwrap();
    let view = tensor.index_axis(ndarray::Axis(0), 0);
    let plane = view.index_axis(ndarray::Axis(0), 0);

    // rows 4..24 cover source rows 40..240
    for row in 5..23 {
        assert_abs_diff_eq!(plane[[row, 0]], BACKGROUND, epsilon = 1e-5);
        assert_abs_diff_eq!(plane[[row, 27]], BACKGROUND, epsilon = 1e-5);
        // source columns 130..140 are fully inside the stroke core
        assert_abs_diff_eq!(plane[[row, 13]], FOREGROUND, epsilon = 1e-5);
    }
    assert_abs_diff_eq!(plane[[1, 14]], BACKGROUND, epsilon = 1e-5);
}

#[test]
fn soft_edges_are_discarded_by_threshold() {
    // the gray fringe sits below the threshold and must not brighten
    // the columns next to the stroke
    let resampled =
        ImagePreprocessor::binarize_and_resample(&draw_one(), &PreprocessConfig::default());
    let column_12 = resampled.get_pixel(12, 10).0[0];
    let column_15 = resampled.get_pixel(15, 10).0[0];

    // column 12 covers source 120..130: 128..130 is core (2 px)
    assert_eq!(column_12, 51);
    // column 15 covers 150..160: 150..=152 is core (3 px)
    assert_eq!(column_15, 77);
}

#[test]
fn every_filter_is_uniform_on_uniform_input() {
    for filter in [
        ResampleFilter::Area,
        ResampleFilter::Triangle,
        ResampleFilter::CatmullRom,
        ResampleFilter::Lanczos3,
    ] {
        let config = PreprocessConfig {
            filter,
            ..PreprocessConfig::default()
        };
        let resampled =
            ImagePreprocessor::binarize_and_resample(&SourceBitmap::filled(280, WHITE), &config);
        let tensor = normalize(&resampled, config.mean, config.std);
        assert!(
            tensor.iter().all(|v| (v - FOREGROUND).abs() < 1e-5),
            "{filter:?}"
        );
    }
}

#[test]
fn ten_class_scores_select_index_two() {
    let scores = [2.1, 0.3, 5.7, 0.4, -2.0, 1.5, 3.3, 0.0, 4.4, 1.0];
    assert_eq!(select_label(&scores), Label::from(2));
    assert_eq!(select_label(&[]), Label::NONE);
}
