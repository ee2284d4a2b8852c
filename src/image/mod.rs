pub mod bitmap;
pub mod loader;
pub mod normalization;
pub mod postprocessing;
pub mod preprocessing;
pub mod transforms;

pub use bitmap::{BinaryBitmap, ResampledBitmap, SourceBitmap};
pub use loader::ImageLoader;
pub use normalization::{normalize, InputTensor};
pub use postprocessing::{select_label, softmax, Label};
pub use preprocessing::ImagePreprocessor;
pub use transforms::ImageTransforms;
