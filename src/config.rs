use crate::utils::error::DigitError;
use crate::Result;
use clap::ValueEnum;
use image::imageops::FilterType;
use serde::Serialize;
use std::path::PathBuf;

/// Side length of the drawing canvas in pixels.
pub const CANVAS_SIZE: u32 = 280;

/// Side length of the classifier input.
pub const INPUT_TENSOR_SIZE: u32 = 28;

/// Red-channel cutoff separating stroke from background.
pub const BINARY_THRESHOLD: u8 = 128;

/// MNIST training-set statistics. The classifier was trained with these.
pub const MNIST_MEAN: f32 = 0.1307;
pub const MNIST_STD: f32 = 0.3081;

pub const DEFAULT_MODEL_PATH: &str = "image_classifier_model.onnx";

#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub bind_addr: String,

    /// ONNX model file
    pub model_path: PathBuf,

    /// Tokio worker threads
    pub workers: usize,

    /// Development mode
    pub dev_mode: bool,

    pub onnx_config: OnnxConfig,

    pub server_config: ServerConfig,

    pub preprocess: PreprocessConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct OnnxConfig {
    /// CPU threads used inside a single operator
    pub intra_threads: usize,

    /// Graph optimization level (0-3)
    pub optimization_level: u8,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Request timeout in seconds
    pub request_timeout: u64,

    /// Maximum request body in bytes
    pub max_request_size: usize,
}

/// Which channel value is compared against the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdChannel {
    /// Red channel only. Assumes a neutral (gray) stroke color.
    #[default]
    Red,
    /// Rec. 601 luma, for canvases drawn with colored strokes.
    Luminance,
}

/// Resampling kernel used when shrinking the canvas.
///
/// Nearest-neighbour is deliberately absent: the classifier expects the
/// averaged edges a smoothing downscale produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResampleFilter {
    /// Coverage-weighted box average.
    #[default]
    Area,
    Triangle,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResampleFilter {
    /// Kernel for `image::imageops::resize`. `Area` is implemented in-crate.
    pub fn filter_type(self) -> Option<FilterType> {
        match self {
            ResampleFilter::Area => None,
            ResampleFilter::Triangle => Some(FilterType::Triangle),
            ResampleFilter::CatmullRom => Some(FilterType::CatmullRom),
            ResampleFilter::Gaussian => Some(FilterType::Gaussian),
            ResampleFilter::Lanczos3 => Some(FilterType::Lanczos3),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreprocessConfig {
    pub canvas_size: u32,
    pub input_size: u32,
    pub threshold: u8,
    pub channel: ThresholdChannel,
    pub filter: ResampleFilter,
    pub mean: f32,
    pub std: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            canvas_size: CANVAS_SIZE,
            input_size: INPUT_TENSOR_SIZE,
            threshold: BINARY_THRESHOLD,
            channel: ThresholdChannel::Red,
            filter: ResampleFilter::Area,
            mean: MNIST_MEAN,
            std: MNIST_STD,
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<()> {
        if self.canvas_size == 0 || self.input_size == 0 {
            return Err(DigitError::Config(
                "canvas and input sizes must be non-zero".to_string(),
            ));
        }
        if self.input_size > self.canvas_size {
            return Err(DigitError::Config(format!(
                "input size {} exceeds canvas size {}",
                self.input_size, self.canvas_size
            )));
        }
        if !(self.std > 0.0) || !self.mean.is_finite() {
            return Err(DigitError::Config(format!(
                "invalid normalization constants: mean={}, std={}",
                self.mean, self.std
            )));
        }
        Ok(())
    }

    /// Number of values in the classifier input.
    pub fn tensor_len(&self) -> usize {
        (self.input_size as usize).pow(2)
    }
}

impl Config {
    pub fn new(
        bind_addr: String,
        model_path: impl Into<PathBuf>,
        workers: Option<usize>,
        dev_mode: bool,
        preprocess: PreprocessConfig,
    ) -> Result<Self> {
        preprocess.validate()?;

        let cpu_cores = num_cpus::get();
        let workers = workers.unwrap_or(cpu_cores);

        let onnx_config = OnnxConfig {
            // a 28x28 network gains nothing from many threads
            intra_threads: (cpu_cores / 2).clamp(1, 4),
            optimization_level: 3,
        };

        let server_config = ServerConfig {
            request_timeout: if dev_mode { 300 } else { 30 },
            max_request_size: 5 * 1024 * 1024,
        };

        Ok(Self {
            bind_addr,
            model_path: model_path.into(),
            workers,
            dev_mode,
            onnx_config,
            server_config,
            preprocess,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5006".to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            workers: 1,
            dev_mode: false,
            onnx_config: OnnxConfig {
                intra_threads: 1,
                optimization_level: 3,
            },
            server_config: ServerConfig {
                request_timeout: 30,
                max_request_size: 5 * 1024 * 1024,
            },
            preprocess: PreprocessConfig::default(),
        }
    }
}
