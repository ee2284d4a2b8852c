pub mod config;
pub mod image;
pub mod models;
pub mod recognition;
pub mod utils;
pub mod web;

pub use config::Config;
pub use recognition::{DigitPipeline, Prediction, RecognitionSession, Status};
pub use utils::error::DigitError;

pub type Result<T> = std::result::Result<T, DigitError>;
