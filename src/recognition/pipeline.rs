use crate::{
    config::PreprocessConfig,
    image::{normalize, select_label, softmax, ImagePreprocessor, InputTensor, SourceBitmap},
    models::Classify,
    recognition::{Prediction, PredictionTimings},
    utils::error::DigitError,
    Result,
};
use std::time::Instant;

/// Canvas → tensor → classifier → label.
#[derive(Debug, Clone)]
pub struct DigitPipeline {
    config: PreprocessConfig,
}

impl DigitPipeline {
    pub fn new(config: PreprocessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Convert a canvas snapshot into the classifier input tensor.
    pub fn preprocess(&self, bitmap: &SourceBitmap) -> Result<InputTensor> {
        let expected = self.config.canvas_size;
        if bitmap.size() != expected {
            return Err(DigitError::BitmapSize {
                width: bitmap.size(),
                height: bitmap.size(),
                expected,
            });
        }

        let resampled = ImagePreprocessor::binarize_and_resample(bitmap, &self.config);
        let tensor = normalize(&resampled, self.config.mean, self.config.std);
        if tensor.len() != self.config.tensor_len() {
            return Err(DigitError::Internal(format!(
                "tensor holds {} values, classifier expects {}",
                tensor.len(),
                self.config.tensor_len()
            )));
        }

        tracing::debug!(
            "Preprocessed tensor {:?}, first values: {:?}",
            tensor.shape(),
            tensor.iter().take(20).collect::<Vec<_>>()
        );

        Ok(tensor)
    }

    /// Run one full prediction against `classifier`.
    pub fn predict(&self, classifier: &dyn Classify, bitmap: &SourceBitmap) -> Result<Prediction> {
        let start = Instant::now();

        let tensor = self.preprocess(bitmap)?;
        let preprocess_time = start.elapsed();

        let inference_start = Instant::now();
        let scores = classifier.run(tensor)?;
        let inference_time = inference_start.elapsed();

        let label = select_label(&scores);
        let probabilities = softmax(&scores);
        let confidence = label.index().and_then(|i| probabilities.get(i).copied());

        let total_time = start.elapsed();
        tracing::info!(
            "Prediction completed: label={}, classes={}, total_time={:.3}ms",
            label,
            scores.len(),
            total_time.as_secs_f64() * 1000.0
        );

        Ok(Prediction {
            label,
            confidence,
            scores,
            probabilities,
            timings: PredictionTimings {
                preprocess_ms: preprocess_time.as_secs_f64() * 1000.0,
                inference_ms: inference_time.as_secs_f64() * 1000.0,
                total_ms: total_time.as_secs_f64() * 1000.0,
            },
        })
    }
}

impl Default for DigitPipeline {
    fn default() -> Self {
        Self {
            config: PreprocessConfig::default(),
        }
    }
}
