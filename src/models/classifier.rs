use crate::image::InputTensor;
use crate::utils::error::DigitError;
use crate::{Config, Result};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::path::Path;

/// Raw per-class scores produced by a classifier.
pub type ScoreVector = Vec<f32>;

/// A loaded classifier: one named tensor in, one named score vector out.
///
/// Implementations are stateless from the caller's point of view and may
/// fail; failures are reported, never retried.
pub trait Classify: Send + Sync {
    fn input_name(&self) -> &str;

    fn output_name(&self) -> &str;

    fn run(&self, tensor: InputTensor) -> Result<ScoreVector>;
}

/// ONNX Runtime backed digit classifier.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxClassifier {
    pub fn new(config: &Config) -> Result<Self> {
        Self::from_file(
            &config.model_path,
            config.onnx_config.intra_threads,
            config.onnx_config.optimization_level,
        )
    }

    pub fn from_file(model_path: &Path, intra_threads: usize, optimization_level: u8) -> Result<Self> {
        if !model_path.exists() {
            return Err(DigitError::ModelLoad(format!(
                "Model not found: {}",
                model_path.display()
            )));
        }

        tracing::info!("Loading classifier model from: {}", model_path.display());

        let session = Self::build_session(model_path, intra_threads, optimization_level)
            .map_err(|e| DigitError::ModelLoad(e.to_string()))?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(DigitError::ModelLoad(
                    "Classifier model has no inputs".to_string(),
                ))
            }
        };

        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(DigitError::ModelLoad(
                    "Classifier model has no outputs".to_string(),
                ))
            }
        };

        tracing::info!(
            "Classifier ports: input='{}', output='{}'",
            input_name,
            output_name
        );
        for (i, input) in session.inputs.iter().enumerate() {
            tracing::debug!("Classifier input[{}]: '{}' {:?}", i, input.name, input.input_type);
        }

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    fn build_session(model_path: &Path, intra_threads: usize, optimization_level: u8) -> Result<Session> {
        let session = Session::builder()?
            .with_optimization_level(Self::optimization(optimization_level))?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;
        Ok(session)
    }

    fn optimization(level: u8) -> GraphOptimizationLevel {
        match level {
            0 => GraphOptimizationLevel::Disable,
            1 => GraphOptimizationLevel::Level1,
            2 => GraphOptimizationLevel::Level2,
            _ => GraphOptimizationLevel::Level3,
        }
    }
}

impl Classify for OnnxClassifier {
    fn input_name(&self) -> &str {
        &self.input_name
    }

    fn output_name(&self) -> &str {
        &self.output_name
    }

    fn run(&self, tensor: InputTensor) -> Result<ScoreVector> {
        let input = Tensor::from_array(tensor)?;

        let mut session = self.session.lock();
        let outputs = session
            .run(inputs![self.input_name.as_str() => input])
            .map_err(|e| DigitError::Inference(e.to_string()))?;

        let output = match outputs.get(self.output_name.as_str()) {
            Some(output) => output,
            None => {
                let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                return Err(DigitError::Inference(format!(
                    "Output '{}' not found. Available outputs: {:?}",
                    self.output_name, available
                )));
            }
        };

        let scores = output
            .try_extract_array::<f32>()
            .map_err(|e| DigitError::Inference(e.to_string()))?;

        Ok(scores.iter().copied().collect())
    }
}
