use crate::{
    image::SourceBitmap,
    models::{Classify, OnnxClassifier},
    recognition::{DigitPipeline, Prediction, Status},
    utils::error::DigitError,
    Config, Result,
};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

enum ModelState {
    Unloaded,
    Loading,
    Ready(Arc<dyn Classify>),
    Failed(String),
}

/// Result of a predict request.
#[derive(Debug)]
pub enum PredictOutcome {
    /// The classifier is not loaded; nothing was run.
    NotReady,
    Predicted(Prediction),
    Failed(DigitError),
}

impl PredictOutcome {
    pub fn status(&self) -> Status {
        match self {
            PredictOutcome::NotReady => Status::NotReady,
            PredictOutcome::Predicted(p) => Status::Predicted(p.label),
            PredictOutcome::Failed(_) => Status::PredictionFailed,
        }
    }
}

/// Owns the classifier handle and the status shown to the user.
///
/// Each predict works on its own bitmap snapshot and tensor. Overlapping
/// predicts are allowed; the status reflects whichever finished last.
pub struct RecognitionSession {
    pipeline: DigitPipeline,
    model: RwLock<ModelState>,
    status: Mutex<Status>,
}

impl RecognitionSession {
    pub fn new(pipeline: DigitPipeline) -> Self {
        Self {
            pipeline,
            model: RwLock::new(ModelState::Unloaded),
            status: Mutex::new(Status::Idle),
        }
    }

    /// A session whose classifier is already available.
    pub fn with_classifier(pipeline: DigitPipeline, classifier: Arc<dyn Classify>) -> Self {
        Self {
            pipeline,
            model: RwLock::new(ModelState::Ready(classifier)),
            status: Mutex::new(Status::Ready),
        }
    }

    pub fn pipeline(&self) -> &DigitPipeline {
        &self.pipeline
    }

    /// Status text currently shown to the user.
    pub fn status(&self) -> Status {
        *self.status.lock()
    }

    /// Whether predictions will be run.
    pub fn is_ready(&self) -> bool {
        matches!(*self.model.read(), ModelState::Ready(_))
    }

    /// Input and output port names of the loaded classifier.
    pub fn ports(&self) -> Option<(String, String)> {
        match &*self.model.read() {
            ModelState::Ready(c) => Some((c.input_name().to_string(), c.output_name().to_string())),
            _ => None,
        }
    }

    /// Why the last load failed, if it did.
    pub fn load_error(&self) -> Option<String> {
        match &*self.model.read() {
            ModelState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Load the ONNX model named by `config`.
    pub async fn load_from_config(&self, config: &Config) -> Result<()> {
        let config = config.clone();
        self.load(move || Ok(Arc::new(OnnxClassifier::new(&config)?) as Arc<dyn Classify>))
            .await
    }

    /// Run `loader` on the blocking pool and install its classifier.
    ///
    /// Predictions are refused until this completes successfully. A failed
    /// load is final until `load` is called again.
    pub async fn load<F>(&self, loader: F) -> Result<()>
    where
        F: FnOnce() -> Result<Arc<dyn Classify>> + Send + 'static,
    {
        *self.model.write() = ModelState::Loading;
        self.set_status(Status::Loading);

        let loaded = tokio::task::spawn_blocking(loader)
            .await
            .map_err(|e| DigitError::ModelLoad(format!("loader task failed: {}", e)))
            .and_then(|r| r);

        match loaded {
            Ok(classifier) => {
                tracing::info!("Classifier model loaded successfully");
                *self.model.write() = ModelState::Ready(classifier);
                self.set_status(Status::Ready);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load classifier model: {}", e);
                *self.model.write() = ModelState::Failed(e.to_string());
                self.set_status(Status::LoadFailed);
                Err(e)
            }
        }
    }

    /// Classify a canvas snapshot.
    pub async fn predict(&self, bitmap: SourceBitmap) -> PredictOutcome {
        let classifier = match &*self.model.read() {
            ModelState::Ready(c) => Some(Arc::clone(c)),
            _ => None,
        };

        let Some(classifier) = classifier else {
            tracing::warn!("Prediction requested before the model was ready");
            self.set_status(Status::NotReady);
            return PredictOutcome::NotReady;
        };

        self.set_status(Status::Predicting);

        let pipeline = self.pipeline.clone();
        let result = tokio::task::spawn_blocking(move || pipeline.predict(classifier.as_ref(), &bitmap))
            .await
            .map_err(|e| DigitError::Internal(format!("prediction task failed: {}", e)))
            .and_then(|r| r);

        let outcome = match result {
            Ok(prediction) => PredictOutcome::Predicted(prediction),
            Err(e) => {
                tracing::error!("Prediction failed: {}", e);
                PredictOutcome::Failed(e)
            }
        };

        self.set_status(outcome.status());
        outcome
    }

    /// Reset the displayed status after the canvas was wiped.
    pub fn clear(&self) -> Status {
        self.set_status(Status::Idle);
        Status::Idle
    }

    fn set_status(&self, status: Status) {
        *self.status.lock() = status;
    }
}
