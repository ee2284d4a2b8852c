use crate::image::Label;
use serde::{Serialize, Serializer};
use std::fmt;

/// User-visible session status. `Display` renders the exact text a front
/// end should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Canvas cleared, nothing to show.
    #[default]
    Idle,
    Loading,
    Ready,
    LoadFailed,
    NotReady,
    Predicting,
    PredictionFailed,
    Predicted(Label),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => Ok(()),
            Status::Loading => f.write_str("Loading AI model..."),
            Status::Ready => f.write_str("Model Ready. Draw a digit!"),
            Status::LoadFailed => f.write_str("ERROR: Failed to load model."),
            Status::NotReady => f.write_str("Model not ready..."),
            Status::Predicting => f.write_str("Predicting..."),
            Status::PredictionFailed => f.write_str("Prediction Error!"),
            Status::Predicted(label) => write!(f, "{}", label),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of one successful pass through the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Selected class, -1 if the classifier returned no scores
    pub label: Label,
    /// Softmax probability of the selected class
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Raw classifier output
    pub scores: Vec<f32>,
    /// Softmax over `scores`
    pub probabilities: Vec<f32>,
    pub timings: PredictionTimings,
}

/// Per-stage timings in milliseconds
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PredictionTimings {
    pub preprocess_ms: f64,
    pub inference_ms: f64,
    pub total_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_matches_front_end_messages() {
        assert_eq!(Status::Loading.to_string(), "Loading AI model...");
        assert_eq!(Status::Ready.to_string(), "Model Ready. Draw a digit!");
        assert_eq!(Status::LoadFailed.to_string(), "ERROR: Failed to load model.");
        assert_eq!(Status::NotReady.to_string(), "Model not ready...");
        assert_eq!(Status::Predicting.to_string(), "Predicting...");
        assert_eq!(Status::PredictionFailed.to_string(), "Prediction Error!");
        assert_eq!(Status::Predicted(Label::from(7)).to_string(), "7");
        assert_eq!(Status::Idle.to_string(), "");
    }

    #[test]
    fn status_serializes_as_text() {
        let json = serde_json::to_string(&Status::Predicted(Label::from(3))).unwrap();
        assert_eq!(json, "\"3\"");
    }
}
