pub mod pipeline;
pub mod session;
pub mod types;

pub use pipeline::DigitPipeline;
pub use session::{PredictOutcome, RecognitionSession};
pub use types::{Prediction, PredictionTimings, Status};
