pub mod classifier;

pub use classifier::{Classify, OnnxClassifier, ScoreVector};
