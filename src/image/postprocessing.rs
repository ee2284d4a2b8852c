use serde::{Deserialize, Serialize};
use std::fmt;

/// Predicted class index. [`Label::NONE`] (-1) means no score was seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(i64);

impl Label {
    /// No prediction.
    pub const NONE: Label = Label(-1);

    /// Raw label as shown to the user.
    pub fn value(self) -> i64 {
        self.0
    }

    /// True for the no-prediction sentinel.
    pub fn is_none(self) -> bool {
        self.0 < 0
    }

    /// Index into the score vector, if any.
    pub fn index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl From<usize> for Label {
    fn from(index: usize) -> Self {
        Label(index as i64)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pick the index of the largest score.
///
/// The comparison is strict, so the first of several equal maxima wins. An
/// empty vector yields [`Label::NONE`]. NaN never compares greater and is
/// skipped.
pub fn select_label(scores: &[f32]) -> Label {
    let mut max_score = f32::NEG_INFINITY;
    let mut prediction = Label::NONE;

    for (i, &score) in scores.iter().enumerate() {
        if score > max_score {
            max_score = score;
            prediction = Label::from(i);
        }
    }

    prediction
}

/// Numerically stable softmax over raw logits.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let max = scores
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return vec![0.0; scores.len()];
    }

    let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f32 = exps.iter().filter(|e| e.is_finite()).sum();

    exps.into_iter()
        .map(|e| if e.is_finite() { e / sum } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_maximum_wins() {
        assert_eq!(select_label(&[0.1, 0.9, 0.9, 0.2]), Label::from(1));
    }

    #[test]
    fn empty_scores_give_sentinel() {
        let label = select_label(&[]);
        assert_eq!(label, Label::NONE);
        assert_eq!(label.value(), -1);
        assert!(label.is_none());
        assert_eq!(label.index(), None);
    }

    #[test]
    fn ten_class_logits() {
        let scores = [2.1, 0.3, 5.7, -1.2, 0.0, 3.3, 4.9, -0.5, 1.8, 1.0];
        let label = select_label(&scores);
        assert_eq!(label.index(), Some(2));
        assert_eq!(label.to_string(), "2");
    }

    #[test]
    fn negative_scores_are_still_selected() {
        assert_eq!(select_label(&[-5.0, -3.0, -4.0]).index(), Some(1));
        assert_eq!(select_label(&[f32::NEG_INFINITY]), Label::NONE);
    }

    #[test]
    fn nan_is_skipped() {
        assert_eq!(select_label(&[f32::NAN, 0.5, f32::NAN]).index(), Some(1));
        assert_eq!(select_label(&[f32::NAN]), Label::NONE);
    }

    #[test]
    fn softmax_sums_to_one_and_preserves_order() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(probs.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
        assert_eq!(select_label(&probs).index(), Some(2));
    }

    #[test]
    fn softmax_handles_large_logits() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert_abs_diff_eq!(probs[0], 0.5, epsilon = 1e-6);
        assert!(softmax(&[]).is_empty());
    }
}
