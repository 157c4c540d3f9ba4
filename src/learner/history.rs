//! Append-only record of model scores across iterations.

use serde::{Deserialize, Serialize};

/// Model score after each iteration, starting with the initial model.
///
/// Entry 0 is the score of the model trained on the initial split; entry
/// `i` is the score after the `i`-th batch was taught.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformanceHistory(Vec<f64>);

impl PerformanceHistory {
    /// Starts a history at the initial model's score.
    pub fn with_initial(score: f64) -> Self {
        Self(vec![score])
    }

    pub fn push(&mut self, score: f64) {
        self.0.push(score);
    }

    /// Score of the initial model.
    pub fn initial(&self) -> Option<f64> {
        self.0.first().copied()
    }

    /// Most recent score.
    pub fn last(&self) -> Option<f64> {
        self.0.last().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl From<PerformanceHistory> for Vec<f64> {
    fn from(history: PerformanceHistory) -> Self {
        history.0
    }
}
