//! Estimator capability consumed by the active learning loop.
//!
//! The loop never looks inside a model: it fits it once on the seed set,
//! then repeatedly teaches it new batches and asks for predictions and
//! class probabilities. Any classifier implementing [`Estimator`] can be
//! plugged in; [`NearestCentroid`] is a small incremental reference model.

pub mod centroid;

pub use centroid::NearestCentroid;

use ndarray::Array2;

use crate::data::FeatureMatrix;
use crate::error::EstimatorError;

/// A trainable single-label classifier.
///
/// Class labels are `usize` values. Columns of [`Estimator::predict_proba`]
/// follow the order of [`Estimator::classes`].
pub trait Estimator {
    /// Fits the model from scratch on `(x, y)`.
    fn fit(&mut self, x: &FeatureMatrix, y: &[usize]) -> Result<(), EstimatorError>;

    /// Incrementally updates the fitted model with a new labeled batch.
    fn teach(&mut self, x: &FeatureMatrix, y: &[usize]) -> Result<(), EstimatorError>;

    /// Predicts one class label per row.
    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<usize>, EstimatorError>;

    /// Returns an `(n_rows, n_classes)` table of class probabilities.
    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Array2<f64>, EstimatorError>;

    /// Known class labels, ascending.
    fn classes(&self) -> &[usize];

    /// Mean accuracy of [`Estimator::predict`] on `(x, y)`.
    fn score(&self, x: &FeatureMatrix, y: &[usize]) -> Result<f64, EstimatorError> {
        if x.nrows() != y.len() {
            return Err(EstimatorError::LengthMismatch {
                features: x.nrows(),
                labels: y.len(),
            });
        }
        if y.is_empty() {
            return Ok(0.0);
        }

        let predicted = self.predict(x)?;
        let correct = predicted
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }
}
