//! Nearest-centroid classifier with incremental updates.
//!
//! Each class is represented by the running sum and count of its training
//! rows, so teaching a batch is exactly equivalent to refitting on the
//! accumulated training set. Probabilities are a softmax over negative
//! squared distances to the class centroids.

use ndarray::{Array1, Array2};

use crate::data::FeatureMatrix;
use crate::error::EstimatorError;

use super::Estimator;

/// Default softmax temperature.
const DEFAULT_TEMPERATURE: f64 = 1.0;

/// Nearest-centroid classifier over dense or sparse features.
#[derive(Debug, Clone)]
pub struct NearestCentroid {
    /// Softmax temperature; larger values flatten the probabilities.
    temperature: f64,
    /// Feature count fixed by the first fit.
    n_features: Option<usize>,
    /// Known classes, ascending.
    classes: Vec<usize>,
    /// Per-class feature sums, aligned with `classes`.
    sums: Vec<Array1<f64>>,
    /// Per-class row counts, aligned with `classes`.
    counts: Vec<usize>,
}

impl Default for NearestCentroid {
    fn default() -> Self {
        Self::new()
    }
}

impl NearestCentroid {
    /// Creates an unfitted classifier.
    pub fn new() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            n_features: None,
            classes: Vec::new(),
            sums: Vec::new(),
            counts: Vec::new(),
        }
    }

    /// Sets the softmax temperature (clamped to a positive value).
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.max(f64::EPSILON);
        self
    }

    /// Returns true once the model has been fitted.
    pub fn is_fitted(&self) -> bool {
        self.n_features.is_some()
    }

    /// Number of training rows seen for each class, aligned with `classes()`.
    pub fn class_counts(&self) -> &[usize] {
        &self.counts
    }

    /// Current class centroids, one row per class.
    pub fn centroids(&self) -> Result<Array2<f64>, EstimatorError> {
        let n_features = self.n_features.ok_or(EstimatorError::NotFitted)?;
        let mut centroids = Array2::zeros((self.classes.len(), n_features));
        for (k, (sum, &count)) in self.sums.iter().zip(self.counts.iter()).enumerate() {
            centroids.row_mut(k).assign(&(sum / count as f64));
        }
        Ok(centroids)
    }

    fn check_input(&self, x: &FeatureMatrix) -> Result<usize, EstimatorError> {
        let n_features = self.n_features.ok_or(EstimatorError::NotFitted)?;
        if x.ncols() != n_features {
            return Err(EstimatorError::FeatureMismatch {
                expected: n_features,
                found: x.ncols(),
            });
        }
        Ok(n_features)
    }

    fn accumulate(&mut self, x: &FeatureMatrix, y: &[usize], n_features: usize) {
        for (i, &label) in y.iter().enumerate() {
            let k = match self.classes.binary_search(&label) {
                Ok(k) => k,
                Err(k) => {
                    self.classes.insert(k, label);
                    self.sums.insert(k, Array1::zeros(n_features));
                    self.counts.insert(k, 0);
                    k
                }
            };
            x.row(i).add_to(&mut self.sums[k]);
            self.counts[k] += 1;
        }
    }
}

fn check_lengths(x: &FeatureMatrix, y: &[usize]) -> Result<(), EstimatorError> {
    if x.nrows() != y.len() {
        return Err(EstimatorError::LengthMismatch {
            features: x.nrows(),
            labels: y.len(),
        });
    }
    Ok(())
}

impl Estimator for NearestCentroid {
    fn fit(&mut self, x: &FeatureMatrix, y: &[usize]) -> Result<(), EstimatorError> {
        check_lengths(x, y)?;
        if y.is_empty() {
            return Err(EstimatorError::EmptyTrainingSet);
        }

        let n_features = x.ncols();
        self.n_features = Some(n_features);
        self.classes.clear();
        self.sums.clear();
        self.counts.clear();
        self.accumulate(x, y, n_features);
        Ok(())
    }

    fn teach(&mut self, x: &FeatureMatrix, y: &[usize]) -> Result<(), EstimatorError> {
        check_lengths(x, y)?;
        let n_features = self.check_input(x)?;
        self.accumulate(x, y, n_features);
        Ok(())
    }

    fn predict(&self, x: &FeatureMatrix) -> Result<Vec<usize>, EstimatorError> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (k, &p) in row.iter().enumerate() {
                    if p > row[best] {
                        best = k;
                    }
                }
                self.classes[best]
            })
            .collect())
    }

    fn predict_proba(&self, x: &FeatureMatrix) -> Result<Array2<f64>, EstimatorError> {
        self.check_input(x)?;
        let centroids = self.centroids()?;
        let centroid_norms: Vec<f64> = centroids
            .rows()
            .into_iter()
            .map(|c| c.dot(&c))
            .collect();

        let n_classes = self.classes.len();
        let mut proba = Array2::zeros((x.nrows(), n_classes));
        let mut logits = vec![0.0; n_classes];

        for (i, row) in x.rows().enumerate() {
            let row_norm = row.norm_squared();
            for (k, centroid) in centroids.rows().into_iter().enumerate() {
                let distance =
                    (row_norm - 2.0 * row.dot_dense(centroid) + centroid_norms[k]).max(0.0);
                logits[k] = -distance / self.temperature;
            }

            let max_logit = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mut total = 0.0;
            for (k, logit) in logits.iter().enumerate() {
                let weight = (logit - max_logit).exp();
                proba[[i, k]] = weight;
                total += weight;
            }
            for k in 0..n_classes {
                proba[[i, k]] /= total;
            }
        }

        Ok(proba)
    }

    fn classes(&self) -> &[usize] {
        &self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CsrMatrix;
    use ndarray::array;

    fn two_blobs() -> (FeatureMatrix, Vec<usize>) {
        let x = array![[0.0, 0.0], [0.2, 0.0], [5.0, 5.0], [5.2, 5.0]];
        (FeatureMatrix::Dense(x), vec![0, 0, 1, 1])
    }

    #[test]
    fn test_unfitted_errors() {
        let model = NearestCentroid::new();
        let (x, y) = two_blobs();
        assert!(!model.is_fitted());
        assert_eq!(model.predict(&x), Err(EstimatorError::NotFitted));

        let mut model = NearestCentroid::new();
        assert_eq!(model.teach(&x, &y), Err(EstimatorError::NotFitted));
    }

    #[test]
    fn test_fit_empty() {
        let mut model = NearestCentroid::new();
        let x = FeatureMatrix::Dense(Array2::zeros((0, 2)));
        assert_eq!(model.fit(&x, &[]), Err(EstimatorError::EmptyTrainingSet));
    }

    #[test]
    fn test_fit_length_mismatch() {
        let mut model = NearestCentroid::new();
        let (x, _) = two_blobs();
        assert_eq!(
            model.fit(&x, &[0, 1]),
            Err(EstimatorError::LengthMismatch {
                features: 4,
                labels: 2
            })
        );
    }

    #[test]
    fn test_fit_predict() {
        let mut model = NearestCentroid::new();
        let (x, y) = two_blobs();
        model.fit(&x, &y).expect("fit");

        assert_eq!(model.classes(), &[0, 1]);
        assert_eq!(model.predict(&x).expect("predict"), y);
        assert_eq!(model.score(&x, &y).expect("score"), 1.0);
    }

    #[test]
    fn test_centroids() {
        let mut model = NearestCentroid::new();
        let (x, y) = two_blobs();
        model.fit(&x, &y).expect("fit");
        let centroids = model.centroids().expect("fitted");
        assert!((centroids[[0, 0]] - 0.1).abs() < 1e-12);
        assert!((centroids[[1, 1]] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_predict_proba_rows_sum_to_one() {
        let mut model = NearestCentroid::new();
        let (x, y) = two_blobs();
        model.fit(&x, &y).expect("fit");

        let proba = model.predict_proba(&x).expect("proba");
        assert_eq!(proba.shape(), &[4, 2]);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-12);
        }
        assert!(proba[[0, 0]] > 0.99);
        assert!(proba[[3, 1]] > 0.99);
    }

    #[test]
    fn test_midpoint_is_uncertain() {
        let mut model = NearestCentroid::new();
        let (x, y) = two_blobs();
        model.fit(&x, &y).expect("fit");

        let midpoint = FeatureMatrix::Dense(array![[2.6, 2.5]]);
        let proba = model.predict_proba(&midpoint).expect("proba");
        assert!((proba[[0, 0]] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_teach_matches_refit() {
        let (x, y) = two_blobs();

        let mut incremental = NearestCentroid::new();
        let head = x.select_rows(&[0, 2]).expect("rows");
        let tail = x.select_rows(&[1, 3]).expect("rows");
        incremental.fit(&head, &[0, 1]).expect("fit");
        incremental.teach(&tail, &[0, 1]).expect("teach");

        let mut full = NearestCentroid::new();
        full.fit(&x, &y).expect("fit");

        assert_eq!(
            incremental.centroids().expect("fitted"),
            full.centroids().expect("fitted")
        );
        assert_eq!(incremental.class_counts(), &[2, 2]);
    }

    #[test]
    fn test_teach_adds_new_class() {
        let mut model = NearestCentroid::new();
        let (x, _) = two_blobs();
        model.fit(&x, &[1, 1, 1, 1]).expect("fit");
        assert_eq!(model.classes(), &[1]);

        let batch = FeatureMatrix::Dense(array![[-3.0, -3.0]]);
        model.teach(&batch, &[0]).expect("teach");
        assert_eq!(model.classes(), &[0, 1]);
        assert_eq!(model.predict(&batch).expect("predict"), vec![0]);
    }

    #[test]
    fn test_teach_feature_mismatch() {
        let mut model = NearestCentroid::new();
        let (x, y) = two_blobs();
        model.fit(&x, &y).expect("fit");

        let wide = FeatureMatrix::Dense(array![[1.0, 2.0, 3.0]]);
        assert_eq!(
            model.teach(&wide, &[0]),
            Err(EstimatorError::FeatureMismatch {
                expected: 2,
                found: 3
            })
        );
    }

    #[test]
    fn test_teach_empty_batch_is_noop() {
        let mut model = NearestCentroid::new();
        let (x, y) = two_blobs();
        model.fit(&x, &y).expect("fit");
        let before = model.centroids().expect("fitted");

        let empty = FeatureMatrix::Dense(Array2::zeros((0, 2)));
        model.teach(&empty, &[]).expect("teach");
        assert_eq!(model.centroids().expect("fitted"), before);
    }

    #[test]
    fn test_sparse_matches_dense() {
        let (x, y) = two_blobs();
        let sparse = FeatureMatrix::Sparse(CsrMatrix::from_dense(x.to_dense().view()));

        let mut dense_model = NearestCentroid::new();
        dense_model.fit(&x, &y).expect("fit");
        let mut sparse_model = NearestCentroid::new();
        sparse_model.fit(&sparse, &y).expect("fit");

        let a = dense_model.predict_proba(&x).expect("proba");
        let b = sparse_model.predict_proba(&sparse).expect("proba");
        for (p, q) in a.iter().zip(b.iter()) {
            assert!((p - q).abs() < 1e-12);
        }
    }

    #[test]
    fn test_temperature_flattens_probabilities() {
        let (x, y) = two_blobs();
        let mut sharp = NearestCentroid::new();
        sharp.fit(&x, &y).expect("fit");
        let mut flat = NearestCentroid::new().with_temperature(1000.0);
        flat.fit(&x, &y).expect("fit");

        let sharp_p = sharp.predict_proba(&x).expect("proba")[[0, 0]];
        let flat_p = flat.predict_proba(&x).expect("proba")[[0, 0]];
        assert!(flat_p < sharp_p);
        assert!(flat_p > 0.5);
    }
}
