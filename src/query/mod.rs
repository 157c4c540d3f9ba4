//! Two-stage batch selection: uncertainty pre-filter, then density re-rank.
//!
//! # Overview
//!
//! Selecting a batch of `B` rows from the pool happens in two independent
//! stages, each a pure function over explicit index arrays:
//!
//! 1. **Uncertainty** - score every pool row from the model's class
//!    probabilities and keep the `K = multiplier * B` most uncertain rows
//!    (the *candidate subset*). This bounds the quadratic density step to a
//!    small working set.
//! 2. **Density** - compute the information density of each candidate
//!    *within the candidate subset* and keep the `B` densest. Among rows
//!    the model is unsure about, this prefers representatives of a cluster
//!    over isolated outliers.
//!
//! Stage 2 works on local subset positions; the final batch is mapped back
//! through Stage 1's index list so callers always receive positions in the
//! pool snapshot they passed in.
//!
//! ```rust,ignore
//! use label_forge::query::QueryStrategy;
//!
//! let strategy = QueryStrategy::default();
//! let selection = strategy.select(&model, pool.features(), 5)?;
//! let batch = pool.take(&selection.batch)?;
//! ```

pub mod density;
pub mod uncertainty;

pub use density::{information_density, pairwise_similarity, rerank_by_density, DensityMetric};
pub use uncertainty::{select_uncertain, uncertainty_scores, UncertaintyMeasure};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::FeatureMatrix;
use crate::error::LearnerError;
use crate::estimator::Estimator;

/// Default ratio between the candidate subset and the final batch.
pub const DEFAULT_UNCERTAINTY_MULTIPLIER: usize = 3;

/// Outcome of one two-stage selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Stage-1 candidate subset, as pool indices, most uncertain first.
    pub candidates: Vec<usize>,
    /// Density of each candidate within the subset, aligned with `candidates`.
    pub densities: Vec<f64>,
    /// Final batch, as pool indices, densest first.
    pub batch: Vec<usize>,
}

impl Selection {
    /// Returns true if nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

/// Combined uncertainty and density query strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryStrategy {
    /// Stage-1 uncertainty measure.
    pub uncertainty: UncertaintyMeasure,
    /// Stage-2 similarity.
    pub density_metric: DensityMetric,
    /// Candidate subset size as a multiple of the batch size.
    pub uncertainty_multiplier: usize,
}

impl Default for QueryStrategy {
    fn default() -> Self {
        Self {
            uncertainty: UncertaintyMeasure::default(),
            density_metric: DensityMetric::default(),
            uncertainty_multiplier: DEFAULT_UNCERTAINTY_MULTIPLIER,
        }
    }
}

impl QueryStrategy {
    /// Creates a strategy with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the uncertainty measure.
    pub fn with_uncertainty(mut self, measure: UncertaintyMeasure) -> Self {
        self.uncertainty = measure;
        self
    }

    /// Sets the density similarity.
    pub fn with_density_metric(mut self, metric: DensityMetric) -> Self {
        self.density_metric = metric;
        self
    }

    /// Sets the candidate multiplier.
    pub fn with_uncertainty_multiplier(mut self, multiplier: usize) -> Self {
        self.uncertainty_multiplier = multiplier;
        self
    }

    /// Stage 1: the `multiplier * batch_size` most uncertain pool rows.
    ///
    /// Returns the whole pool (ordered by uncertainty) when it is smaller
    /// than the candidate budget.
    pub fn candidates<E: Estimator>(
        &self,
        model: &E,
        pool: &FeatureMatrix,
        batch_size: usize,
    ) -> Result<Vec<usize>, LearnerError> {
        if batch_size == 0 || pool.is_empty() {
            return Ok(Vec::new());
        }

        let k = self.uncertainty_multiplier.max(1).saturating_mul(batch_size);
        let proba = model.predict_proba(pool)?;
        let scores = uncertainty_scores(proba.view(), self.uncertainty);
        Ok(select_uncertain(&scores, k))
    }

    /// Stage 2: the `batch_size` densest candidates, as pool indices.
    ///
    /// Also returns the density of every candidate, aligned with
    /// `candidates`.
    pub fn rerank(
        &self,
        pool: &FeatureMatrix,
        candidates: &[usize],
        batch_size: usize,
    ) -> Result<(Vec<usize>, Vec<f64>), LearnerError> {
        let subset = pool.select_rows(candidates)?;
        let densities = information_density(&subset, self.density_metric);
        let batch = rerank_by_density(&densities, batch_size)
            .into_iter()
            .map(|local| candidates[local])
            .collect();
        Ok((batch, densities))
    }

    /// Runs both stages against the current pool snapshot.
    ///
    /// An empty pool or a zero batch size yields an empty selection.
    pub fn select<E: Estimator>(
        &self,
        model: &E,
        pool: &FeatureMatrix,
        batch_size: usize,
    ) -> Result<Selection, LearnerError> {
        let candidates = self.candidates(model, pool, batch_size)?;
        if candidates.is_empty() {
            return Ok(Selection::default());
        }

        let (batch, densities) = self.rerank(pool, &candidates, batch_size)?;
        debug!(
            pool = pool.nrows(),
            candidates = candidates.len(),
            batch = batch.len(),
            uncertainty = %self.uncertainty,
            density = %self.density_metric,
            "Selected query batch"
        );

        Ok(Selection {
            candidates,
            densities,
            batch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::CsrMatrix;
    use crate::estimator::NearestCentroid;
    use ndarray::{array, Array2};
    use std::collections::HashSet;

    fn fitted_model() -> NearestCentroid {
        let x = FeatureMatrix::Dense(array![[0.0, 0.0], [10.0, 10.0]]);
        let mut model = NearestCentroid::new().with_temperature(10.0);
        model.fit(&x, &[0, 1]).expect("fit");
        model
    }

    /// Pool rows along the diagonal; rows near (5, 5) are the most uncertain.
    fn diagonal_pool(n: usize) -> FeatureMatrix {
        FeatureMatrix::Dense(Array2::from_shape_fn((n, 2), |(i, _)| {
            i as f64 * 10.0 / (n - 1) as f64
        }))
    }

    #[test]
    fn test_select_empty_pool() {
        let model = fitted_model();
        let pool = FeatureMatrix::Dense(Array2::zeros((0, 2)));
        let selection = QueryStrategy::new().select(&model, &pool, 5).expect("select");
        assert!(selection.is_empty());
        assert!(selection.candidates.is_empty());
    }

    #[test]
    fn test_select_zero_batch() {
        let model = fitted_model();
        let pool = diagonal_pool(10);
        let selection = QueryStrategy::new().select(&model, &pool, 0).expect("select");
        assert!(selection.is_empty());
    }

    #[test]
    fn test_candidates_are_most_uncertain() {
        let model = fitted_model();
        let pool = diagonal_pool(21);
        let candidates = QueryStrategy::new()
            .with_uncertainty_multiplier(1)
            .candidates(&model, &pool, 3)
            .expect("candidates");
        // Row 10 sits exactly between the centroids.
        assert_eq!(candidates[0], 10);
        let set: HashSet<usize> = candidates.iter().copied().collect();
        assert_eq!(set, [9, 10, 11].into_iter().collect());
    }

    #[test]
    fn test_select_sizes_and_validity() {
        let model = fitted_model();
        let pool = diagonal_pool(40);
        let selection = QueryStrategy::new().select(&model, &pool, 5).expect("select");

        assert_eq!(selection.candidates.len(), 15);
        assert_eq!(selection.densities.len(), 15);
        assert_eq!(selection.batch.len(), 5);

        let unique: HashSet<usize> = selection.batch.iter().copied().collect();
        assert_eq!(unique.len(), 5);
        for index in &selection.batch {
            assert!(*index < pool.nrows());
            assert!(selection.candidates.contains(index));
        }
    }

    #[test]
    fn test_pool_smaller_than_candidate_budget() {
        let model = fitted_model();
        let pool = diagonal_pool(3);
        let selection = QueryStrategy::new().select(&model, &pool, 5).expect("select");

        let mut candidates = selection.candidates.clone();
        candidates.sort_unstable();
        assert_eq!(candidates, vec![0, 1, 2]);
        assert!(selection.batch.len() <= 3);
        assert_eq!(selection.batch.len(), 3);
    }

    #[test]
    fn test_rerank_maps_back_to_pool_indices() {
        // Candidates 7, 2, 9: rows 7 and 9 are near-parallel, row 2 is orthogonal.
        let mut rows = Array2::zeros((10, 2));
        rows[[7, 0]] = 1.0;
        rows[[7, 1]] = 0.1;
        rows[[9, 0]] = 1.0;
        rows[[2, 1]] = 1.0;
        let pool = FeatureMatrix::Dense(rows);

        let (batch, densities) = QueryStrategy::new()
            .rerank(&pool, &[7, 2, 9], 2)
            .expect("rerank");
        assert_eq!(densities.len(), 3);
        let set: HashSet<usize> = batch.iter().copied().collect();
        assert_eq!(set, [7, 9].into_iter().collect());
    }

    #[test]
    fn test_rerank_rejects_stale_index() {
        let pool = diagonal_pool(4);
        let result = QueryStrategy::new().rerank(&pool, &[1, 4], 1);
        assert!(matches!(result, Err(LearnerError::IndexRange(_))));
    }

    #[test]
    fn test_select_on_sparse_pool() {
        let model = fitted_model();
        let dense = diagonal_pool(30);
        let sparse = FeatureMatrix::Sparse(CsrMatrix::from_dense(dense.to_dense().view()));

        let strategy = QueryStrategy::new().with_density_metric(DensityMetric::Euclidean);
        let from_dense = strategy.select(&model, &dense, 4).expect("select");
        let from_sparse = strategy.select(&model, &sparse, 4).expect("select");
        assert_eq!(from_dense.candidates, from_sparse.candidates);
        assert_eq!(from_dense.batch, from_sparse.batch);
    }

    #[test]
    fn test_select_unfitted_model_errors() {
        let model = NearestCentroid::new();
        let pool = diagonal_pool(5);
        let result = QueryStrategy::new().select(&model, &pool, 2);
        assert!(matches!(result, Err(LearnerError::Estimator(_))));
    }
}
