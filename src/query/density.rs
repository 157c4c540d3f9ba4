//! Information density: how representative a row is of its neighbours.
//!
//! Among rows the model is unsure about, dense ones sit inside a cluster of
//! similar rows while isolated ones are outliers. Density is the mean
//! similarity of a row to every other row of the same matrix.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use ndarray::Array2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::data::{FeatureMatrix, RowView};

/// Similarity used for density computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityMetric {
    /// Cosine similarity, in [-1, 1].
    #[default]
    Cosine,
    /// `1 / (1 + euclidean_distance)`, in (0, 1].
    Euclidean,
}

impl DensityMetric {
    /// Similarity between two rows.
    pub fn similarity(&self, a: &RowView<'_>, b: &RowView<'_>) -> f64 {
        match self {
            DensityMetric::Cosine => a.cosine_similarity(b),
            DensityMetric::Euclidean => 1.0 / (1.0 + a.euclidean_distance(b)),
        }
    }
}

impl fmt::Display for DensityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DensityMetric::Cosine => write!(f, "cosine"),
            DensityMetric::Euclidean => write!(f, "euclidean"),
        }
    }
}

impl FromStr for DensityMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DensityMetric::Cosine),
            "euclidean" => Ok(DensityMetric::Euclidean),
            other => Err(format!("unknown density metric '{}'", other)),
        }
    }
}

/// Computes the symmetric pairwise similarity matrix of all rows.
pub fn pairwise_similarity(matrix: &FeatureMatrix, metric: DensityMetric) -> Array2<f64> {
    let n = matrix.nrows();
    let mut similarity = Array2::zeros((n, n));

    for i in 0..n {
        let row_i = matrix.row(i);
        similarity[[i, i]] = metric.similarity(&row_i, &row_i);

        for j in (i + 1)..n {
            let sim = metric.similarity(&row_i, &matrix.row(j));
            similarity[[i, j]] = sim;
            similarity[[j, i]] = sim;
        }
    }

    similarity
}

/// Mean similarity of each row to all *other* rows.
///
/// A matrix with a single row has density 0 for that row.
pub fn information_density(matrix: &FeatureMatrix, metric: DensityMetric) -> Vec<f64> {
    let n = matrix.nrows();
    if n < 2 {
        return vec![0.0; n];
    }

    let similarity = pairwise_similarity(matrix, metric);
    similarity
        .rows()
        .into_iter()
        .enumerate()
        .map(|(i, row)| (row.sum() - row[i]) / (n - 1) as f64)
        .collect()
}

/// Returns the local indices of the `b` densest rows, densest first.
///
/// Ties keep their original order.
pub fn rerank_by_density(densities: &[f64], b: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..densities.len()).collect();
    indices.sort_by_key(|&i| Reverse(OrderedFloat(densities[i])));
    indices.truncate(b);
    indices
}
