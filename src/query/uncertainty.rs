//! Uncertainty scores over class-probability tables.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use ndarray::ArrayView2;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// How uncertain the model is about a row, from its class probabilities.
///
/// Every measure is oriented so that a higher score means more uncertain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyMeasure {
    /// `1 - max(p)`.
    #[default]
    LeastConfident,
    /// `1 - (p_top1 - p_top2)`.
    Margin,
    /// Shannon entropy of the distribution.
    Entropy,
}

impl UncertaintyMeasure {
    /// Scores a single probability row.
    pub fn score(&self, probabilities: &[f64]) -> f64 {
        match self {
            UncertaintyMeasure::LeastConfident => {
                let max = probabilities.iter().copied().fold(0.0_f64, f64::max);
                1.0 - max
            }
            UncertaintyMeasure::Margin => {
                let (mut first, mut second) = (0.0_f64, 0.0_f64);
                for &p in probabilities {
                    if p > first {
                        second = first;
                        first = p;
                    } else if p > second {
                        second = p;
                    }
                }
                1.0 - (first - second)
            }
            UncertaintyMeasure::Entropy => probabilities
                .iter()
                .filter(|&&p| p > 1e-12)
                .map(|&p| -p * p.ln())
                .sum(),
        }
    }
}

impl fmt::Display for UncertaintyMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UncertaintyMeasure::LeastConfident => "least_confident",
            UncertaintyMeasure::Margin => "margin",
            UncertaintyMeasure::Entropy => "entropy",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for UncertaintyMeasure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "least_confident" | "least-confident" | "confidence" => {
                Ok(UncertaintyMeasure::LeastConfident)
            }
            "margin" => Ok(UncertaintyMeasure::Margin),
            "entropy" => Ok(UncertaintyMeasure::Entropy),
            other => Err(format!("unknown uncertainty measure '{}'", other)),
        }
    }
}

/// Computes one uncertainty score per row of an `(n_rows, n_classes)` table.
pub fn uncertainty_scores(proba: ArrayView2<'_, f64>, measure: UncertaintyMeasure) -> Vec<f64> {
    proba
        .rows()
        .into_iter()
        .map(|row| match row.as_slice() {
            Some(slice) => measure.score(slice),
            None => measure.score(&row.to_vec()),
        })
        .collect()
}

/// Returns the indices of the `k` highest scores, most uncertain first.
///
/// The sort is stable: equal scores keep their row order. If fewer than
/// `k` scores exist, every index is returned.
pub fn select_uncertain(scores: &[f64], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    indices.sort_by_key(|&i| Reverse(OrderedFloat(scores[i])));
    indices.truncate(k);
    indices
}
