//! Metrics over binary indicator matrices (one column per label).

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classification::{accuracy_score, averaged_scores, AverageMode};
use crate::error::MetricError;

/// Per-label binary scores, one entry per indicator column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerLabelScores {
    pub accuracy: Vec<f64>,
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub f1: Vec<f64>,
}

impl PerLabelScores {
    /// Number of labels scored.
    pub fn len(&self) -> usize {
        self.accuracy.len()
    }

    /// Returns true if no labels were scored.
    pub fn is_empty(&self) -> bool {
        self.accuracy.is_empty()
    }
}

fn check_shapes(
    y_true: &ArrayView2<'_, bool>,
    y_pred: &ArrayView2<'_, bool>,
) -> Result<(), MetricError> {
    if y_true.nrows() == 0 {
        return Err(MetricError::EmptyInput);
    }
    if y_true.nrows() != y_pred.nrows() {
        return Err(MetricError::LengthMismatch {
            expected: y_true.nrows(),
            found: y_pred.nrows(),
        });
    }
    if y_true.ncols() != y_pred.ncols() {
        return Err(MetricError::LengthMismatch {
            expected: y_true.ncols(),
            found: y_pred.ncols(),
        });
    }
    Ok(())
}

fn row_jaccard(t: ArrayView1<'_, bool>, p: ArrayView1<'_, bool>) -> f64 {
    let mut intersection = 0usize;
    let mut union = 0usize;
    for (&a, &b) in t.iter().zip(p.iter()) {
        if a && b {
            intersection += 1;
        }
        if a || b {
            union += 1;
        }
    }
    if union == 0 {
        1.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Label-based accuracy: mean per-row Jaccard similarity of the
/// true and predicted label sets.
///
/// A row where both sets are empty scores 1.
pub fn hamming_score(
    y_true: ArrayView2<'_, bool>,
    y_pred: ArrayView2<'_, bool>,
) -> Result<f64, MetricError> {
    check_shapes(&y_true, &y_pred)?;
    let total: f64 = y_true
        .rows()
        .into_iter()
        .zip(y_pred.rows())
        .map(|(t, p)| row_jaccard(t, p))
        .sum();
    Ok(total / y_true.nrows() as f64)
}

/// Fraction of indicator cells that disagree.
pub fn multilabel_hamming_loss(
    y_true: ArrayView2<'_, bool>,
    y_pred: ArrayView2<'_, bool>,
) -> Result<f64, MetricError> {
    check_shapes(&y_true, &y_pred)?;
    let cells = y_true.len();
    if cells == 0 {
        return Ok(0.0);
    }
    let mismatched = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(a, b)| a != b)
        .count();
    Ok(mismatched as f64 / cells as f64)
}

/// Scores every indicator column as an independent binary problem.
pub fn evaluate_per_label(
    y_true: ArrayView2<'_, bool>,
    y_pred: ArrayView2<'_, bool>,
) -> Result<PerLabelScores, MetricError> {
    check_shapes(&y_true, &y_pred)?;

    let n_labels = y_true.ncols();
    let mut scores = PerLabelScores {
        accuracy: Vec::with_capacity(n_labels),
        precision: Vec::with_capacity(n_labels),
        recall: Vec::with_capacity(n_labels),
        f1: Vec::with_capacity(n_labels),
    };

    let binary = AverageMode::Binary { pos_label: 1 };
    for (t, p) in y_true.columns().into_iter().zip(y_pred.columns()) {
        let t: Vec<usize> = t.iter().map(|&v| usize::from(v)).collect();
        let p: Vec<usize> = p.iter().map(|&v| usize::from(v)).collect();

        let averaged = averaged_scores(&t, &p, binary)?;
        scores.accuracy.push(accuracy_score(&t, &p)?);
        scores.precision.push(averaged.precision);
        scores.recall.push(averaged.recall);
        scores.f1.push(averaged.f1);
    }

    Ok(scores)
}
