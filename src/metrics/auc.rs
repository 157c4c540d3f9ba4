//! Area under the ROC curve, binary and one-vs-rest.

use ndarray::ArrayView2;
use ordered_float::OrderedFloat;

use super::classification::{labels_of, mean, weighted_mean, AverageMode};
use crate::error::MetricError;

/// Binary ROC AUC from positive-class scores.
///
/// Uses the rank-sum (Mann-Whitney) form; tied scores receive their
/// average rank.
pub fn binary_roc_auc(is_positive: &[bool], scores: &[f64]) -> Result<f64, MetricError> {
    if is_positive.is_empty() {
        return Err(MetricError::EmptyInput);
    }
    if is_positive.len() != scores.len() {
        return Err(MetricError::LengthMismatch {
            expected: is_positive.len(),
            found: scores.len(),
        });
    }

    let n_pos = is_positive.iter().filter(|&&p| p).count();
    let n_neg = is_positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(MetricError::SingleClass {
            class: usize::from(n_pos > 0),
        });
    }

    let ranks = average_ranks(scores);
    let positive_rank_sum: f64 = ranks
        .iter()
        .zip(is_positive.iter())
        .filter(|(_, &p)| p)
        .map(|(r, _)| r)
        .sum();

    let n_pos_f = n_pos as f64;
    let u = positive_rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0;
    Ok(u / (n_pos_f * n_neg as f64))
}

/// One-based ranks with ties averaged.
fn average_ranks(scores: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by_key(|&i| OrderedFloat(scores[i]));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let value = OrderedFloat(scores[order[start]]);
        let mut end = start + 1;
        while end < order.len() && OrderedFloat(scores[order[end]]) == value {
            end += 1;
        }
        // Positions start..end share ranks start+1 ..= end.
        let rank = (start + end + 1) as f64 / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }
    ranks
}

/// One-vs-rest ROC AUC over a probability table.
///
/// Columns of `proba` correspond to the sorted distinct labels of
/// `y_true`. A two-column table is scored as a binary problem on column 1.
/// With more classes, per-class AUCs are combined by prevalence for
/// [`AverageMode::Weighted`] and by a plain mean otherwise.
pub fn roc_auc_ovr(
    y_true: &[usize],
    proba: ArrayView2<'_, f64>,
    average: AverageMode,
) -> Result<f64, MetricError> {
    if y_true.is_empty() {
        return Err(MetricError::EmptyInput);
    }

    let classes = labels_of(y_true, &[]);
    if classes.len() < 2 {
        return Err(MetricError::SingleClass { class: classes[0] });
    }
    if proba.nrows() != y_true.len() || proba.ncols() != classes.len() {
        return Err(MetricError::ProbabilityShape {
            rows: proba.nrows(),
            columns: proba.ncols(),
            expected_rows: y_true.len(),
            expected_columns: classes.len(),
        });
    }

    if classes.len() == 2 {
        let is_positive: Vec<bool> = y_true.iter().map(|&y| y == classes[1]).collect();
        let scores: Vec<f64> = proba.column(1).to_vec();
        return binary_roc_auc(&is_positive, &scores);
    }

    let mut aucs = Vec::with_capacity(classes.len());
    let mut prevalence = Vec::with_capacity(classes.len());
    for (k, &class) in classes.iter().enumerate() {
        let is_positive: Vec<bool> = y_true.iter().map(|&y| y == class).collect();
        let scores: Vec<f64> = proba.column(k).to_vec();
        aucs.push(binary_roc_auc(&is_positive, &scores)?);
        prevalence.push(is_positive.iter().filter(|&&p| p).count());
    }

    Ok(match average {
        AverageMode::Weighted => weighted_mean(&aucs, &prevalence),
        _ => mean(&aucs),
    })
}
