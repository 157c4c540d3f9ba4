//! Single-label classification metrics.
//!
//! Every averaged metric takes an [`AverageMode`] and computes over the
//! label universe formed by the sorted union of true and predicted labels.
//! Undefined ratios (zero denominators) evaluate to 0.0.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MetricError;

/// How per-class scores are combined into a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AverageMode {
    /// Global counts of true positives, false positives and false negatives.
    #[default]
    Micro,
    /// Unweighted mean of per-class scores.
    Macro,
    /// Mean of per-class scores weighted by class support.
    Weighted,
    /// Score of a single positive class; labels must be binary.
    Binary { pos_label: usize },
}

impl fmt::Display for AverageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AverageMode::Micro => write!(f, "micro"),
            AverageMode::Macro => write!(f, "macro"),
            AverageMode::Weighted => write!(f, "weighted"),
            AverageMode::Binary { pos_label } => write!(f, "binary(pos_label={})", pos_label),
        }
    }
}

impl FromStr for AverageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "micro" => Ok(AverageMode::Micro),
            "macro" => Ok(AverageMode::Macro),
            "weighted" => Ok(AverageMode::Weighted),
            "binary" => Ok(AverageMode::Binary { pos_label: 1 }),
            other => Err(format!("unknown average mode '{}'", other)),
        }
    }
}

/// Per-class precision, recall, F1 and support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    /// Class labels, ascending.
    pub labels: Vec<usize>,
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub f1: Vec<f64>,
    /// Number of true occurrences of each class.
    pub support: Vec<usize>,
}

/// Precision, recall and F1 combined under one [`AverageMode`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AveragedScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class confusion counts.
#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

/// Returns the sorted union of labels appearing in either vector.
pub fn labels_of(y_true: &[usize], y_pred: &[usize]) -> Vec<usize> {
    y_true
        .iter()
        .chain(y_pred.iter())
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub(crate) fn check_lengths(y_true: &[usize], y_pred: &[usize]) -> Result<(), MetricError> {
    if y_true.is_empty() {
        return Err(MetricError::EmptyInput);
    }
    if y_true.len() != y_pred.len() {
        return Err(MetricError::LengthMismatch {
            expected: y_true.len(),
            found: y_pred.len(),
        });
    }
    Ok(())
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn harmonic(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn class_counts(y_true: &[usize], y_pred: &[usize], labels: &[usize]) -> Vec<Counts> {
    let mut counts = vec![Counts::default(); labels.len()];
    let position = |label: usize| labels.binary_search(&label).ok();

    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        if t == p {
            if let Some(k) = position(t) {
                counts[k].tp += 1;
            }
        } else {
            if let Some(k) = position(p) {
                counts[k].fp += 1;
            }
            if let Some(k) = position(t) {
                counts[k].fn_ += 1;
            }
        }
    }
    counts
}

/// Fraction of exactly matching predictions.
pub fn accuracy_score(y_true: &[usize], y_pred: &[usize]) -> Result<f64, MetricError> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    Ok(correct as f64 / y_true.len() as f64)
}

/// Fraction of mismatched predictions (`1 - accuracy` for single-label data).
pub fn hamming_loss(y_true: &[usize], y_pred: &[usize]) -> Result<f64, MetricError> {
    Ok(1.0 - accuracy_score(y_true, y_pred)?)
}

/// Per-class precision, recall, F1 and support over every observed label.
pub fn precision_recall_fscore_support(
    y_true: &[usize],
    y_pred: &[usize],
) -> Result<ClassScores, MetricError> {
    check_lengths(y_true, y_pred)?;
    let labels = labels_of(y_true, y_pred);
    let counts = class_counts(y_true, y_pred, &labels);

    let precision: Vec<f64> = counts.iter().map(|c| ratio(c.tp, c.tp + c.fp)).collect();
    let recall: Vec<f64> = counts.iter().map(|c| ratio(c.tp, c.tp + c.fn_)).collect();
    let f1 = precision
        .iter()
        .zip(recall.iter())
        .map(|(&p, &r)| harmonic(p, r))
        .collect();
    let support = counts.iter().map(|c| c.tp + c.fn_).collect();

    Ok(ClassScores {
        labels,
        precision,
        recall,
        f1,
        support,
    })
}

/// Precision, recall and F1 under the given averaging mode.
pub fn averaged_scores(
    y_true: &[usize],
    y_pred: &[usize],
    average: AverageMode,
) -> Result<AveragedScores, MetricError> {
    check_lengths(y_true, y_pred)?;

    match average {
        AverageMode::Micro => {
            let labels = labels_of(y_true, y_pred);
            let counts = class_counts(y_true, y_pred, &labels);
            let tp: usize = counts.iter().map(|c| c.tp).sum();
            let fp: usize = counts.iter().map(|c| c.fp).sum();
            let fn_: usize = counts.iter().map(|c| c.fn_).sum();
            let precision = ratio(tp, tp + fp);
            let recall = ratio(tp, tp + fn_);
            Ok(AveragedScores {
                precision,
                recall,
                f1: harmonic(precision, recall),
            })
        }
        AverageMode::Macro => {
            let scores = precision_recall_fscore_support(y_true, y_pred)?;
            Ok(AveragedScores {
                precision: mean(&scores.precision),
                recall: mean(&scores.recall),
                f1: mean(&scores.f1),
            })
        }
        AverageMode::Weighted => {
            let scores = precision_recall_fscore_support(y_true, y_pred)?;
            Ok(AveragedScores {
                precision: weighted_mean(&scores.precision, &scores.support),
                recall: weighted_mean(&scores.recall, &scores.support),
                f1: weighted_mean(&scores.f1, &scores.support),
            })
        }
        AverageMode::Binary { pos_label } => {
            let labels = labels_of(y_true, y_pred);
            if labels.len() > 2 {
                return Err(MetricError::NotBinary { labels });
            }
            if labels.len() == 2 && !labels.contains(&pos_label) {
                return Err(MetricError::PosLabelMissing { pos_label, labels });
            }
            let counts = class_counts(y_true, y_pred, &[pos_label]);
            let c = counts[0];
            let precision = ratio(c.tp, c.tp + c.fp);
            let recall = ratio(c.tp, c.tp + c.fn_);
            Ok(AveragedScores {
                precision,
                recall,
                f1: harmonic(precision, recall),
            })
        }
    }
}

/// Precision under the given averaging mode.
pub fn precision_score(
    y_true: &[usize],
    y_pred: &[usize],
    average: AverageMode,
) -> Result<f64, MetricError> {
    Ok(averaged_scores(y_true, y_pred, average)?.precision)
}

/// Recall under the given averaging mode.
pub fn recall_score(
    y_true: &[usize],
    y_pred: &[usize],
    average: AverageMode,
) -> Result<f64, MetricError> {
    Ok(averaged_scores(y_true, y_pred, average)?.recall)
}

/// F1 score under the given averaging mode.
pub fn f1_score(
    y_true: &[usize],
    y_pred: &[usize],
    average: AverageMode,
) -> Result<f64, MetricError> {
    Ok(averaged_scores(y_true, y_pred, average)?.f1)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub(crate) fn weighted_mean(values: &[f64], weights: &[usize]) -> f64 {
    let total: usize = weights.iter().sum();
    if total == 0 {
        return 0.0;
    }
    values
        .iter()
        .zip(weights.iter())
        .map(|(v, &w)| v * w as f64)
        .sum::<f64>()
        / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_accuracy_reference_case() {
        let y_true = [1, 0, 1, 1];
        let y_pred = [1, 0, 0, 1];
        assert!((accuracy_score(&y_true, &y_pred).unwrap() - 0.75).abs() < EPS);
    }

    #[test]
    fn test_empty_and_mismatched_input() {
        assert_eq!(accuracy_score(&[], &[]), Err(MetricError::EmptyInput));
        assert_eq!(
            f1_score(&[0, 1], &[0], AverageMode::Micro),
            Err(MetricError::LengthMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_labels_of() {
        assert_eq!(labels_of(&[3, 1, 3], &[0, 1, 2]), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_hamming_loss() {
        let loss = hamming_loss(&[1, 0, 1, 1], &[1, 0, 0, 1]).unwrap();
        assert!((loss - 0.25).abs() < EPS);
    }

    #[test]
    fn test_micro_equals_accuracy_for_single_label() {
        let y_true = [0, 1, 2, 2, 1, 0, 2];
        let y_pred = [0, 2, 2, 1, 1, 0, 0];
        let accuracy = accuracy_score(&y_true, &y_pred).unwrap();
        let scores = averaged_scores(&y_true, &y_pred, AverageMode::Micro).unwrap();
        assert!((scores.precision - accuracy).abs() < EPS);
        assert!((scores.recall - accuracy).abs() < EPS);
        assert!((scores.f1 - accuracy).abs() < EPS);
    }

    #[test]
    fn test_per_class_scores() {
        let y_true = [0, 1, 2, 0, 1, 2];
        let y_pred = [0, 2, 1, 0, 0, 1];
        let scores = precision_recall_fscore_support(&y_true, &y_pred).unwrap();

        assert_eq!(scores.labels, vec![0, 1, 2]);
        assert_eq!(scores.support, vec![2, 2, 2]);
        // class 0: tp=2, fp=1, fn=0
        assert!((scores.precision[0] - 2.0 / 3.0).abs() < EPS);
        assert!((scores.recall[0] - 1.0).abs() < EPS);
        assert!((scores.f1[0] - 0.8).abs() < EPS);
        // classes 1 and 2: no true positives
        assert_eq!(scores.f1[1], 0.0);
        assert_eq!(scores.f1[2], 0.0);
    }

    #[test]
    fn test_macro_and_weighted() {
        let y_true = [0, 0, 0, 1];
        let y_pred = [0, 0, 1, 1];
        // class 0: p=1, r=2/3, f1=0.8 ; class 1: p=0.5, r=1, f1=2/3
        let macro_scores = averaged_scores(&y_true, &y_pred, AverageMode::Macro).unwrap();
        assert!((macro_scores.precision - 0.75).abs() < EPS);
        assert!((macro_scores.recall - (2.0 / 3.0 + 1.0) / 2.0).abs() < EPS);
        assert!((macro_scores.f1 - (0.8 + 2.0 / 3.0) / 2.0).abs() < EPS);

        let weighted = averaged_scores(&y_true, &y_pred, AverageMode::Weighted).unwrap();
        assert!((weighted.precision - (3.0 * 1.0 + 0.5) / 4.0).abs() < EPS);
        assert!((weighted.recall - 0.75).abs() < EPS);
        assert!((weighted.f1 - (3.0 * 0.8 + 2.0 / 3.0) / 4.0).abs() < EPS);
    }

    #[test]
    fn test_binary() {
        let y_true = [1, 0, 1, 1];
        let y_pred = [1, 0, 0, 1];
        let binary = AverageMode::Binary { pos_label: 1 };
        assert!((precision_score(&y_true, &y_pred, binary).unwrap() - 1.0).abs() < EPS);
        assert!((recall_score(&y_true, &y_pred, binary).unwrap() - 2.0 / 3.0).abs() < EPS);
        assert!((f1_score(&y_true, &y_pred, binary).unwrap() - 0.8).abs() < EPS);

        let negative = AverageMode::Binary { pos_label: 0 };
        assert!((recall_score(&y_true, &y_pred, negative).unwrap() - 1.0).abs() < EPS);
        assert!((precision_score(&y_true, &y_pred, negative).unwrap() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_binary_rejects_multiclass() {
        let result = f1_score(&[0, 1, 2], &[0, 1, 1], AverageMode::Binary { pos_label: 1 });
        assert_eq!(
            result,
            Err(MetricError::NotBinary {
                labels: vec![0, 1, 2]
            })
        );
    }

    #[test]
    fn test_binary_rejects_unknown_pos_label() {
        let result = f1_score(&[0, 2, 2], &[0, 2, 2], AverageMode::Binary { pos_label: 1 });
        assert_eq!(
            result,
            Err(MetricError::PosLabelMissing {
                pos_label: 1,
                labels: vec![0, 2]
            })
        );

        // A single observed class is still scored.
        let single = f1_score(&[0, 0], &[0, 0], AverageMode::Binary { pos_label: 1 });
        assert_eq!(single, Ok(0.0));
    }

    #[test]
    fn test_zero_division_yields_zero() {
        // Class 0 is never predicted and class 1 is never true.
        let scores = averaged_scores(&[0, 0], &[1, 1], AverageMode::Macro).unwrap();
        assert_eq!(scores.precision, 0.0);
        assert_eq!(scores.recall, 0.0);
        assert_eq!(scores.f1, 0.0);
    }

    #[test]
    fn test_average_mode_parse_and_display() {
        assert_eq!("Macro".parse::<AverageMode>(), Ok(AverageMode::Macro));
        assert_eq!(
            "binary".parse::<AverageMode>(),
            Ok(AverageMode::Binary { pos_label: 1 })
        );
        assert!("samples".parse::<AverageMode>().is_err());
        assert_eq!(AverageMode::Weighted.to_string(), "weighted");
    }
}
