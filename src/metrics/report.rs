//! Classification reports and evaluation summaries.

use std::fmt;

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auc::roc_auc_ovr;
use super::classification::{
    accuracy_score, averaged_scores, hamming_loss, precision_recall_fscore_support,
    AverageMode, AveragedScores, ClassScores,
};
use crate::error::MetricError;

/// Default number of decimals in a rendered report.
pub const DEFAULT_REPORT_DIGITS: usize = 2;

const AVG_LABEL_WIDTH: usize = "weighted avg".len();

/// Per-class scores plus accuracy and macro/weighted averages.
///
/// `Display` renders the usual fixed-width text table:
///
/// ```text
///               precision    recall  f1-score   support
///
///            0       1.00      0.67      0.80         3
///            1       0.50      1.00      0.67         1
///
///     accuracy                           0.75         4
///    macro avg       0.75      0.83      0.73         4
/// weighted avg       0.88      0.75      0.77         4
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub per_class: ClassScores,
    pub accuracy: f64,
    pub macro_avg: AveragedScores,
    pub weighted_avg: AveragedScores,
    /// Total number of samples.
    pub support: usize,
    /// Decimals used when rendering.
    pub digits: usize,
}

impl ClassificationReport {
    /// Builds a report with the default precision.
    pub fn new(y_true: &[usize], y_pred: &[usize]) -> Result<Self, MetricError> {
        Ok(Self {
            per_class: precision_recall_fscore_support(y_true, y_pred)?,
            accuracy: accuracy_score(y_true, y_pred)?,
            macro_avg: averaged_scores(y_true, y_pred, AverageMode::Macro)?,
            weighted_avg: averaged_scores(y_true, y_pred, AverageMode::Weighted)?,
            support: y_true.len(),
            digits: DEFAULT_REPORT_DIGITS,
        })
    }

    /// Sets the rendered decimal precision.
    pub fn with_digits(mut self, digits: usize) -> Self {
        self.digits = digits;
        self
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.per_class.labels.iter().map(|l| l.to_string()).collect();
        let width = names
            .iter()
            .map(String::len)
            .chain([AVG_LABEL_WIDTH, self.digits])
            .max()
            .unwrap_or(AVG_LABEL_WIDTH);
        let d = self.digits;

        write!(f, "{:>w$} ", "", w = width)?;
        for header in ["precision", "recall", "f1-score", "support"] {
            write!(f, " {:>9}", header)?;
        }
        writeln!(f)?;
        writeln!(f)?;

        let scores = &self.per_class;
        for (k, name) in names.iter().enumerate() {
            writeln!(
                f,
                "{:>w$}  {:>9.d$} {:>9.d$} {:>9.d$} {:>9}",
                name,
                scores.precision[k],
                scores.recall[k],
                scores.f1[k],
                scores.support[k],
                w = width,
                d = d
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>w$}  {:>9} {:>9} {:>9.d$} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.support,
            w = width,
            d = d
        )?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>w$}  {:>9.d$} {:>9.d$} {:>9.d$} {:>9}",
                name,
                avg.precision,
                avg.recall,
                avg.f1,
                self.support,
                w = width,
                d = d
            )?;
        }
        Ok(())
    }
}

/// Headline scores of a set of predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub hamming_loss: f64,
    pub average: AverageMode,
    pub report: ClassificationReport,
}

impl EvaluationSummary {
    /// Emits the summary through `tracing`.
    pub fn log_summary(&self) {
        info!(
            accuracy = self.accuracy,
            precision = self.precision,
            recall = self.recall,
            f1 = self.f1,
            hamming_loss = self.hamming_loss,
            average = %self.average,
            "Evaluation summary"
        );
        info!("Classification report:\n{}", self.report);
    }
}

/// Computes accuracy, averaged precision/recall/F1, Hamming loss and a
/// full classification report.
pub fn evaluate_model(
    actual: &[usize],
    predicted: &[usize],
    average: AverageMode,
) -> Result<EvaluationSummary, MetricError> {
    let averaged = averaged_scores(actual, predicted, average)?;
    Ok(EvaluationSummary {
        accuracy: accuracy_score(actual, predicted)?,
        precision: averaged.precision,
        recall: averaged.recall,
        f1: averaged.f1,
        hamming_loss: hamming_loss(actual, predicted)?,
        average,
        report: ClassificationReport::new(actual, predicted)?,
    })
}

/// F1 and one-vs-rest AUC, for class-imbalanced data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImbalancedSummary {
    pub f1: f64,
    pub auc: f64,
}

/// F1 under `average` plus prevalence-weighted one-vs-rest AUC.
///
/// `proba` columns follow the sorted distinct labels of `actual`.
pub fn imbalanced_evaluate(
    actual: &[usize],
    predicted: &[usize],
    proba: ArrayView2<'_, f64>,
    average: AverageMode,
) -> Result<ImbalancedSummary, MetricError> {
    let f1 = averaged_scores(actual, predicted, average)?.f1;
    let auc = roc_auc_ovr(actual, proba, AverageMode::Weighted)?;
    info!(f1, auc, average = %average, "Imbalanced evaluation");
    Ok(ImbalancedSummary { f1, auc })
}
