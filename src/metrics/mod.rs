//! Metric library for scoring and reporting classifiers.
//!
//! All functions are pure. The active learning loop uses [`f1_score`] as its
//! stopping signal; callers use the rest for reporting.
//!
//! # Example
//!
//! ```ignore
//! use label_forge::metrics::{evaluate_model, AverageMode};
//!
//! let summary = evaluate_model(&y_true, &y_pred, AverageMode::Micro)?;
//! summary.log_summary();
//! println!("{}", summary.report);
//! ```

pub mod auc;
pub mod classification;
pub mod multilabel;
pub mod report;

pub use auc::{binary_roc_auc, roc_auc_ovr};
pub use classification::{
    accuracy_score, averaged_scores, f1_score, hamming_loss, labels_of,
    precision_recall_fscore_support, precision_score, recall_score, AverageMode, AveragedScores,
    ClassScores,
};
pub use multilabel::{evaluate_per_label, hamming_score, multilabel_hamming_loss, PerLabelScores};
pub use report::{
    evaluate_model, imbalanced_evaluate, ClassificationReport, EvaluationSummary,
    ImbalancedSummary, DEFAULT_REPORT_DIGITS,
};
