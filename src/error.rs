//! Error types for label-forge operations.
//!
//! Defines error types for every subsystem of the active learning loop:
//! - Feature matrix construction and row gathering
//! - Pool and training set bookkeeping
//! - Estimator fit/teach/predict calls
//! - Metric computation
//! - Loop configuration
//! - The loop itself, including pool exhaustion

use thiserror::Error;

/// Errors raised while building or reshaping a feature matrix.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("Row index {row} out of range for matrix with {nrows} rows")]
    RowOutOfRange { row: usize, nrows: usize },

    #[error("Column index {column} out of range for matrix with {ncols} columns")]
    ColumnOutOfRange { column: usize, ncols: usize },

    #[error("Column count mismatch: expected {expected}, found {found}")]
    ColumnMismatch { expected: usize, found: usize },

    #[error("Invalid matrix shape: {0}")]
    InvalidShape(String),
}

/// Errors raised by pool and training set mutations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    #[error("Index {index} out of range for pool of {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Index {0} requested more than once")]
    DuplicateIndex(usize),

    #[error("Row/label length mismatch: {rows} feature rows, {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),
}

/// Errors that can occur inside an estimator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimatorError {
    #[error("Estimator has not been fitted")]
    NotFitted,

    #[error("Cannot fit an estimator on an empty training set")]
    EmptyTrainingSet,

    #[error("Feature count mismatch: estimator expects {expected}, input has {found}")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("Row/label length mismatch: {features} feature rows, {labels} labels")]
    LengthMismatch { features: usize, labels: usize },

    #[error("Estimator failed: {0}")]
    Failed(String),
}

/// Errors that can occur while computing metrics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    #[error("Cannot compute a metric over empty input")]
    EmptyInput,

    #[error("Length mismatch: expected {expected} entries, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("Binary averaging requested but labels {labels:?} are not binary")]
    NotBinary { labels: Vec<usize> },

    #[error("Positive label {pos_label} is not among the observed labels {labels:?}")]
    PosLabelMissing { pos_label: usize, labels: Vec<usize> },

    #[error("ROC AUC is undefined for class {class}: only one class present in y_true")]
    SingleClass { class: usize },

    #[error("Probability table has shape ({rows}, {columns}); expected {expected_rows} rows and {expected_columns} columns")]
    ProbabilityShape {
        rows: usize,
        columns: usize,
        expected_rows: usize,
        expected_columns: usize,
    },
}

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Terminal errors of the active learning loop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LearnerError {
    #[error("Input shape error: {0}")]
    InputShape(String),

    #[error("Pool index error: {0}")]
    IndexRange(#[from] PoolError),

    #[error(
        "Pool exhausted before convergence: {pool_size} rows left, batch size {batch_size}, \
         {labeled_count} examples labeled"
    )]
    PoolExhausted {
        labeled_count: usize,
        performance_history: Vec<f64>,
        pool_size: usize,
        batch_size: usize,
    },

    #[error("Estimator error: {0}")]
    Estimator(#[from] EstimatorError),

    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<MatrixError> for LearnerError {
    fn from(err: MatrixError) -> Self {
        LearnerError::IndexRange(PoolError::Matrix(err))
    }
}
