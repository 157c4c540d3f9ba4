//! label-forge: pool-based active learning with uncertainty pre-filtering
//! and information-density re-ranking.
//!
//! This library selects which unlabeled examples to label next, teaches an
//! incrementally trainable classifier, keeps the labeled and unlabeled sets
//! consistent, and stops once the model is good enough.

// Core modules
pub mod data;
pub mod error;
pub mod estimator;
pub mod learner;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod query;

// Re-export commonly used types
pub use data::{split_pool, CsrMatrix, DatasetSplit, FeatureMatrix};
pub use error::{ConfigError, EstimatorError, LearnerError, MatrixError, MetricError, PoolError};
pub use estimator::{Estimator, NearestCentroid};
pub use learner::{run, ActiveLearner, LearningOutcome, LoopConfig, PerformanceHistory};
pub use pool::LabeledSet;
pub use query::{DensityMetric, QueryStrategy, Selection, UncertaintyMeasure};
