//! Pool-based active learning loop.
//!
//! # Overview
//!
//! [`ActiveLearner`] drives the cycle:
//!
//! 1. **Select** a batch with the configured [`QueryStrategy`](crate::query::QueryStrategy)
//! 2. **Teach** the model the batch's ground-truth labels
//! 3. **Prune** the same rows from the pool and append them to the training set
//! 4. **Score** the model on the full dataset
//! 5. **Stop** once the score reaches the threshold
//!
//! The loop body always runs at least once. If the pool holds fewer rows
//! than a batch before the threshold is reached, the run ends with
//! [`LearnerError::PoolExhausted`](crate::error::LearnerError::PoolExhausted).
//!
//! # Example
//!
//! ```ignore
//! use label_forge::estimator::NearestCentroid;
//! use label_forge::learner::{run, LoopConfig};
//!
//! let config = LoopConfig::default().with_batch_size(5).with_stopping_threshold(0.65);
//! let outcome = run(&x, &y, 10, NearestCentroid::new(), config, Some(42))?;
//! println!("labeled {} examples", outcome.labeled_count);
//! ```

pub mod active_loop;
pub mod config;
pub mod history;

pub use active_loop::{run, ActiveLearner, IterationReport, LearningOutcome};
pub use config::{LoopConfig, DEFAULT_BATCH_SIZE, DEFAULT_REPORT_EVERY, DEFAULT_STOPPING_THRESHOLD};
pub use history::PerformanceHistory;
