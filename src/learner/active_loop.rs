//! The active learning loop: query, teach, prune, score, repeat.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::config::LoopConfig;
use super::history::PerformanceHistory;
use crate::data::{split_pool, DatasetSplit, FeatureMatrix};
use crate::error::{ConfigError, LearnerError};
use crate::estimator::Estimator;
use crate::metrics::{f1_score, labels_of, AverageMode};
use crate::pool::LabeledSet;
use crate::query::{QueryStrategy, Selection};

/// What happened during one iteration of the loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationReport {
    /// One-based iteration number.
    pub iteration: usize,
    /// Selection computed against the pool snapshot of this iteration.
    pub selection: Selection,
    /// Original dataset positions of the rows that were labeled.
    pub queried: Vec<usize>,
    /// Score of the updated model on the full dataset.
    pub score: f64,
    /// Rows labeled by the loop so far (seed set excluded).
    pub labeled_count: usize,
    /// Rows left in the pool.
    pub pool_size: usize,
}

/// Result of a converged run.
#[derive(Debug, Clone)]
pub struct LearningOutcome<E> {
    /// Rows labeled by the loop (seed set excluded).
    pub labeled_count: usize,
    pub performance_history: PerformanceHistory,
    /// The final, incrementally taught model.
    pub model: E,
    pub iterations: usize,
    pub elapsed: Duration,
}

/// Pool-based active learner.
///
/// Owns the model, the growing training set, the shrinking pool and the
/// full dataset used for scoring. Nothing else mutates them while the
/// learner is alive.
pub struct ActiveLearner<E: Estimator> {
    model: E,
    training: LabeledSet,
    pool: LabeledSet,
    x_full: FeatureMatrix,
    y_full: Vec<usize>,
    config: LoopConfig,
    strategy: QueryStrategy,
    history: PerformanceHistory,
    iterations: usize,
    labeled_count: usize,
}

impl<E: Estimator> ActiveLearner<E> {
    /// Fits `estimator` on the seed set and scores it on the full dataset.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::Config` for an invalid configuration or a
    /// binary averaging mode that does not fit the dataset's labels,
    /// `LearnerError::InputShape` if the split and the full dataset
    /// disagree in shape, and `LearnerError::Estimator` if fitting fails.
    pub fn new(
        mut estimator: E,
        split: DatasetSplit,
        x_full: FeatureMatrix,
        y_full: Vec<usize>,
        config: LoopConfig,
    ) -> Result<Self, LearnerError> {
        config.validate()?;

        if x_full.nrows() != y_full.len() {
            return Err(LearnerError::InputShape(format!(
                "feature matrix has {} rows but {} labels were given",
                x_full.nrows(),
                y_full.len()
            )));
        }
        for (name, set) in [("training", &split.train), ("pool", &split.pool)] {
            if set.features().ncols() != x_full.ncols() {
                return Err(LearnerError::InputShape(format!(
                    "{} set has {} columns but the dataset has {}",
                    name,
                    set.features().ncols(),
                    x_full.ncols()
                )));
            }
        }

        if let AverageMode::Binary { pos_label } = config.average {
            let labels = labels_of(&y_full, &[]);
            if labels.len() > 2 || (labels.len() == 2 && !labels.contains(&pos_label)) {
                return Err(ConfigError::ValidationFailed(format!(
                    "binary averaging with pos_label {} does not fit dataset labels {:?}",
                    pos_label, labels
                ))
                .into());
            }
        }

        let DatasetSplit { train, pool } = split;
        estimator.fit(train.features(), train.labels())?;
        let initial = estimator.score(&x_full, &y_full)?;

        info!(
            initial_score = initial,
            train = train.len(),
            pool = pool.len(),
            batch_size = config.batch_size,
            threshold = config.stopping_threshold,
            "Initial model fitted"
        );

        Ok(Self {
            model: estimator,
            training: train,
            pool,
            x_full,
            y_full,
            strategy: config.query_strategy(),
            config,
            history: PerformanceHistory::with_initial(initial),
            iterations: 0,
            labeled_count: 0,
        })
    }

    /// Runs one select, teach, prune, score cycle.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::PoolExhausted` without touching any state if
    /// the pool holds fewer than `batch_size` rows. Estimator, metric and
    /// pool failures propagate unchanged and leave the pool, training set,
    /// counters and history as they were. A failure after `teach` leaves
    /// the model taught on the batch.
    pub fn step(&mut self) -> Result<IterationReport, LearnerError> {
        let batch_size = self.config.batch_size;
        if self.pool.len() < batch_size {
            return Err(self.exhausted());
        }

        let selection = self
            .strategy
            .select(&self.model, self.pool.features(), batch_size)?;
        if selection.is_empty() {
            return Err(self.exhausted());
        }

        // Indices are only valid against this pool snapshot: gather and
        // remove with the same set before anything else touches the pool.
        let batch = self.pool.take(&selection.batch)?;
        let remaining = self.pool.remove(&selection.batch)?;

        self.model.teach(batch.features(), batch.labels())?;
        let predicted = self.model.predict(&self.x_full)?;
        let score = f1_score(&self.y_full, &predicted, self.config.average)?;

        // Commit only once the iteration has a score.
        self.training.append(&batch)?;
        self.pool = remaining;
        self.labeled_count += batch.len();
        self.iterations += 1;
        self.history.push(score);

        debug!(
            iteration = self.iterations,
            queried = ?batch.origin(),
            score,
            pool = self.pool.len(),
            "Taught batch"
        );
        if self.iterations % self.config.report_every == 0 {
            info!(
                iteration = self.iterations,
                labeled = self.labeled_count,
                score,
                "Active learning progress"
            );
        }

        Ok(IterationReport {
            iteration: self.iterations,
            selection,
            queried: batch.origin().to_vec(),
            score,
            labeled_count: self.labeled_count,
            pool_size: self.pool.len(),
        })
    }

    /// Iterates until the score reaches the stopping threshold.
    ///
    /// At least one iteration always runs, even if the initial model
    /// already clears the threshold.
    ///
    /// # Errors
    ///
    /// Returns `LearnerError::PoolExhausted`, carrying the partial history,
    /// if the pool runs out first.
    pub fn run(mut self) -> Result<LearningOutcome<E>, LearnerError> {
        let start = Instant::now();

        loop {
            let report = self.step()?;
            if report.score >= self.config.stopping_threshold {
                break;
            }
        }

        let elapsed = start.elapsed();
        info!(
            iterations = self.iterations,
            labeled = self.labeled_count,
            final_score = self.history.last().unwrap_or_default(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Active learning converged"
        );

        Ok(LearningOutcome {
            labeled_count: self.labeled_count,
            performance_history: self.history,
            model: self.model,
            iterations: self.iterations,
            elapsed,
        })
    }

    fn exhausted(&self) -> LearnerError {
        warn!(
            pool = self.pool.len(),
            batch_size = self.config.batch_size,
            iterations = self.iterations,
            last_score = self.history.last().unwrap_or_default(),
            "Pool exhausted before convergence"
        );
        LearnerError::PoolExhausted {
            labeled_count: self.labeled_count,
            performance_history: self.history.as_slice().to_vec(),
            pool_size: self.pool.len(),
            batch_size: self.config.batch_size,
        }
    }

    pub fn model(&self) -> &E {
        &self.model
    }

    pub fn training_set(&self) -> &LabeledSet {
        &self.training
    }

    pub fn pool(&self) -> &LabeledSet {
        &self.pool
    }

    pub fn history(&self) -> &PerformanceHistory {
        &self.history
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Rows labeled by the loop so far (seed set excluded).
    pub fn labeled_count(&self) -> usize {
        self.labeled_count
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }
}

/// Splits `(x, y)`, fits `estimator` on `n_initial` random rows and runs
/// the loop to convergence.
///
/// `seed` makes the initial split reproducible.
pub fn run<E: Estimator>(
    x: &FeatureMatrix,
    y: &[usize],
    n_initial: usize,
    estimator: E,
    config: LoopConfig,
    seed: Option<u64>,
) -> Result<LearningOutcome<E>, LearnerError> {
    config.validate()?;
    let split = split_pool(x, y, n_initial, seed)?;
    ActiveLearner::new(estimator, split, x.clone(), y.to_vec(), config)?.run()
}
