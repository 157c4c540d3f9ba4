//! Configuration for the active learning loop.
//!
//! Covers batch sizing, the stopping rule, query strategy selection and
//! progress reporting. Values come from defaults, builder methods or
//! `LABEL_FORGE_*` environment variables.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::metrics::AverageMode;
use crate::query::{
    DensityMetric, QueryStrategy, UncertaintyMeasure, DEFAULT_UNCERTAINTY_MULTIPLIER,
};

/// Default number of rows labeled per iteration.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default F1 score at which the loop stops.
pub const DEFAULT_STOPPING_THRESHOLD: f64 = 0.65;

/// Default number of iterations between progress lines.
pub const DEFAULT_REPORT_EVERY: usize = 20;

/// Configuration for an [`ActiveLearner`](super::ActiveLearner).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    // Batch settings
    /// Rows labeled per iteration.
    pub batch_size: usize,
    /// Candidate subset size as a multiple of `batch_size`.
    pub uncertainty_multiplier: usize,

    // Query settings
    /// Stage-1 uncertainty measure.
    pub uncertainty: UncertaintyMeasure,
    /// Stage-2 density similarity.
    pub density_metric: DensityMetric,

    // Stopping settings
    /// F1 score at or above which the loop stops.
    pub stopping_threshold: f64,
    /// Averaging mode of the stopping F1 score.
    pub average: AverageMode,

    // Reporting
    /// Iterations between `info` progress lines.
    pub report_every: usize,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            uncertainty_multiplier: DEFAULT_UNCERTAINTY_MULTIPLIER,
            uncertainty: UncertaintyMeasure::LeastConfident,
            density_metric: DensityMetric::Cosine,
            stopping_threshold: DEFAULT_STOPPING_THRESHOLD,
            average: AverageMode::Micro,
            report_every: DEFAULT_REPORT_EVERY,
        }
    }
}

impl LoopConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LABEL_FORGE_BATCH_SIZE`: Rows labeled per iteration (default: 5)
    /// - `LABEL_FORGE_UNCERTAINTY_MULTIPLIER`: Candidate multiplier (default: 3)
    /// - `LABEL_FORGE_UNCERTAINTY`: `least_confident`, `margin` or `entropy`
    /// - `LABEL_FORGE_DENSITY_METRIC`: `cosine` or `euclidean`
    /// - `LABEL_FORGE_STOPPING_THRESHOLD`: Target F1 score (default: 0.65)
    /// - `LABEL_FORGE_AVERAGE`: `micro`, `macro`, `weighted` or `binary`
    /// - `LABEL_FORGE_REPORT_EVERY`: Iterations between progress lines (default: 20)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup, falling back
    /// to defaults for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup("LABEL_FORGE_BATCH_SIZE") {
            config.batch_size = parse_env_value(&val, "LABEL_FORGE_BATCH_SIZE")?;
        }

        if let Some(val) = lookup("LABEL_FORGE_UNCERTAINTY_MULTIPLIER") {
            config.uncertainty_multiplier =
                parse_env_value(&val, "LABEL_FORGE_UNCERTAINTY_MULTIPLIER")?;
        }

        if let Some(val) = lookup("LABEL_FORGE_UNCERTAINTY") {
            config.uncertainty = parse_env_value(&val, "LABEL_FORGE_UNCERTAINTY")?;
        }

        if let Some(val) = lookup("LABEL_FORGE_DENSITY_METRIC") {
            config.density_metric = parse_env_value(&val, "LABEL_FORGE_DENSITY_METRIC")?;
        }

        if let Some(val) = lookup("LABEL_FORGE_STOPPING_THRESHOLD") {
            config.stopping_threshold = parse_env_value(&val, "LABEL_FORGE_STOPPING_THRESHOLD")?;
        }

        if let Some(val) = lookup("LABEL_FORGE_AVERAGE") {
            config.average = parse_env_value(&val, "LABEL_FORGE_AVERAGE")?;
        }

        if let Some(val) = lookup("LABEL_FORGE_REPORT_EVERY") {
            config.report_every = parse_env_value(&val, "LABEL_FORGE_REPORT_EVERY")?;
        }

        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ValidationFailed(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if self.uncertainty_multiplier == 0 {
            return Err(ConfigError::ValidationFailed(
                "uncertainty_multiplier must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.stopping_threshold) {
            return Err(ConfigError::ValidationFailed(
                "stopping_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.report_every == 0 {
            return Err(ConfigError::ValidationFailed(
                "report_every must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// The query strategy described by this configuration.
    pub fn query_strategy(&self) -> QueryStrategy {
        QueryStrategy::new()
            .with_uncertainty(self.uncertainty)
            .with_density_metric(self.density_metric)
            .with_uncertainty_multiplier(self.uncertainty_multiplier)
    }

    // Builder methods

    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the candidate multiplier.
    pub fn with_uncertainty_multiplier(mut self, multiplier: usize) -> Self {
        self.uncertainty_multiplier = multiplier;
        self
    }

    /// Sets the uncertainty measure.
    pub fn with_uncertainty(mut self, measure: UncertaintyMeasure) -> Self {
        self.uncertainty = measure;
        self
    }

    /// Sets the density similarity.
    pub fn with_density_metric(mut self, metric: DensityMetric) -> Self {
        self.density_metric = metric;
        self
    }

    /// Sets the stopping threshold.
    pub fn with_stopping_threshold(mut self, threshold: f64) -> Self {
        self.stopping_threshold = threshold;
        self
    }

    /// Sets the averaging mode of the stopping score.
    pub fn with_average(mut self, average: AverageMode) -> Self {
        self.average = average;
        self
    }

    /// Sets the progress reporting interval.
    pub fn with_report_every(mut self, report_every: usize) -> Self {
        self.report_every = report_every;
        self
    }
}

/// Parse an environment variable value into the target type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}
