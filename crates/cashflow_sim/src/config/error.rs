//! Configuration errors.

use thiserror::Error;

/// Structural configuration errors.
///
/// Raised before any sampling begins. Distribution and correlation problems
/// have their own types in `cashflow_core` and are wrapped by
/// [`SimulationError`](crate::SimulationError).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// Iteration count outside [1, 10_000_000].
    #[error("Invalid iteration count {0}: must be in range [1, 10_000_000]")]
    InvalidIterationCount(usize),

    /// Horizon outside [1, 10_000].
    #[error("Invalid horizon {0}: must be in range [1, 10_000] periods")]
    InvalidHorizon(usize),

    /// Confidence level outside the open interval (0, 1).
    #[error("Invalid confidence level {0}: must be in (0, 1)")]
    InvalidConfidenceLevel(f64),

    /// Two variables share a name.
    #[error("Duplicate variable name '{0}'")]
    DuplicateVariable(String),

    /// Invalid parameter value with name and description.
    #[error("Invalid parameter '{name}': {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Description of the invalid value
        value: String,
    },

    /// Configuration file could not be read or parsed.
    #[error("Configuration file error: {0}")]
    File(String),

    /// Environment variable holds an unusable value.
    #[error("Environment variable error: {0}")]
    Env(String),

    /// The worker pool could not be created.
    #[error("Worker pool error: {0}")]
    WorkerPool(String),
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            value: value.into(),
        }
    }
}
