//! Error types for correlation specifications.

use thiserror::Error;

/// Correlation errors.
///
/// Raised eagerly while the correlation matrix is assembled, before any
/// sampling starts.
///
/// # Examples
/// ```
/// use cashflow_core::correlation::CorrelationError;
///
/// let err = CorrelationError::UnknownVariable { name: "ebitda".to_string() };
/// assert!(err.to_string().contains("ebitda"));
/// ```
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CorrelationError {
    /// A pair references a variable that is not configured.
    #[error("Invalid correlation spec: unknown variable '{name}'")]
    UnknownVariable {
        /// The unknown variable name
        name: String,
    },

    /// A pair correlates a variable with itself.
    #[error("Invalid correlation spec: '{name}' cannot be correlated with itself")]
    SelfCorrelation {
        /// The repeated variable name
        name: String,
    },

    /// A coefficient lies outside [-1, 1] or is not finite.
    #[error("Invalid correlation spec: coefficient {value} for ('{first}', '{second}') must be in [-1, 1]")]
    OutOfRange {
        /// First variable
        first: String,
        /// Second variable
        second: String,
        /// Offending coefficient
        value: f64,
    },

    /// The same unordered pair is specified more than once.
    #[error("Invalid correlation spec: pair ('{first}', '{second}') specified more than once")]
    DuplicatePair {
        /// First variable
        first: String,
        /// Second variable
        second: String,
    },
}
