//! Simulation configuration and its builder.

use super::error::ConfigError;
use super::schedule::{validate_schedule, ScheduledAmount, TaxPolicy};
use crate::error::SimulationError;
use cashflow_core::correlation::{CorrelationMatrix, CorrelationPair};
use cashflow_core::distributions::{VariableSpec, DEFAULT_MAX_REJECTION_ATTEMPTS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Maximum number of iterations allowed.
pub const MAX_ITERATIONS: usize = 10_000_000;

/// Maximum number of periods allowed.
pub const MAX_HORIZON: usize = 10_000;

/// Iterations used when none are configured.
pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Confidence levels reported when none are configured.
pub const DEFAULT_CONFIDENCE_LEVELS: [f64; 5] = [0.05, 0.25, 0.50, 0.75, 0.95];

/// Number of seasonality factors (one per calendar month).
pub const SEASONALITY_LEN: usize = 12;

fn default_iterations() -> usize {
    DEFAULT_ITERATIONS
}

fn default_confidence_levels() -> Vec<f64> {
    DEFAULT_CONFIDENCE_LEVELS.to_vec()
}

fn default_max_rejection_attempts() -> usize {
    DEFAULT_MAX_REJECTION_ATTEMPTS
}

/// Monte Carlo cash-flow simulation configuration.
///
/// Immutable once built. Use [`SimulationConfig::builder`] in code or
/// [`SimulationConfig::from_toml_str`] / [`SimulationConfig::from_file`]
/// for configuration files; both paths validate before returning.
///
/// # Examples
///
/// ```rust
/// use cashflow_core::distributions::{Distribution, VariableSpec};
/// use cashflow_sim::SimulationConfig;
///
/// let config = SimulationConfig::builder()
///     .iterations(2_000)
///     .horizon(12)
///     .initial_cash(50_000.0)
///     .variable(VariableSpec::new("revenue", Distribution::Normal { mean: 10_000.0, std_dev: 1_000.0 }))
///     .seed(7)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.iterations(), 2_000);
/// assert_eq!(config.confidence_levels(), &[0.05, 0.25, 0.50, 0.75, 0.95]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_iterations")]
    iterations: usize,
    horizon: usize,
    #[serde(default)]
    initial_cash: f64,
    #[serde(default)]
    variables: Vec<VariableSpec>,
    #[serde(default)]
    correlations: Vec<CorrelationPair>,
    #[serde(default = "default_confidence_levels")]
    confidence_levels: Vec<f64>,
    #[serde(default)]
    seasonality: Option<Vec<f64>>,
    #[serde(default)]
    capex_schedule: Vec<ScheduledAmount>,
    #[serde(default)]
    one_time_items: Vec<ScheduledAmount>,
    #[serde(default)]
    debt_service: f64,
    #[serde(default)]
    tax: TaxPolicy,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_max_rejection_attempts")]
    max_rejection_attempts: usize,
}

impl SimulationConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::File` when the document does not parse, and
    /// any [`validate`](Self::validate) error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cashflow_sim::SimulationConfig;
    ///
    /// let config = SimulationConfig::from_toml_str(r#"
    ///     iterations = 1000
    ///     horizon = 6
    ///     initial_cash = 1000.0
    ///
    ///     [[variables]]
    ///     name = "operating_expenses"
    ///     type = "normal"
    ///     mean = 5000.0
    ///     std_dev = 0.0
    /// "#).unwrap();
    ///
    /// assert_eq!(config.horizon(), 6);
    /// assert_eq!(config.variables().len(), 1);
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, SimulationError> {
        let config: SimulationConfig = toml::from_str(content)
            .map_err(|e| ConfigError::File(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::File` when the file cannot be read, plus the
    /// [`from_toml_str`](Self::from_toml_str) errors.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimulationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::File(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Number of iterations.
    #[inline]
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Number of periods per path.
    #[inline]
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Opening cash balance.
    #[inline]
    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    /// Variable specifications in sampling order.
    #[inline]
    pub fn variables(&self) -> &[VariableSpec] {
        &self.variables
    }

    /// Variable names in sampling order.
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// Pairwise correlations.
    #[inline]
    pub fn correlations(&self) -> &[CorrelationPair] {
        &self.correlations
    }

    /// Non-zero correlations that cannot reach the sampled values.
    ///
    /// Only normal, lognormal and custom variables consume the correlated
    /// shock; a pair touching any other family is sampled independently.
    pub fn inert_correlations(&self) -> impl Iterator<Item = &CorrelationPair> + '_ {
        self.correlations
            .iter()
            .filter(move |pair| pair.coefficient != 0.0 && !self.consumes_shocks(pair))
    }

    /// Returns true when at least one non-zero correlation shapes the draws.
    pub fn has_effective_correlation(&self) -> bool {
        self.correlations
            .iter()
            .any(|pair| pair.coefficient != 0.0 && self.consumes_shocks(pair))
    }

    fn consumes_shocks(&self, pair: &CorrelationPair) -> bool {
        let uses_shock = |name: &str| {
            self.variables
                .iter()
                .any(|v| v.name == name && v.distribution.uses_shock())
        };
        uses_shock(&pair.first) && uses_shock(&pair.second)
    }

    /// Requested confidence levels for percentile tables.
    #[inline]
    pub fn confidence_levels(&self) -> &[f64] {
        &self.confidence_levels
    }

    /// Monthly seasonality factors, if any.
    #[inline]
    pub fn seasonality(&self) -> Option<&[f64]> {
        self.seasonality.as_deref()
    }

    /// Seasonal factor for `period`: `seasonality[period % 12]`, else 1.
    #[inline]
    pub fn seasonal_factor(&self, period: usize) -> f64 {
        match &self.seasonality {
            Some(factors) if !factors.is_empty() => factors[period % factors.len()],
            _ => 1.0,
        }
    }

    /// Capital expenditure schedule.
    #[inline]
    pub fn capex_schedule(&self) -> &[ScheduledAmount] {
        &self.capex_schedule
    }

    /// Signed one-off items.
    #[inline]
    pub fn one_time_items(&self) -> &[ScheduledAmount] {
        &self.one_time_items
    }

    /// Debt service paid every period.
    #[inline]
    pub fn debt_service(&self) -> f64 {
        self.debt_service
    }

    /// Tax policy.
    #[inline]
    pub fn tax(&self) -> &TaxPolicy {
        &self.tax
    }

    /// Optional base seed.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Rejection-sampling attempt budget per draw.
    #[inline]
    pub fn max_rejection_attempts(&self) -> usize {
        self.max_rejection_attempts
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` for counts, levels, schedules, seasonality,
    ///   duplicate names and the rejection budget
    /// - `InvalidDistributionParameters` for a malformed variable
    /// - `InvalidCorrelationSpec` for a malformed correlation entry
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(ConfigError::InvalidIterationCount(self.iterations).into());
        }
        if self.horizon == 0 || self.horizon > MAX_HORIZON {
            return Err(ConfigError::InvalidHorizon(self.horizon).into());
        }
        if !self.initial_cash.is_finite() {
            return Err(ConfigError::invalid("initial_cash", "must be finite").into());
        }
        if let Some(level) = self
            .confidence_levels
            .iter()
            .find(|p| !(p.is_finite() && **p > 0.0 && **p < 1.0))
        {
            return Err(ConfigError::InvalidConfidenceLevel(*level).into());
        }

        let mut seen = HashSet::with_capacity(self.variables.len());
        for spec in &self.variables {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(ConfigError::DuplicateVariable(spec.name.clone()).into());
            }
        }

        CorrelationMatrix::<f64>::from_pairs(&self.variable_names(), &self.correlations)?;

        if let Some(factors) = &self.seasonality {
            if factors.len() != SEASONALITY_LEN {
                return Err(ConfigError::invalid(
                    "seasonality",
                    format!("expected {} factors, got {}", SEASONALITY_LEN, factors.len()),
                )
                .into());
            }
            if factors.iter().any(|f| !f.is_finite() || *f < 0.0) {
                return Err(ConfigError::invalid(
                    "seasonality",
                    "factors must be finite and non-negative",
                )
                .into());
            }
        }

        validate_schedule("capex_schedule", &self.capex_schedule, false)?;
        validate_schedule("one_time_items", &self.one_time_items, true)?;

        if !self.debt_service.is_finite() || self.debt_service < 0.0 {
            return Err(
                ConfigError::invalid("debt_service", "must be finite and non-negative").into(),
            );
        }

        self.tax.validate()?;

        if self.max_rejection_attempts == 0 {
            return Err(ConfigError::invalid("max_rejection_attempts", "must be at least 1").into());
        }
        Ok(())
    }
}

/// Builder for [`SimulationConfig`].
///
/// `horizon` is required; everything else has a default.
#[derive(Clone, Debug)]
pub struct SimulationConfigBuilder {
    iterations: usize,
    horizon: Option<usize>,
    initial_cash: f64,
    variables: Vec<VariableSpec>,
    correlations: Vec<CorrelationPair>,
    confidence_levels: Vec<f64>,
    seasonality: Option<Vec<f64>>,
    capex_schedule: Vec<ScheduledAmount>,
    one_time_items: Vec<ScheduledAmount>,
    debt_service: f64,
    tax: TaxPolicy,
    seed: Option<u64>,
    max_rejection_attempts: usize,
}

impl Default for SimulationConfigBuilder {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            horizon: None,
            initial_cash: 0.0,
            variables: Vec::new(),
            correlations: Vec::new(),
            confidence_levels: default_confidence_levels(),
            seasonality: None,
            capex_schedule: Vec::new(),
            one_time_items: Vec::new(),
            debt_service: 0.0,
            tax: TaxPolicy::default(),
            seed: None,
            max_rejection_attempts: DEFAULT_MAX_REJECTION_ATTEMPTS,
        }
    }
}

impl SimulationConfigBuilder {
    /// Sets the number of iterations, in [1, 10_000_000].
    #[inline]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the number of periods, in [1, 10_000].
    #[inline]
    pub fn horizon(mut self, horizon: usize) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Sets the opening cash balance.
    #[inline]
    pub fn initial_cash(mut self, initial_cash: f64) -> Self {
        self.initial_cash = initial_cash;
        self
    }

    /// Appends one variable.
    pub fn variable(mut self, spec: VariableSpec) -> Self {
        self.variables.push(spec);
        self
    }

    /// Replaces the variable list.
    pub fn variables(mut self, specs: Vec<VariableSpec>) -> Self {
        self.variables = specs;
        self
    }

    /// Adds one correlation entry.
    pub fn correlation(
        mut self,
        first: impl Into<String>,
        second: impl Into<String>,
        coefficient: f64,
    ) -> Self {
        self.correlations
            .push(CorrelationPair::new(first, second, coefficient));
        self
    }

    /// Replaces the confidence levels.
    pub fn confidence_levels(mut self, levels: Vec<f64>) -> Self {
        self.confidence_levels = levels;
        self
    }

    /// Sets monthly seasonality factors (exactly 12).
    pub fn seasonality(mut self, factors: Vec<f64>) -> Self {
        self.seasonality = Some(factors);
        self
    }

    /// Adds a capital expenditure at `period`.
    pub fn capex(mut self, period: usize, amount: f64) -> Self {
        self.capex_schedule.push(ScheduledAmount::new(period, amount));
        self
    }

    /// Adds a signed one-off item at `period`.
    pub fn one_time_item(mut self, period: usize, amount: f64) -> Self {
        self.one_time_items.push(ScheduledAmount::new(period, amount));
        self
    }

    /// Sets the per-period debt service.
    #[inline]
    pub fn debt_service(mut self, amount: f64) -> Self {
        self.debt_service = amount;
        self
    }

    /// Sets the tax policy.
    pub fn tax(mut self, tax: TaxPolicy) -> Self {
        self.tax = tax;
        self
    }

    /// Sets the base seed for reproducible runs.
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the rejection-sampling attempt budget.
    #[inline]
    pub fn max_rejection_attempts(mut self, attempts: usize) -> Self {
        self.max_rejection_attempts = attempts;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when `horizon` is not set, plus every
    /// [`SimulationConfig::validate`] error.
    pub fn build(self) -> Result<SimulationConfig, SimulationError> {
        let horizon = self
            .horizon
            .ok_or_else(|| ConfigError::invalid("horizon", "must be specified"))?;

        let config = SimulationConfig {
            iterations: self.iterations,
            horizon,
            initial_cash: self.initial_cash,
            variables: self.variables,
            correlations: self.correlations,
            confidence_levels: self.confidence_levels,
            seasonality: self.seasonality,
            capex_schedule: self.capex_schedule,
            one_time_items: self.one_time_items,
            debt_service: self.debt_service,
            tax: self.tax,
            seed: self.seed,
            max_rejection_attempts: self.max_rejection_attempts,
        };

        config.validate()?;
        Ok(config)
    }
}
