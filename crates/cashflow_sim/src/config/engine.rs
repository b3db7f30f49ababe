//! Execution settings for the orchestrator.
//!
//! These control how a run is executed, never what it computes: a seeded
//! simulation produces the same result for every thread count and chunk
//! size.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Iterations per chunk when not configured.
pub const DEFAULT_CHUNK_SIZE: usize = 4_096;

/// Largest `iterations × horizon` product for which `Auto` keeps every balance.
pub const EXACT_BAND_CELL_LIMIT: usize = 5_000_000;

/// Environment variable overriding the worker thread count.
pub const ENV_THREADS: &str = "CASHFLOW_SIM_THREADS";
/// Environment variable selecting the band backend.
pub const ENV_BAND_BACKEND: &str = "CASHFLOW_SIM_BAND_BACKEND";
/// Environment variable overriding the chunk size.
pub const ENV_CHUNK_SIZE: &str = "CASHFLOW_SIM_CHUNK_SIZE";

/// How per-period confidence bands are accumulated.
///
/// - `Exact`: retains every closing balance and sorts per period
/// - `Streaming`: five P² estimators per period, O(horizon) memory
/// - `Auto`: `Exact` up to [`EXACT_BAND_CELL_LIMIT`] cells, `Streaming` above
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandBackend {
    /// Retain all balances
    Exact,
    /// P² streaming estimators
    Streaming,
    /// Choose by problem size
    #[default]
    Auto,
}

impl BandBackend {
    /// Resolves `Auto` to a concrete backend for the given problem size.
    ///
    /// # Examples
    ///
    /// ```
    /// use cashflow_sim::config::BandBackend;
    ///
    /// assert_eq!(BandBackend::Auto.resolve(10_000, 36), BandBackend::Exact);
    /// assert_eq!(BandBackend::Auto.resolve(1_000_000, 120), BandBackend::Streaming);
    /// assert_eq!(BandBackend::Exact.resolve(1_000_000, 120), BandBackend::Exact);
    /// ```
    pub fn resolve(self, iterations: usize, horizon: usize) -> BandBackend {
        match self {
            BandBackend::Auto => {
                if iterations.saturating_mul(horizon) <= EXACT_BAND_CELL_LIMIT {
                    BandBackend::Exact
                } else {
                    BandBackend::Streaming
                }
            }
            other => other,
        }
    }

    /// Lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            BandBackend::Exact => "exact",
            BandBackend::Streaming => "streaming",
            BandBackend::Auto => "auto",
        }
    }
}

impl FromStr for BandBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(BandBackend::Exact),
            "streaming" | "stream" => Ok(BandBackend::Streaming),
            "auto" => Ok(BandBackend::Auto),
            _ => Err(ConfigError::Env(format!(
                "unknown band backend '{}': expected exact, streaming or auto",
                s
            ))),
        }
    }
}

impl std::fmt::Display for BandBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Orchestrator execution settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Worker threads in the iteration pool
    pub worker_threads: usize,
    /// Confidence band backend
    pub band_backend: BandBackend,
    /// Iterations processed per chunk
    pub chunk_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            worker_threads: num_cpus::get().max(1),
            band_backend: BandBackend::Auto,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl EngineSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker thread count.
    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads;
        self
    }

    /// Sets the band backend.
    pub fn with_band_backend(mut self, band_backend: BandBackend) -> Self {
        self.band_backend = band_backend;
        self
    }

    /// Sets the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Loads settings from `CASHFLOW_SIM_*` environment variables on top of
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Env` when a variable is set but unparsable,
    /// and the [`validate`](Self::validate) errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(threads) = lookup(ENV_THREADS) {
            settings.worker_threads = threads
                .trim()
                .parse()
                .map_err(|_| not_a_count(ENV_THREADS, &threads))?;
        }

        if let Some(backend) = lookup(ENV_BAND_BACKEND) {
            settings.band_backend = BandBackend::from_str(&backend)?;
        }

        if let Some(chunk) = lookup(ENV_CHUNK_SIZE) {
            settings.chunk_size = chunk
                .trim()
                .parse()
                .map_err(|_| not_a_count(ENV_CHUNK_SIZE, &chunk))?;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the thread count or chunk size is 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::invalid("worker_threads", "must be at least 1"));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::invalid("chunk_size", "must be at least 1"));
        }
        Ok(())
    }
}

fn not_a_count(name: &str, value: &str) -> ConfigError {
    ConfigError::Env(format!("{}='{}' is not a count", name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert!(settings.worker_threads >= 1);
        assert_eq!(settings.band_backend, BandBackend::Auto);
        assert_eq!(settings.chunk_size, DEFAULT_CHUNK_SIZE);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let settings = EngineSettings::from_lookup(lookup_from(&[
            (ENV_THREADS, "3"),
            (ENV_BAND_BACKEND, "Streaming"),
            (ENV_CHUNK_SIZE, "128"),
        ]))
        .unwrap();

        assert_eq!(settings.worker_threads, 3);
        assert_eq!(settings.band_backend, BandBackend::Streaming);
        assert_eq!(settings.chunk_size, 128);
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let result = EngineSettings::from_lookup(lookup_from(&[(ENV_THREADS, "many")]));
        assert!(matches!(result, Err(ConfigError::Env(_))));

        let result = EngineSettings::from_lookup(lookup_from(&[(ENV_BAND_BACKEND, "tdigest")]));
        assert!(matches!(result, Err(ConfigError::Env(_))));

        let result = EngineSettings::from_lookup(lookup_from(&[(ENV_CHUNK_SIZE, "0")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "chunk_size",
                ..
            })
        ));
    }

    #[test]
    fn test_auto_threshold_is_inclusive() {
        assert_eq!(
            BandBackend::Auto.resolve(EXACT_BAND_CELL_LIMIT, 1),
            BandBackend::Exact
        );
        assert_eq!(
            BandBackend::Auto.resolve(EXACT_BAND_CELL_LIMIT + 1, 1),
            BandBackend::Streaming
        );
        assert_eq!(
            BandBackend::Auto.resolve(usize::MAX, 2),
            BandBackend::Streaming
        );
    }

    #[test]
    fn test_backend_display_roundtrip() {
        for backend in [BandBackend::Exact, BandBackend::Streaming, BandBackend::Auto] {
            assert_eq!(backend.to_string().parse::<BandBackend>().unwrap(), backend);
        }
    }
}
