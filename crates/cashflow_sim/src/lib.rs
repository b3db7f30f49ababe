//! # cashflow_sim: Monte Carlo Cash-Flow Risk Engine
//!
//! ## Layer 2 (Engine) Role
//!
//! cashflow_sim answers "how likely is a cash shortfall over the horizon,
//! and how bad would it be?" It builds on `cashflow_core` and provides:
//! - Configuration with fail-fast validation and TOML loading (`config`)
//! - The deterministic per-period cash-flow model (`model`)
//! - Single-path execution (`runner`)
//! - Parallel, chunked, cancellable orchestration (`orchestrator`)
//! - Statistics, tail risk, stress tests and representative paths (`analysis`)
//!
//! ## Determinism
//!
//! With a configured seed, [`run_simulation`] returns a bit-identical
//! [`AnalysisResult`] on every call, independent of the worker thread
//! count. Without one, a base seed is drawn from OS entropy and reported in
//! [`RunMetadata::seed`](analysis::RunMetadata::seed).
//!
//! ## Logging
//!
//! The engine emits `tracing` events (run start and end, per-chunk
//! progress, degraded correlation, streaming bands) and never installs a
//! subscriber.
//!
//! ## Usage Examples
//!
//! ```rust
//! use cashflow_core::distributions::{Distribution, VariableSpec};
//! use cashflow_sim::{run_simulation, SimulationConfig};
//!
//! let config = SimulationConfig::builder()
//!     .iterations(1_000)
//!     .horizon(12)
//!     .variable(VariableSpec::new("revenue", Distribution::Normal { mean: 10_000.0, std_dev: 1_000.0 }))
//!     .seed(42)
//!     .build()
//!     .unwrap();
//!
//! let result = run_simulation(&config).unwrap();
//! assert_eq!(result.risk.probability_of_ruin, 0.0);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod runner;

pub use analysis::AnalysisResult;
pub use config::{BandBackend, ConfigError, EngineSettings, SimulationConfig};
pub use error::SimulationError;
pub use model::PaymentPatternProvider;
pub use orchestrator::{CancellationToken, SimulationEngine};

/// Runs `config` with default engine settings and standard payment patterns.
///
/// # Errors
///
/// See [`SimulationEngine::run`].
pub fn run_simulation(config: &SimulationConfig) -> Result<AnalysisResult, SimulationError> {
    SimulationEngine::default().run(config)
}

/// Runs `config` with caller-supplied settlement curves.
///
/// # Errors
///
/// See [`SimulationEngine::run`].
pub fn run_simulation_with<P>(
    config: &SimulationConfig,
    patterns: P,
) -> Result<AnalysisResult, SimulationError>
where
    P: PaymentPatternProvider + 'static,
{
    SimulationEngine::default().with_patterns(patterns).run(config)
}
