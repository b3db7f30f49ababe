//! Simulation configuration.
//!
//! - [`SimulationConfig`]: what to simulate (variables, correlations, horizon, schedules)
//! - [`EngineSettings`]: how to execute it (threads, band backend, chunk size)
//!
//! Both are validated before any sampling starts.

mod engine;
mod error;
mod schedule;
mod simulation;

pub use engine::{
    BandBackend, EngineSettings, DEFAULT_CHUNK_SIZE, ENV_BAND_BACKEND, ENV_CHUNK_SIZE,
    ENV_THREADS, EXACT_BAND_CELL_LIMIT,
};
pub use error::ConfigError;
pub use schedule::{amount_at, ScheduledAmount, TaxPolicy, DEFAULT_TAX_FREQUENCY};
pub use simulation::{
    SimulationConfig, SimulationConfigBuilder, DEFAULT_CONFIDENCE_LEVELS, DEFAULT_ITERATIONS,
    MAX_HORIZON, MAX_ITERATIONS, SEASONALITY_LEN,
};
