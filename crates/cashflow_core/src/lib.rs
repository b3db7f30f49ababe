//! # cashflow_core: Sampling Foundation for Cash-Flow Risk Simulation
//!
//! ## Layer 1 (Foundation) Role
//!
//! cashflow_core is the bottom layer of the two-layer workspace, providing:
//! - Seeded, per-iteration random number generation (`rng`)
//! - Variable specifications and the distribution sampler (`distributions`)
//! - Correlation matrices, Cholesky factors and correlated projection (`correlation`)
//! - Descriptive statistics, percentiles and streaming quantiles (`math`)
//!
//! ## Zero Engine Dependency Principle
//!
//! Layer 1 knows nothing about cash flows, periods or iterations. The engine
//! in `cashflow_sim` composes these pieces; everything here is a pure function
//! of its inputs plus an explicitly passed generator.
//!
//! ## Usage Examples
//!
//! ```rust
//! use cashflow_core::distributions::{Distribution, Sampler, VariableSpec};
//! use cashflow_core::rng::SimRng;
//!
//! let spec = VariableSpec::new("revenue", Distribution::Normal { mean: 100.0, std_dev: 10.0 });
//! spec.validate().unwrap();
//!
//! let mut rng = SimRng::from_seed(42);
//! let value = Sampler::default().sample(&spec, None, &mut rng).unwrap();
//! assert!(value.is_finite());
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod correlation;
pub mod distributions;
pub mod math;
pub mod rng;
