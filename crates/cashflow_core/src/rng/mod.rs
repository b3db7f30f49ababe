//! # Random Number Generation Infrastructure
//!
//! Per-iteration pseudo-random generators for the Monte Carlo engine.
//!
//! ## Design Rationale
//!
//! - **Reproducibility**: iteration `i` of a run seeded with `s` always uses
//!   a generator seeded with `s.wrapping_add(i)`
//! - **Isolation**: every iteration owns its generator; there is no shared
//!   or global random source, so parallel iterations never contend
//! - **Explicit passing**: samplers take `&mut SimRng` rather than reaching
//!   for ambient state
//!
//! ## Usage Example
//!
//! ```rust
//! use cashflow_core::rng::SimRng;
//!
//! let base = 12345;
//! let mut first = SimRng::for_iteration(base, 0);
//! let mut again = SimRng::for_iteration(base, 0);
//! assert_eq!(first.gen_uniform(), again.gen_uniform());
//!
//! let mut buffer = vec![0.0; 8];
//! first.fill_normal(&mut buffer);
//! ```

mod prng;

pub use prng::{entropy_seed, SimRng};
