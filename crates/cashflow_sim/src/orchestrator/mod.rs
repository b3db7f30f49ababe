//! Simulation orchestration.
//!
//! Iterations are independent pure computations, so the orchestrator runs
//! them across a rayon pool sized by [`EngineSettings`](crate::EngineSettings),
//! with one generator per iteration seeded `base_seed + index`. Results are
//! folded back in index order before any aggregation, which makes a seeded
//! run bit-identical regardless of thread count or chunk size.

mod cancel;
mod engine;

pub use cancel::CancellationToken;
pub use engine::SimulationEngine;
