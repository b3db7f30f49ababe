//! Iteration runner.
//!
//! One iteration moves through three stages and never branches back:
//!
//! 1. **Sampling**: one vector of correlated shocks, then every variable
//!    in configuration order
//! 2. **Accumulating**: the period model walks the horizon updating the
//!    balance; shortfall is `max(0, -balance)`
//! 3. **Summarising**: extremes, final balance and shortfall counts
//!
//! No state crosses iterations, which is what lets the orchestrator run
//! them on any thread in any order.

mod iteration;
mod result;

pub use iteration::IterationRunner;
pub use result::{IterationRecord, IterationResult, IterationSummary, PeriodOutcome};
