//! Correlation engine: matrix construction, Cholesky decomposition and
//! projection of independent draws into correlated shocks.
//!
//! ```text
//! CorrelationPair[] ──from_pairs──▶ CorrelationMatrix ──cholesky──▶ CholeskyFactor
//!                                                                      │
//!                   independent N(0,1) draws ──────────── L · z ───────┘──▶ shocks
//! ```

mod engine;
mod error;
mod matrix;

pub use engine::CorrelationEngine;
pub use error::CorrelationError;
pub use matrix::{CholeskyFactor, CorrelationMatrix, CorrelationPair};
