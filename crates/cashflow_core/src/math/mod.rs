//! Numerical helpers shared by the analysis layer.
//!
//! - [`statistics`]: descriptive statistics with the pinned percentile rule
//! - [`quantile`]: P² streaming quantile estimator

pub mod quantile;
pub mod statistics;

pub use quantile::P2Quantile;
pub use statistics::{
    describe, mean, median, percentile, percentile_index, population_std_dev, sort_in_place,
    sorted, Statistics,
};
