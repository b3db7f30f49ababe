//! Descriptive statistics and percentiles over simulated samples.
//!
//! Every function here returns a finite number for finite input: empty
//! samples and zero-variance samples produce explicit zeros rather than NaN.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Tolerance subtracted before taking the ceiling in [`percentile_index`].
const PERCENTILE_EPSILON: f64 = 1e-9;

/// Summary statistics of one sample.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of observations
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// Median (average of the two middle values for even counts)
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Smallest observation
    pub min: f64,
    /// Largest observation
    pub max: f64,
    /// Bias-corrected sample skewness
    pub skewness: f64,
    /// Bias-corrected excess kurtosis
    pub kurtosis: f64,
}

/// Sorts a copy of `values` ascending (NaN-tolerant total order).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    sort_in_place(&mut v);
    v
}

/// Sorts `values` ascending in place.
pub fn sort_in_place(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Mean of `values`, or 0 for an empty slice.
#[inline]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation, or 0 for an empty slice.
pub fn population_std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Index into a sorted sample of length `n` for probability `p`.
///
/// `ceil(p * n) - 1`, clamped to `[0, n - 1]`. A tiny epsilon keeps
/// products such as `0.07 * 100` from rounding up past the intended rank.
///
/// # Examples
///
/// ```
/// use cashflow_core::math::percentile_index;
///
/// assert_eq!(percentile_index(0.5, 100), 49);
/// assert_eq!(percentile_index(0.05, 100), 4);
/// assert_eq!(percentile_index(0.0, 100), 0);
/// assert_eq!(percentile_index(1.0, 100), 99);
/// ```
pub fn percentile_index(p: f64, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let rank = (p * n as f64 - PERCENTILE_EPSILON).ceil() - 1.0;
    if rank <= 0.0 || rank.is_nan() {
        0
    } else {
        (rank as usize).min(n - 1)
    }
}

/// Percentile of an ascending-sorted sample, or 0 when it is empty.
///
/// # Examples
///
/// ```
/// use cashflow_core::math::percentile;
///
/// let data: Vec<f64> = (1..=100).map(f64::from).collect();
/// assert_eq!(percentile(&data, 0.50), 50.0);
/// assert_eq!(percentile(&data, 0.05), 5.0);
/// ```
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        0.0
    } else {
        sorted[percentile_index(p, sorted.len())]
    }
}

/// Median of an ascending-sorted sample, or 0 when it is empty.
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Computes [`Statistics`] for `values`.
///
/// # Examples
///
/// ```
/// use cashflow_core::math::describe;
///
/// let s = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
/// assert_eq!(s.mean, 5.0);
/// assert_eq!(s.std_dev, 2.0);
/// assert_eq!(s.median, 4.5);
/// ```
pub fn describe(values: &[f64]) -> Statistics {
    if values.is_empty() {
        return Statistics::default();
    }

    let sorted = sorted(values);
    let n = sorted.len();
    let nf = n as f64;
    let m = mean(&sorted);

    let sum_sq: f64 = sorted.iter().map(|v| (v - m).powi(2)).sum();
    let std_dev = (sum_sq / nf).sqrt();

    // Standardised moments use the sample deviation.
    let sample_sd = if n > 1 {
        (sum_sq / (nf - 1.0)).sqrt()
    } else {
        0.0
    };

    let skewness = if n >= 3 && sample_sd > 0.0 {
        let s3: f64 = sorted.iter().map(|v| ((v - m) / sample_sd).powi(3)).sum();
        nf / ((nf - 1.0) * (nf - 2.0)) * s3
    } else {
        0.0
    };

    let kurtosis = if n >= 4 && sample_sd > 0.0 {
        let s4: f64 = sorted.iter().map(|v| ((v - m) / sample_sd).powi(4)).sum();
        nf * (nf + 1.0) / ((nf - 1.0) * (nf - 2.0) * (nf - 3.0)) * s4
            - 3.0 * (nf - 1.0).powi(2) / ((nf - 2.0) * (nf - 3.0))
    } else {
        0.0
    };

    Statistics {
        count: n,
        mean: m,
        median: median(&sorted),
        std_dev,
        min: sorted[0],
        max: sorted[n - 1],
        skewness,
        kurtosis,
    }
}
