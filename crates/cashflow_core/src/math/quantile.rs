//! Streaming quantile estimation with the P² algorithm.
//!
//! Jain, R. & Chlamtac, I. (1985). "The P² Algorithm for Dynamic
//! Calculation of Quantiles and Histograms Without Storing Observations".
//! Communications of the ACM 28(10).
//!
//! Each estimator keeps five markers regardless of how many observations it
//! has seen, so per-period confidence bands cost O(horizon) memory instead
//! of O(iterations × horizon). Until five observations arrive the estimate
//! is exact.

use super::statistics::{percentile, sort_in_place};

/// P² estimator for a single probability.
///
/// # Examples
///
/// ```
/// use cashflow_core::math::P2Quantile;
///
/// let mut q = P2Quantile::new(0.5);
/// for i in 0..1001_u64 {
///     q.observe(((i * 7919) % 1001) as f64);
/// }
/// assert!((q.estimate() - 500.0).abs() < 20.0);
/// ```
#[derive(Clone, Debug)]
pub struct P2Quantile {
    p: f64,
    count: usize,
    /// Marker heights
    heights: [f64; 5],
    /// Actual marker positions (1-based)
    positions: [f64; 5],
    /// Desired marker positions
    desired: [f64; 5],
    /// Desired position increments
    increments: [f64; 5],
}

impl P2Quantile {
    /// Creates an estimator for probability `p` (clamped to [0, 1]).
    pub fn new(p: f64) -> Self {
        let p = if p.is_nan() { 0.5 } else { p.clamp(0.0, 1.0) };
        Self {
            p,
            count: 0,
            heights: [0.0; 5],
            positions: [1.0, 2.0, 3.0, 4.0, 5.0],
            desired: [1.0, 1.0 + 2.0 * p, 1.0 + 4.0 * p, 3.0 + 2.0 * p, 5.0],
            increments: [0.0, p / 2.0, p, (1.0 + p) / 2.0, 1.0],
        }
    }

    /// Target probability.
    pub fn probability(&self) -> f64 {
        self.p
    }

    /// Number of observations seen.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Adds one observation.
    pub fn observe(&mut self, x: f64) {
        if self.count < 5 {
            self.heights[self.count] = x;
            self.count += 1;
            if self.count == 5 {
                sort_in_place(&mut self.heights);
            }
            return;
        }
        self.count += 1;

        let q = &mut self.heights;
        let k = if x < q[0] {
            q[0] = x;
            0
        } else if x < q[1] {
            0
        } else if x < q[2] {
            1
        } else if x < q[3] {
            2
        } else if x <= q[4] {
            3
        } else {
            q[4] = x;
            3
        };

        for pos in self.positions.iter_mut().skip(k + 1) {
            *pos += 1.0;
        }
        for (d, inc) in self.desired.iter_mut().zip(self.increments.iter()) {
            *d += inc;
        }

        for i in 1..4 {
            let delta = self.desired[i] - self.positions[i];
            let gap_up = self.positions[i + 1] - self.positions[i];
            let gap_down = self.positions[i - 1] - self.positions[i];
            if (delta >= 1.0 && gap_up > 1.0) || (delta <= -1.0 && gap_down < -1.0) {
                let d = delta.signum();
                let candidate = self.parabolic(i, d);
                self.heights[i] =
                    if self.heights[i - 1] < candidate && candidate < self.heights[i + 1] {
                        candidate
                    } else {
                        self.linear(i, d)
                    };
                self.positions[i] += d;
            }
        }
    }

    /// Current estimate, or 0 before any observation.
    pub fn estimate(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        if self.count < 5 {
            let mut seen = self.heights[..self.count].to_vec();
            sort_in_place(&mut seen);
            return percentile(&seen, self.p);
        }
        self.heights[2]
    }

    fn parabolic(&self, i: usize, d: f64) -> f64 {
        let q = &self.heights;
        let n = &self.positions;
        q[i] + d / (n[i + 1] - n[i - 1])
            * ((n[i] - n[i - 1] + d) * (q[i + 1] - q[i]) / (n[i + 1] - n[i])
                + (n[i + 1] - n[i] - d) * (q[i] - q[i - 1]) / (n[i] - n[i - 1]))
    }

    fn linear(&self, i: usize, d: f64) -> f64 {
        let j = if d > 0.0 { i + 1 } else { i - 1 };
        self.heights[i]
            + d * (self.heights[j] - self.heights[i]) / (self.positions[j] - self.positions[i])
    }
}
