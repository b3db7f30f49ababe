//! Post-run analysis.
//!
//! Every component here is a single-threaded reduction over the complete,
//! index-ordered set of iteration records, except the stress replays which
//! map over records in parallel before reducing sequentially.
//!
//! - [`StatisticalAnalyzer`]: statistics, percentiles, shortfall, convergence
//! - [`RiskMetricsCalculator`]: VaR/CVaR, expected shortfall, ruin, liquidity
//! - [`run_stress_tests`]: deterministic revenue/expense shocks
//! - [`ScenarioPathSelector`]: best/median/worst paths
//! - [`PeriodAggregator`]: per-period bands, fed during the run

mod bands;
mod risk;
mod scenarios;
mod statistics;
mod stress;

pub use bands::{ConfidenceBand, PeriodAggregator, BAND_LEVELS};
pub use risk::{
    LiquidityRisk, RiskMetrics, RiskMetricsCalculator, TailRisk, MAX_LIQUIDITY_SCORE, VAR_LEVELS,
};
pub use scenarios::{
    nearest, ScenarioPath, ScenarioPathSelector, ScenarioPaths, BEST_PERCENTILE,
    MEDIAN_PERCENTILE, WORST_PERCENTILE,
};
pub use statistics::{
    ConvergenceDiagnostic, MetricSet, PercentilePoint, ShortfallAnalysis, StatisticalAnalyzer,
    TrackedMetric, CONVERGENCE_BATCHES, CONVERGENCE_THRESHOLD,
};
pub use stress::{
    run_stress_tests, StressScenario, StressTestResult, STANDARD_STRESS_SCENARIOS,
};

use crate::config::BandBackend;
use cashflow_core::math::Statistics;
use serde::{Deserialize, Serialize};

/// Non-fatal conditions observed during a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimulationWarning {
    /// The correlation matrix was not positive semi-definite; negative
    /// Cholesky pivots were clamped to zero and the realised correlations
    /// differ from the configured ones.
    CorrelationMatrixNotPositiveSemiDefinite,
    /// A non-zero correlation names a variable whose family ignores the
    /// correlated shock, so the pair has no effect on the draws.
    CorrelationIgnored {
        /// First variable of the pair
        first: String,
        /// Second variable of the pair
        second: String,
    },
    /// Confidence bands are P² estimates rather than exact percentiles.
    StreamingBands {
        /// `iterations × horizon`
        cells: usize,
    },
}

/// Run-level facts needed to interpret or reproduce a result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Iterations completed
    pub iterations: usize,
    /// Periods per path
    pub horizon: usize,
    /// Number of sampled variables
    pub variables: usize,
    /// Base seed actually used; iteration `i` used `seed + i`
    pub seed: u64,
    /// True when at least one non-zero correlation reached the draws
    pub correlated: bool,
    /// Band backend actually used
    pub band_backend: BandBackend,
    /// Non-fatal warnings
    pub warnings: Vec<SimulationWarning>,
}

/// Complete output of one simulation run.
///
/// Plain data: serialisable and free of references into the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Descriptive statistics per tracked metric
    pub statistics: MetricSet<Statistics>,
    /// Percentile tables per tracked metric at the configured levels
    pub percentiles: MetricSet<Vec<PercentilePoint>>,
    /// Shortfall distribution
    pub shortfall: ShortfallAnalysis,
    /// Batch-mean convergence of final cash
    pub convergence: ConvergenceDiagnostic,
    /// Tail-risk metrics and stress tests
    pub risk: RiskMetrics,
    /// Representative paths and bands
    pub scenarios: ScenarioPaths,
    /// Run metadata
    pub metadata: RunMetadata,
}
