//! Serializable estimator diagnostics.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::EstimatorKind;

/// Diagnostics of one estimator at the end of a computation.
///
/// Statistical fields are `None` for estimators that do not carry the
/// corresponding state (e.g. the occurrence histogram on a scale-up
/// estimator, or the margin of error on the non-statistical one).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorReport {
    /// The estimator that produced this report.
    pub kind: EstimatorKind,
    /// Final point estimate.
    pub estimation: Decimal,
    /// Total draws consumed.
    pub n: u64,
    /// Successful draws.
    pub successes: u64,
    /// Failed draws.
    pub failures: u64,
    /// Population size of the stream.
    pub total: u64,
    /// Configured relative accuracy.
    pub accuracy: Option<Decimal>,
    /// Configured significance level.
    pub confidence: Option<Decimal>,
    /// Sample success fraction.
    pub mean: Option<Decimal>,
    /// Finite-population-corrected variance of the mean.
    pub variance: Option<Decimal>,
    /// t-based margin of error.
    pub margin_of_error: Option<Decimal>,
    /// Lower bound of the confidence interval on the mean.
    pub ci_lower: Option<Decimal>,
    /// Upper bound of the confidence interval on the mean.
    pub ci_upper: Option<Decimal>,
    /// Occurrence histogram (occurrence count, number of pairs), sorted
    /// by occurrence count.
    pub histogram: Option<Vec<(u64, u64)>>,
    /// Sum of processed selection weights.
    pub prob_sum: Option<Decimal>,
    /// Mean of processed selection weights.
    pub prob_mean: Option<Decimal>,
    /// Variance of processed selection weights.
    pub prob_variance: Option<Decimal>,
    /// Current repeated-pair streak of the streak heuristic.
    pub repeated: Option<u64>,
}

impl EstimatorReport {
    /// Creates a report with the count fields filled and everything
    /// else empty.
    #[must_use]
    pub fn new(kind: EstimatorKind, estimation: Decimal, counts: super::DrawCounts) -> Self {
        Self {
            kind,
            estimation,
            n: counts.n,
            successes: counts.successes,
            failures: counts.failures,
            total: counts.total,
            accuracy: None,
            confidence: None,
            mean: None,
            variance: None,
            margin_of_error: None,
            ci_lower: None,
            ci_upper: None,
            histogram: None,
            prob_sum: None,
            prob_mean: None,
            prob_variance: None,
            repeated: None,
        }
    }
}
