//! Metric result types.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rulegauge_common::VarId;
use rulegauge_core::{EstimatorKind, EstimatorReport};

/// Exact support of a rule: the number of head pairs under which the
/// whole pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Support {
    /// Head pairs with at least one full body match.
    pub support: u64,
    /// Number of known head pairs.
    pub head_size: u64,
    /// Total matcher calls spent.
    pub matching_calls: u64,
}

impl Support {
    /// Support divided by the head size; zero for an empty head.
    #[must_use]
    pub fn head_coverage(&self) -> Decimal {
        Decimal::from(self.support)
            .checked_div(Decimal::from(self.head_size))
            .unwrap_or(Decimal::ZERO)
    }
}

/// Exact PCA complement of a rule: the number of corrupted head pairs,
/// known head pairs excluded, under which the body matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcaConfidence {
    /// Matching corrupted pairs that are not known head pairs.
    pub complement: u64,
    /// The head endpoint that was corrupted.
    pub corrupt: VarId,
    /// Known head pairs encountered (and excluded) along the way.
    pub positive_pairs: u64,
    /// Total matcher calls spent.
    pub matching_calls: u64,
}

impl PcaConfidence {
    /// PCA confidence against a given support:
    /// `support / (support + complement)`, zero when both are zero.
    #[must_use]
    pub fn confidence(&self, support: u64) -> Decimal {
        pca_confidence(Decimal::from(support), Decimal::from(self.complement))
    }
}

/// Combines a support value with a (possibly estimated) complement.
#[must_use]
pub fn pca_confidence(support: Decimal, complement: Decimal) -> Decimal {
    support
        .checked_div(support + complement)
        .unwrap_or(Decimal::ZERO)
}

/// An exactly computed metric with its wall-clock cost.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Exact<M> {
    /// The metric value.
    pub metric: M,
    /// Wall-clock time of the computation.
    pub elapsed: Duration,
}

/// One estimator's outcome within an estimated computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatedMetric {
    /// The estimator that produced this value.
    pub kind: EstimatorKind,
    /// The point estimate at this estimator's stopping point.
    pub value: Decimal,
    /// Time attributable to this estimator, probability segments
    /// included only where it consumed them.
    pub elapsed: Duration,
    /// Matcher calls consumed up to this estimator's stopping point.
    pub matching_calls: u64,
    /// Full diagnostics.
    pub report: EstimatorReport,
}

/// Outcome of an estimated support computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatedSupport {
    /// Number of known head pairs (the sampled population).
    pub head_size: u64,
    /// One outcome per configured estimator.
    pub estimates: Vec<EstimatedMetric>,
}

/// Outcome of an estimated PCA-confidence computation. Estimates are
/// of the complement; combine with a support value via
/// [`pca_confidence`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatedPcaConfidence {
    /// The head endpoint that was corrupted.
    pub corrupt: VarId,
    /// Distinct known head pairs encountered during sampling.
    pub positive_pairs: u64,
    /// One outcome per configured estimator.
    pub estimates: Vec<EstimatedMetric>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_head_coverage() {
        let support = Support {
            support: 3,
            head_size: 4,
            matching_calls: 0,
        };
        assert_eq!(support.head_coverage(), Decimal::new(75, 2));

        let empty = Support {
            support: 0,
            head_size: 0,
            matching_calls: 0,
        };
        assert_eq!(empty.head_coverage(), Decimal::ZERO);
    }

    #[test]
    fn test_confidence_zero_guard() {
        let pca = PcaConfidence {
            complement: 0,
            corrupt: VarId::new(1),
            positive_pairs: 0,
            matching_calls: 0,
        };
        assert_eq!(pca.confidence(0), Decimal::ZERO);
        assert_eq!(pca.confidence(5), Decimal::ONE);
    }

    #[test]
    fn test_confidence_ratio() {
        let pca = PcaConfidence {
            complement: 6,
            corrupt: VarId::new(1),
            positive_pairs: 0,
            matching_calls: 0,
        };
        assert_eq!(pca.confidence(2), Decimal::new(25, 2));
    }
}
