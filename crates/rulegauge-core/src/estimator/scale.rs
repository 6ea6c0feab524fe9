//! Bernoulli scale-up estimators: Binomial (with replacement) and
//! Hypergeometric (without).

use rust_decimal::Decimal;

use rulegauge_common::Result;

use super::statistical::StatisticalCore;
use super::{DrawCounts, Estimator, EstimatorKind, EstimatorPolicy, EstimatorReport, ObservationLog};

/// Scales the sample success fraction up to the population:
/// `estimate = mean * total`.
pub(crate) struct ScaleUpEstimator {
    core: StatisticalCore,
    replacement: bool,
}

impl ScaleUpEstimator {
    pub fn new(policy: &EstimatorPolicy, replacement: bool) -> Result<Self> {
        Ok(Self {
            core: StatisticalCore::new(policy)?,
            replacement,
        })
    }
}

impl Estimator for ScaleUpEstimator {
    fn kind(&self) -> EstimatorKind {
        if self.replacement {
            EstimatorKind::Binomial
        } else {
            EstimatorKind::Hypergeometric
        }
    }

    fn counts(&self) -> DrawCounts {
        self.core.counts
    }

    fn record_success(&mut self, _log: &ObservationLog) {
        self.core.counts.success();
    }

    fn record_failure(&mut self) {
        self.core.counts.failure();
    }

    fn within_limit(&self) -> bool {
        self.core.within_limit()
    }

    fn estimate(&self, _log: &ObservationLog) -> Decimal {
        self.core.mean() * Decimal::from(self.core.counts.total)
    }

    fn with_replacement(&self) -> bool {
        self.replacement
    }

    fn requires_probability(&self) -> bool {
        false
    }

    fn reset(&mut self, total: u64) {
        self.core.counts.reset(total);
    }

    fn report(&self, log: &ObservationLog) -> EstimatorReport {
        let mut report = EstimatorReport::new(self.kind(), self.estimate(log), self.counts());
        self.core.fill_report(&mut report);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegauge_common::Pair;

    #[test]
    fn test_estimate_scales_mean() {
        let mut est = ScaleUpEstimator::new(&EstimatorPolicy::default(), true).unwrap();
        est.reset(200);

        let log = ObservationLog::new();
        for _ in 0..30 {
            est.record_success(&log);
        }
        for _ in 0..10 {
            est.record_failure();
        }

        // 0.75 * 200 = 150.
        assert_eq!(est.estimate(&log), Decimal::from(150));
    }

    #[test]
    fn test_full_enumeration_recovers_exact_total() {
        let mut est = ScaleUpEstimator::new(&EstimatorPolicy::default(), false).unwrap();
        est.reset(10);

        let mut log = ObservationLog::new();
        for i in 0..7u32 {
            log.record_success(Pair::from((i, i)), Decimal::ONE);
            est.record_success(&log);
        }
        for _ in 0..3 {
            est.record_failure();
        }

        assert!(est.within_limit());
        assert_eq!(est.estimate(&log), Decimal::from(7));
    }
}
