//! Capture-recapture estimators over the occurrence histogram of
//! observed pairs.

use rust_decimal::{Decimal, MathematicalOps};

use rulegauge_common::utils::hash::FxHashMap;
use rulegauge_common::Result;

use super::statistical::StatisticalCore;
use super::{DrawCounts, Estimator, EstimatorKind, EstimatorPolicy, EstimatorReport, ObservationLog};

/// Closed-form species-richness formulas over the occurrence counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrequencyFormula {
    Chao1,
    Chao2,
    Coverage,
    Jackknife,
    Poisson,
}

/// Estimates the number of distinct pairs from how often each observed
/// pair recurred, so it only applies to draws with replacement.
pub(crate) struct FrequencyEstimator {
    core: StatisticalCore,
    formula: FrequencyFormula,
}

/// Occurrence histogram: `frequencies[k]` is the number of distinct
/// pairs seen exactly `k + 1` times.
struct Histogram {
    distinct: u64,
    frequencies: Vec<u64>,
}

impl Histogram {
    fn from_counts(counts: &FxHashMap<rulegauge_common::Pair, u64>) -> Self {
        let mut frequencies: Vec<u64> = Vec::new();
        for &occurrences in counts.values() {
            let slot = occurrences as usize - 1;
            if frequencies.len() <= slot {
                frequencies.resize(slot + 1, 0);
            }
            frequencies[slot] += 1;
        }

        Self {
            distinct: counts.len() as u64,
            frequencies,
        }
    }

    /// Number of pairs observed exactly `k` times.
    fn f(&self, k: usize) -> u64 {
        if k == 0 {
            return 0;
        }
        self.frequencies.get(k - 1).copied().unwrap_or(0)
    }
}

impl FrequencyEstimator {
    pub fn new(policy: &EstimatorPolicy, formula: FrequencyFormula) -> Result<Self> {
        Ok(Self {
            core: StatisticalCore::new(policy)?,
            formula,
        })
    }

    fn evaluate(&self, histogram: &Histogram) -> Decimal {
        let s = Decimal::from(histogram.distinct);
        let f1 = Decimal::from(histogram.f(1));
        let f2 = Decimal::from(histogram.f(2));
        let n = Decimal::from(self.core.counts.n);

        match self.formula {
            FrequencyFormula::Chao1 => {
                // S + f1^2 / (2 * (f2 + 1))
                s + (f1 * f1)
                    .checked_div(Decimal::TWO * (f2 + Decimal::ONE))
                    .unwrap_or(Decimal::ZERO)
            }
            FrequencyFormula::Chao2 => {
                // Chao1 with the (n - 1) / n small-sample correction.
                let correction = (n - Decimal::ONE).checked_div(n).unwrap_or(Decimal::ZERO);
                s + (correction * f1 * f1)
                    .checked_div(Decimal::TWO * (f2 + Decimal::ONE))
                    .unwrap_or(Decimal::ZERO)
            }
            FrequencyFormula::Coverage => {
                // S / C with sample coverage C = 1 - f1 / n.
                let coverage =
                    Decimal::ONE - f1.checked_div(n).unwrap_or(Decimal::ZERO);
                if coverage.is_zero() {
                    return s;
                }
                s.checked_div(coverage).unwrap_or(Decimal::ZERO)
            }
            FrequencyFormula::Jackknife => {
                // Fifth-order jackknife over f1..f5.
                s + Decimal::from(5) * f1 - Decimal::from(10) * f2
                    + Decimal::from(10) * Decimal::from(histogram.f(3))
                    - Decimal::from(5) * Decimal::from(histogram.f(4))
                    + Decimal::from(histogram.f(5))
            }
            FrequencyFormula::Poisson => {
                // S / (1 - exp(-2 * f1 / (f2 + 1)))
                let exponent = (-Decimal::TWO * f1)
                    .checked_div(f2 + Decimal::ONE)
                    .unwrap_or(Decimal::ZERO);
                let denom = match exponent.checked_exp() {
                    Some(value) => Decimal::ONE - value,
                    None => return Decimal::ZERO,
                };
                if denom.is_zero() {
                    return Decimal::ZERO;
                }
                s.checked_div(denom).unwrap_or(Decimal::ZERO)
            }
        }
    }

    fn kind_of(formula: FrequencyFormula) -> EstimatorKind {
        match formula {
            FrequencyFormula::Chao1 => EstimatorKind::Chao1,
            FrequencyFormula::Chao2 => EstimatorKind::Chao2,
            FrequencyFormula::Coverage => EstimatorKind::Coverage,
            FrequencyFormula::Jackknife => EstimatorKind::Jackknife,
            FrequencyFormula::Poisson => EstimatorKind::Poisson,
        }
    }
}

impl Estimator for FrequencyEstimator {
    fn kind(&self) -> EstimatorKind {
        Self::kind_of(self.formula)
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

    fn estimate(&self, log: &ObservationLog) -> Decimal {
        if self.core.counts.successes == 0 {
            return Decimal::ZERO;
        }

        let histogram = Histogram::from_counts(&log.pair_counts(self.core.counts.successes));
        self.evaluate(&histogram)
    }

    fn with_replacement(&self) -> bool {
        true
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

        let histogram = Histogram::from_counts(&log.pair_counts(self.core.counts.successes));
        let mut buckets: Vec<(u64, u64)> = histogram
            .frequencies
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(slot, &count)| (slot as u64 + 1, count))
            .collect();
        buckets.sort_unstable();
        report.histogram = Some(buckets);

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegauge_common::Pair;

    fn observe(est: &mut FrequencyEstimator, log: &mut ObservationLog, pairs: &[(u32, u32)]) {
        for &(s, o) in pairs {
            log.record_success(Pair::from((s, o)), Decimal::ONE);
            est.record_success(log);
        }
    }

    fn build(formula: FrequencyFormula, total: u64) -> FrequencyEstimator {
        let mut est = FrequencyEstimator::new(&EstimatorPolicy::default(), formula).unwrap();
        est.reset(total);
        est
    }

    #[test]
    fn test_chao1_singleton_doubleton() {
        let mut est = build(FrequencyFormula::Chao1, 100);
        let mut log = ObservationLog::new();

        // f1 = 2 (pairs (1,1), (2,2)); f2 = 1 (pair (3,3)).
        observe(&mut est, &mut log, &[(1, 1), (2, 2), (3, 3), (3, 3)]);

        // 3 + 4 / (2 * 2) = 4.
        assert_eq!(est.estimate(&log), Decimal::from(4));
    }

    #[test]
    fn test_chao2_applies_small_sample_correction() {
        let mut est = build(FrequencyFormula::Chao2, 100);
        let mut log = ObservationLog::new();

        observe(&mut est, &mut log, &[(1, 1), (2, 2), (3, 3), (3, 3)]);

        // 3 + (3/4) * 4 / (2 * 2) = 3.75.
        assert_eq!(est.estimate(&log), Decimal::new(375, 2));
    }

    #[test]
    fn test_jackknife_alternating_coefficients() {
        let mut est = build(FrequencyFormula::Jackknife, 100);
        let mut log = ObservationLog::new();

        // f1 = 1, f2 = 1, f3 = 1: S = 3.
        observe(
            &mut est,
            &mut log,
            &[(1, 1), (2, 2), (2, 2), (3, 3), (3, 3), (3, 3)],
        );

        // 3 + 5 - 10 + 10 = 8.
        assert_eq!(est.estimate(&log), Decimal::from(8));
    }

    #[test]
    fn test_coverage_all_singletons_falls_back_to_distinct() {
        let mut est = build(FrequencyFormula::Coverage, 100);
        let mut log = ObservationLog::new();

        // f1 = n, so the coverage denominator collapses to zero.
        observe(&mut est, &mut log, &[(1, 1), (2, 2)]);
        assert_eq!(est.estimate(&log), Decimal::from(2));
    }

    #[test]
    fn test_poisson_scale_up() {
        let mut est = build(FrequencyFormula::Poisson, 100);
        let mut log = ObservationLog::new();

        // f1 = 0, f2 = 1: denominator 1 - exp(0) = 0.
        observe(&mut est, &mut log, &[(1, 1), (1, 1)]);
        assert_eq!(est.estimate(&log), Decimal::ZERO);

        // f1 = 1, f2 = 1: 2 / (1 - exp(-1)).
        observe(&mut est, &mut log, &[(2, 2)]);
        let estimate = est.estimate(&log);
        assert!(estimate > Decimal::from(3) && estimate < Decimal::new(317, 2));
    }

    #[test]
    fn test_zero_successes_estimate_zero() {
        let mut est = build(FrequencyFormula::Chao1, 100);
        let log = ObservationLog::new();

        est.record_failure();
        assert_eq!(est.estimate(&log), Decimal::ZERO);
    }
}
