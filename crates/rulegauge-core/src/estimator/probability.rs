//! Unequal-probability estimators driven by the per-draw selection
//! weights recorded alongside each observation.

use rust_decimal::{Decimal, MathematicalOps};

use rulegauge_common::Result;

use super::statistical::StatisticalCore;
use super::{DrawCounts, Estimator, EstimatorKind, EstimatorPolicy, EstimatorReport, ObservationLog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProbabilityFormula {
    HorvitzThompson,
    HansenHurwitz,
    Hajek,
}

/// Weighted estimators over the observation log.
///
/// The logged weight of a draw is the joint candidate count of its
/// binding, i.e. the inverse of the per-draw selection probability.
pub(crate) struct ProbabilityEstimator {
    core: StatisticalCore,
    formula: ProbabilityFormula,
    replacement: bool,
}

impl ProbabilityEstimator {
    pub fn new(
        policy: &EstimatorPolicy,
        formula: ProbabilityFormula,
        replacement: bool,
    ) -> Result<Self> {
        Ok(Self {
            core: StatisticalCore::new(policy)?,
            formula,
            replacement,
        })
    }

    /// Inverse inclusion probability of one observation over `n` draws:
    /// `1 / (1 - (1 - 1/w)^n)`. Any degenerate weight contributes zero.
    fn pi_inverse(weight: Decimal, n: u64) -> Decimal {
        Decimal::ONE
            .checked_div(weight)
            .map(|p| Decimal::ONE - p)
            .and_then(|q| q.checked_powu(n))
            .map(|q| Decimal::ONE - q)
            .and_then(|pi| Decimal::ONE.checked_div(pi))
            .unwrap_or(Decimal::ZERO)
    }
}

impl Estimator for ProbabilityEstimator {
    fn kind(&self) -> EstimatorKind {
        match (self.formula, self.replacement) {
            (ProbabilityFormula::HansenHurwitz, _) => EstimatorKind::HansenHurwitz,
            (ProbabilityFormula::HorvitzThompson, true) => EstimatorKind::HorvitzThompsonWith,
            (ProbabilityFormula::HorvitzThompson, false) => EstimatorKind::HorvitzThompsonWithout,
            (ProbabilityFormula::Hajek, true) => EstimatorKind::HajekWith,
            (ProbabilityFormula::Hajek, false) => EstimatorKind::HajekWithout,
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

    fn estimate(&self, log: &ObservationLog) -> Decimal {
        let n = self.core.counts.n;
        let weights = log.weights(self.core.counts.successes);

        match self.formula {
            ProbabilityFormula::HansenHurwitz => {
                let sum: Decimal = weights.iter().copied().sum();
                sum.checked_div(Decimal::from(n)).unwrap_or(Decimal::ZERO)
            }
            ProbabilityFormula::HorvitzThompson | ProbabilityFormula::Hajek => weights
                .iter()
                .map(|&weight| Self::pi_inverse(weight, n))
                .sum(),
        }
    }

    fn with_replacement(&self) -> bool {
        match self.formula {
            ProbabilityFormula::HansenHurwitz => true,
            _ => self.replacement,
        }
    }

    fn requires_probability(&self) -> bool {
        true
    }

    fn reset(&mut self, total: u64) {
        self.core.counts.reset(total);
    }

    fn report(&self, log: &ObservationLog) -> EstimatorReport {
        let mut report = EstimatorReport::new(self.kind(), self.estimate(log), self.counts());
        self.core.fill_report(&mut report);

        let weights = log.weights(self.core.counts.successes);
        if !weights.is_empty() {
            let count = Decimal::from(weights.len() as u64);
            let sum: Decimal = weights.iter().copied().sum();
            let mean = sum.checked_div(count).unwrap_or(Decimal::ZERO);
            let variance = weights
                .iter()
                .map(|&w| (w - mean) * (w - mean))
                .sum::<Decimal>()
                .checked_div(count)
                .unwrap_or(Decimal::ZERO);

            report.prob_sum = Some(sum);
            report.prob_mean = Some(mean);
            report.prob_variance = Some(variance);
        }

        report
    }
}
