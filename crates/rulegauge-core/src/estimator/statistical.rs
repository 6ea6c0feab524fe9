//! Shared state of the statistical estimators: counters, the
//! accuracy/confidence policy, and the three stopping rules.

use rust_decimal::prelude::*;
use rust_decimal::{Decimal, MathematicalOps};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use rulegauge_common::{Error, Result};

use super::{DrawCounts, EstimatorPolicy, EstimatorReport, StoppingRule};

/// Counters plus precomputed stopping bounds, embedded by every
/// statistical estimator.
#[derive(Debug, Clone)]
pub(crate) struct StatisticalCore {
    pub counts: DrawCounts,
    stopping: StoppingRule,
    accuracy: Decimal,
    confidence: f64,
    min_samples: u64,
    chernoff_bound: Decimal,
    clt_bound: u64,
}

impl StatisticalCore {
    /// Validates the policy and precomputes the Chernoff and CLT
    /// sample-size bounds.
    pub fn new(policy: &EstimatorPolicy) -> Result<Self> {
        policy.validate()?;

        let eps = policy.accuracy;
        let delta = policy.confidence;

        let chernoff = (eps + 2.0) * (2.0 / delta).ln() / (eps * eps);

        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| Error::internal(format!("standard normal: {e}")))?;
        let z = normal.inverse_cdf(delta / 2.0).abs();
        let clt = (z * z * 0.25 / (eps * eps)).ceil();

        Ok(Self {
            counts: DrawCounts::default(),
            stopping: policy.stopping,
            accuracy: Decimal::from_f64(eps).unwrap_or_default(),
            confidence: delta,
            min_samples: policy.min_samples,
            chernoff_bound: Decimal::from_f64(chernoff).unwrap_or(Decimal::MAX),
            clt_bound: clt as u64,
        })
    }

    /// The configured stopping rule, with the shared minimum-sample
    /// gate: no rule fires before `min(min_samples, total)` draws, and
    /// every rule fires once the whole population was drawn.
    pub fn within_limit(&self) -> bool {
        if self.counts.n < self.min_samples.min(self.counts.total) {
            return false;
        }
        if self.counts.n == self.counts.total {
            return true;
        }

        match self.stopping {
            StoppingRule::Chernoff => Decimal::from(self.counts.n) >= self.chernoff_bound,
            StoppingRule::CentralLimitTheorem => self.counts.n >= self.clt_bound,
            StoppingRule::ConfidenceInterval => {
                self.margin_of_error() <= self.mean() * self.accuracy
            }
        }
    }

    #[cfg(test)]
    pub fn chernoff_bound(&self) -> Decimal {
        self.chernoff_bound
    }

    #[cfg(test)]
    pub fn clt_bound(&self) -> u64 {
        self.clt_bound
    }

    /// Sample success fraction, treating draws as Bernoulli trials.
    pub fn mean(&self) -> Decimal {
        Decimal::from(self.counts.successes)
            .checked_div(Decimal::from(self.counts.n))
            .unwrap_or(Decimal::ZERO)
    }

    /// Variance of the mean with the finite-population correction
    /// `(N - n) / (N - 1)`.
    pub fn variance(&self) -> Decimal {
        let n = self.counts.n;
        let total = self.counts.total;

        if n <= 1 || total <= 1 {
            return Decimal::ZERO;
        }

        let p = self.mean();
        let spread = p * (Decimal::ONE - p);
        let correction = Decimal::from(total - n)
            .checked_div(Decimal::from(total - 1))
            .unwrap_or(Decimal::ZERO);

        spread
            .checked_div(Decimal::from(n - 1))
            .unwrap_or(Decimal::ZERO)
            * correction
    }

    /// t-based margin of error: `t_{delta/2, n-1} * sqrt(var) / sqrt(n)`.
    pub fn margin_of_error(&self) -> Decimal {
        let n = self.counts.n;
        if n <= 1 {
            return Decimal::ZERO;
        }

        let t = StudentsT::new(0.0, 1.0, (n - 1) as f64)
            .map(|dist| dist.inverse_cdf(self.confidence / 2.0).abs())
            .unwrap_or(0.0);

        let t = Decimal::from_f64(t).unwrap_or_default();
        let sd = self.variance().sqrt().unwrap_or(Decimal::ZERO);
        let sqrt_n = Decimal::from(n).sqrt().unwrap_or(Decimal::ONE);

        (t * sd).checked_div(sqrt_n).unwrap_or(Decimal::ZERO)
    }

    /// Confidence interval on the mean.
    pub fn confidence_interval(&self) -> (Decimal, Decimal) {
        let mean = self.mean();
        let margin = self.margin_of_error();
        (mean - margin, mean + margin)
    }

    /// Fills the statistical fields of a report.
    pub fn fill_report(&self, report: &mut EstimatorReport) {
        let (lower, upper) = self.confidence_interval();

        report.accuracy = Some(self.accuracy);
        report.confidence = Decimal::from_f64(self.confidence);
        report.mean = Some(self.mean());
        report.variance = Some(self.variance());
        report.margin_of_error = Some(self.margin_of_error());
        report.ci_lower = Some(lower);
        report.ci_upper = Some(upper);
    }
}
