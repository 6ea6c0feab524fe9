//! Stopping rules and point estimates over success/failure draw streams.
//!
//! Every estimator consumes the same stream of draws: a success appends
//! a (pair, weight) observation to the shared [`ObservationLog`], a
//! failure only advances the counters. [`Estimator::within_limit`] is
//! the stopping rule; [`Estimator::estimate`] the current point estimate
//! of the true total. Estimators evaluating one stream share the log but
//! own their counters, so one can stop while the others keep drawing.
//!
//! Construction goes through [`EstimatorKind::build`], keyed by the
//! estimator kind and parameterized by an [`EstimatorPolicy`].

mod anyburl;
mod frequency;
mod log;
mod probability;
mod report;
mod scale;
mod statistical;

pub use log::ObservationLog;
pub use report::EstimatorReport;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rulegauge_common::{Error, Result};

use anyburl::AnyBurlEstimator;
use frequency::{FrequencyEstimator, FrequencyFormula};
use probability::{ProbabilityEstimator, ProbabilityFormula};
use scale::ScaleUpEstimator;

/// Draw counters shared by every estimator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCounts {
    /// Total draws consumed (successes plus failures).
    pub n: u64,
    /// Successful draws.
    pub successes: u64,
    /// Failed draws.
    pub failures: u64,
    /// Population size of the current stream.
    pub total: u64,
}

impl DrawCounts {
    pub(crate) fn success(&mut self) {
        self.successes += 1;
        self.n += 1;
    }

    pub(crate) fn failure(&mut self) {
        self.failures += 1;
        self.n += 1;
    }

    pub(crate) fn reset(&mut self, total: u64) {
        *self = Self {
            total,
            ..Self::default()
        };
    }
}

/// Statistical stopping criterion for the sampled draw loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoppingRule {
    /// `n >= (eps + 2) * ln(2 / delta) / eps^2`.
    Chernoff,
    /// `n >= z^2 * 0.25 / eps^2`, the worst-case Bernoulli variance.
    CentralLimitTheorem,
    /// Stop once the t-based margin of error drops below `eps * mean`.
    ConfidenceInterval,
}

/// Accuracy/confidence policy shared by the statistical estimators.
///
/// `confidence` is the significance level delta: 0.05 asks for a 95%
/// guarantee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EstimatorPolicy {
    /// Relative accuracy epsilon.
    pub accuracy: f64,
    /// Significance level delta.
    pub confidence: f64,
    /// Stopping criterion.
    pub stopping: StoppingRule,
    /// Draws required before any stopping rule may fire (clamped to the
    /// population size).
    pub min_samples: u64,
}

impl Default for EstimatorPolicy {
    fn default() -> Self {
        Self {
            accuracy: 0.1,
            confidence: 0.05,
            stopping: StoppingRule::ConfidenceInterval,
            min_samples: 30,
        }
    }
}

impl EstimatorPolicy {
    /// Creates the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relative accuracy epsilon.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Sets the significance level delta.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Sets the stopping criterion.
    #[must_use]
    pub fn with_stopping(mut self, stopping: StoppingRule) -> Self {
        self.stopping = stopping;
        self
    }

    /// Sets the minimum number of draws.
    #[must_use]
    pub fn with_min_samples(mut self, min_samples: u64) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.accuracy > 0.0 && self.accuracy.is_finite()) {
            return Err(Error::config(format!(
                "accuracy must be positive, got {}",
                self.accuracy
            )));
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(Error::config(format!(
                "confidence must be in (0, 1), got {}",
                self.confidence
            )));
        }

        Ok(())
    }
}

/// The available estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstimatorKind {
    /// Bernoulli scale-up, with replacement.
    Binomial,
    /// Bernoulli scale-up, without replacement.
    Hypergeometric,
    /// Capture-recapture on singleton/doubleton counts.
    Chao1,
    /// Chao1 with the `(n - 1) / n` bias correction.
    Chao2,
    /// Sample-coverage scale-up.
    Coverage,
    /// Order-5 jackknife over the occurrence histogram.
    Jackknife,
    /// Poisson occupancy scale-up.
    Poisson,
    /// Mean of inverse selection weights, with replacement.
    HansenHurwitz,
    /// Sum of inverse inclusion probabilities, with replacement.
    HorvitzThompsonWith,
    /// Sum of inverse inclusion probabilities, without replacement.
    HorvitzThompsonWithout,
    /// Hajek variant of Horvitz-Thompson, with replacement.
    HajekWith,
    /// Hajek variant of Horvitz-Thompson, without replacement.
    HajekWithout,
    /// Non-statistical repeated-pair streak heuristic.
    AnyBurl,
}

impl EstimatorKind {
    /// Whether this estimator expects draws with replacement.
    #[must_use]
    pub fn with_replacement(self) -> bool {
        !matches!(
            self,
            Self::Hypergeometric | Self::HorvitzThompsonWithout | Self::HajekWithout
        )
    }

    /// Whether this estimator needs per-draw selection weights.
    #[must_use]
    pub fn requires_probability(self) -> bool {
        matches!(
            self,
            Self::HansenHurwitz
                | Self::HorvitzThompsonWith
                | Self::HorvitzThompsonWithout
                | Self::HajekWith
                | Self::HajekWithout
        )
    }

    /// The default estimator set for a replacement mode.
    #[must_use]
    pub fn defaults_for(replacement: bool) -> Vec<Self> {
        if replacement {
            vec![
                Self::Binomial,
                Self::Chao2,
                Self::Coverage,
                Self::HansenHurwitz,
                Self::HorvitzThompsonWith,
                Self::Poisson,
            ]
        } else {
            vec![Self::Hypergeometric, Self::HorvitzThompsonWithout]
        }
    }

    /// Builds an estimator of this kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid policy.
    pub fn build(self, policy: &EstimatorPolicy) -> Result<Box<dyn Estimator>> {
        Ok(match self {
            Self::Binomial => Box::new(ScaleUpEstimator::new(policy, true)?),
            Self::Hypergeometric => Box::new(ScaleUpEstimator::new(policy, false)?),
            Self::Chao1 => Box::new(FrequencyEstimator::new(policy, FrequencyFormula::Chao1)?),
            Self::Chao2 => Box::new(FrequencyEstimator::new(policy, FrequencyFormula::Chao2)?),
            Self::Coverage => {
                Box::new(FrequencyEstimator::new(policy, FrequencyFormula::Coverage)?)
            }
            Self::Jackknife => {
                Box::new(FrequencyEstimator::new(policy, FrequencyFormula::Jackknife)?)
            }
            Self::Poisson => Box::new(FrequencyEstimator::new(policy, FrequencyFormula::Poisson)?),
            Self::HansenHurwitz => Box::new(ProbabilityEstimator::new(
                policy,
                ProbabilityFormula::HansenHurwitz,
                true,
            )?),
            Self::HorvitzThompsonWith => Box::new(ProbabilityEstimator::new(
                policy,
                ProbabilityFormula::HorvitzThompson,
                true,
            )?),
            Self::HorvitzThompsonWithout => Box::new(ProbabilityEstimator::new(
                policy,
                ProbabilityFormula::HorvitzThompson,
                false,
            )?),
            Self::HajekWith => Box::new(ProbabilityEstimator::new(
                policy,
                ProbabilityFormula::Hajek,
                true,
            )?),
            Self::HajekWithout => Box::new(ProbabilityEstimator::new(
                policy,
                ProbabilityFormula::Hajek,
                false,
            )?),
            Self::AnyBurl => Box::new(AnyBurlEstimator::new()),
        })
    }
}

/// Common contract of every estimator over one draw stream.
pub trait Estimator {
    /// The kind this estimator was built as.
    fn kind(&self) -> EstimatorKind;

    /// Current draw counters.
    fn counts(&self) -> DrawCounts;

    /// Consumes a successful draw. The observation was already appended
    /// to `log`.
    fn record_success(&mut self, log: &ObservationLog);

    /// Consumes a failed draw.
    fn record_failure(&mut self);

    /// The stopping rule: true once enough draws were consumed.
    fn within_limit(&self) -> bool;

    /// Current point estimate of the true total.
    fn estimate(&self, log: &ObservationLog) -> Decimal;

    /// Must match the sampling engine's replacement mode.
    fn with_replacement(&self) -> bool;

    /// Whether the costly per-draw selection weight must be computed.
    fn requires_probability(&self) -> bool;

    /// Reinitializes for a fresh stream over `total` population items.
    fn reset(&mut self, total: u64);

    /// Diagnostics for external reporting.
    fn report(&self, log: &ObservationLog) -> EstimatorReport;
}
