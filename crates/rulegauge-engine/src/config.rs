//! Approximation configuration.

use serde::{Deserialize, Serialize};

use rulegauge_core::{EstimatorPolicy, StoppingRule};

/// Which endpoint of the head a beam-mode draw grounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleSelection {
    /// The endpoint with the smaller candidate set.
    Minimum,
    /// The endpoint with the larger candidate set.
    Maximum,
    /// A coin flip per draw.
    Random,
    /// The corrupted endpoint.
    Corrupt,
    /// The endpoint that was not corrupted.
    NonCorrupt,
}

/// How an estimated PCA-confidence computation draws its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfidenceMode {
    /// Draw complete (x, y) endpoint pairs and match the body under
    /// both bindings.
    FullPair,
    /// Ground a single endpoint per draw and walk one random path
    /// through the candidate lists.
    Beam(SampleSelection),
}

/// Sampling and stopping parameters shared by every estimated
/// computation.
///
/// `confidence` is the significance level delta: 0.05 asks for a 95%
/// guarantee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApproximationConfig {
    /// Relative accuracy epsilon.
    pub accuracy: f64,
    /// Significance level delta.
    pub confidence: f64,
    /// Stopping criterion of the statistical estimators.
    pub stopping: StoppingRule,
    /// Draws required before any stopping rule may fire.
    pub min_samples: u64,
    /// Whether draws are taken with replacement. Must agree with every
    /// configured estimator kind.
    pub with_replacement: bool,
    /// Fixed sampler seed; `None` seeds from system entropy.
    pub seed: Option<u64>,
}

impl Default for ApproximationConfig {
    fn default() -> Self {
        Self {
            accuracy: 0.1,
            confidence: 0.05,
            stopping: StoppingRule::ConfidenceInterval,
            min_samples: 30,
            with_replacement: true,
            seed: None,
        }
    }
}

impl ApproximationConfig {
    /// Creates the default configuration.
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

    /// Sets the replacement mode.
    #[must_use]
    pub fn with_replacement(mut self, with_replacement: bool) -> Self {
        self.with_replacement = with_replacement;
        self
    }

    /// Sets a fixed sampler seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// The estimator policy induced by this configuration.
    #[must_use]
    pub fn policy(&self) -> EstimatorPolicy {
        EstimatorPolicy::new()
            .with_accuracy(self.accuracy)
            .with_confidence(self.confidence)
            .with_stopping(self.stopping)
            .with_min_samples(self.min_samples)
    }
}
