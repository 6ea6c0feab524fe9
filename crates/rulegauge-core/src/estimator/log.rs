//! The shared observation log of sampled pairs and selection weights.

use rust_decimal::Decimal;

use rulegauge_common::utils::hash::FxHashMap;
use rulegauge_common::Pair;

/// Per-computation record of successful draws, shared by every
/// estimator evaluating the same stream.
///
/// Estimators read the log capped at their own success count, so an
/// estimator that stopped early only ever sees the prefix it consumed.
/// The log is owned by one computation and cleared at its start, never
/// reused across computations.
#[derive(Debug, Default)]
pub struct ObservationLog {
    pairs: Vec<Pair>,
    weights: Vec<Decimal>,
    last: Option<Pair>,
}

impl ObservationLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all observations.
    pub fn reset(&mut self) {
        self.pairs.clear();
        self.weights.clear();
        self.last = None;
    }

    /// Appends a successful draw with its selection weight.
    pub fn record_success(&mut self, pair: Pair, weight: Decimal) {
        self.pairs.push(pair);
        self.weights.push(weight);
        self.last = Some(pair);
    }

    /// Occurrence counts of the first `limit` observed pairs.
    #[must_use]
    pub fn pair_counts(&self, limit: u64) -> FxHashMap<Pair, u64> {
        let limit = (limit as usize).min(self.pairs.len());

        let mut counts = FxHashMap::default();
        for pair in &self.pairs[..limit] {
            *counts.entry(*pair).or_insert(0) += 1;
        }

        counts
    }

    /// Selection weights of the first `limit` observations.
    #[must_use]
    pub fn weights(&self, limit: u64) -> &[Decimal] {
        let limit = (limit as usize).min(self.weights.len());
        &self.weights[..limit]
    }

    /// The most recently observed pair.
    #[must_use]
    pub fn last_pair(&self) -> Option<Pair> {
        self.last
    }

    /// Number of recorded observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
