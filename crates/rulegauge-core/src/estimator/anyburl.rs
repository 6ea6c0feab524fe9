//! Repeated-pair streak heuristic, a non-statistical stopping rule.

use rust_decimal::Decimal;

use rulegauge_common::utils::hash::FxHashSet;
use rulegauge_common::Pair;

use super::{DrawCounts, Estimator, EstimatorKind, EstimatorReport, ObservationLog};

/// Consecutive repeated draws that end the stream.
const MAX_REPEATED: u64 = 5;
/// New distinct successes that end the stream.
const MAX_DISTINCT: u64 = 1_000;
/// Hard cap on total draws.
const MAX_DRAWS: u64 = 10_000;

/// Draws until a streak of already-seen pairs shows up, then reports
/// the distinct successes seen so far.
///
/// Gives no statistical guarantee; it trades accuracy for very cheap
/// stopping on skewed streams.
pub(crate) struct AnyBurlEstimator {
    counts: DrawCounts,
    repeated: u64,
    seen: FxHashSet<Pair>,
}

impl AnyBurlEstimator {
    pub fn new() -> Self {
        Self {
            counts: DrawCounts::default(),
            repeated: 0,
            seen: FxHashSet::default(),
        }
    }
}

impl Estimator for AnyBurlEstimator {
    fn kind(&self) -> EstimatorKind {
        EstimatorKind::AnyBurl
    }

    fn counts(&self) -> DrawCounts {
        self.counts
    }

    fn record_success(&mut self, log: &ObservationLog) {
        self.counts.success();

        if let Some(pair) = log.last_pair() {
            if self.seen.insert(pair) {
                self.repeated = 0;
            } else {
                self.repeated += 1;
            }
        }
    }

    fn record_failure(&mut self) {
        self.counts.failure();
    }

    fn within_limit(&self) -> bool {
        self.counts.n >= self.counts.total
            || self.repeated >= MAX_REPEATED
            || self.counts.successes.saturating_sub(self.repeated) >= MAX_DISTINCT
            || self.counts.n >= MAX_DRAWS
    }

    fn estimate(&self, _log: &ObservationLog) -> Decimal {
        Decimal::from(self.counts.successes.saturating_sub(self.repeated))
    }

    fn with_replacement(&self) -> bool {
        true
    }

    fn requires_probability(&self) -> bool {
        false
    }

    fn reset(&mut self, total: u64) {
        self.counts.reset(total);
        self.repeated = 0;
        self.seen.clear();
    }

    fn report(&self, log: &ObservationLog) -> EstimatorReport {
        let mut report = EstimatorReport::new(self.kind(), self.estimate(log), self.counts());
        report.repeated = Some(self.repeated);
        report
    }
}
