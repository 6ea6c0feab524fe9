//! Metric computations over the store.
//!
//! The exact visitors enumerate; the estimated visitors drive a sampled
//! draw stream into a set of estimator listeners. Listeners freeze on
//! stop: once an estimator's stopping rule fires, its time, call count
//! and estimate no longer move, while the remaining listeners keep
//! consuming draws.

pub(crate) mod confidence;
pub(crate) mod support;

use std::time::Duration;

use rust_decimal::Decimal;

use rulegauge_common::utils::hash::FxHashSet;
use rulegauge_common::{Pair, Result};
use rulegauge_core::{Estimator, EstimatorKind, EstimatorPolicy, ObservationLog};

use crate::metric::EstimatedMetric;

/// One estimator plus its frozen-on-stop accounting.
struct Listener {
    estimator: Box<dyn Estimator>,
    elapsed: Duration,
    matching_calls: u64,
    stopped: bool,
}

/// The estimator listeners of one estimated computation, sharing a
/// single observation log.
pub(crate) struct Recorder {
    listeners: Vec<Listener>,
    log: ObservationLog,
    positives: FxHashSet<Pair>,
}

impl Recorder {
    pub fn new(kinds: &[EstimatorKind], policy: &EstimatorPolicy) -> Result<Self> {
        let listeners = kinds
            .iter()
            .map(|kind| {
                Ok(Listener {
                    estimator: kind.build(policy)?,
                    elapsed: Duration::ZERO,
                    matching_calls: 0,
                    stopped: false,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            listeners,
            log: ObservationLog::new(),
            positives: FxHashSet::default(),
        })
    }

    /// Reinitializes every listener for a stream over `total` items.
    pub fn reset(&mut self, total: u64) {
        self.log.reset();
        self.positives.clear();

        for listener in &mut self.listeners {
            listener.estimator.reset(total);
            listener.elapsed = Duration::ZERO;
            listener.matching_calls = 0;
            listener.stopped = false;
        }
    }

    /// True while at least one listener keeps drawing.
    pub fn any_active(&self) -> bool {
        self.listeners.iter().any(|l| !l.stopped)
    }

    /// True if an active listener needs the per-draw selection weight.
    pub fn needs_probability(&self) -> bool {
        self.listeners
            .iter()
            .any(|l| !l.stopped && l.estimator.requires_probability())
    }

    /// Feeds a successful draw to every active listener. The weight is
    /// logged even when unused, keeping log indices aligned with the
    /// success counters.
    pub fn success(&mut self, pair: Pair, weight: Decimal) {
        self.log.record_success(pair, weight);
        for listener in &mut self.listeners {
            if !listener.stopped {
                listener.estimator.record_success(&self.log);
            }
        }
    }

    /// Feeds a failed draw to every active listener.
    pub fn failure(&mut self) {
        for listener in &mut self.listeners {
            if !listener.stopped {
                listener.estimator.record_failure();
            }
        }
    }

    /// Remembers a known head pair seen while sampling.
    pub fn positive(&mut self, pair: Pair) {
        self.positives.insert(pair);
    }

    pub fn positive_count(&self) -> u64 {
        self.positives.len() as u64
    }

    /// Bills matcher calls to the active listeners.
    pub fn add_calls(&mut self, calls: u64) {
        for listener in &mut self.listeners {
            if !listener.stopped {
                listener.matching_calls += calls;
            }
        }
    }

    /// Bills a matching-time segment to the active listeners.
    pub fn add_time(&mut self, elapsed: Duration) {
        for listener in &mut self.listeners {
            if !listener.stopped {
                listener.elapsed += elapsed;
            }
        }
    }

    /// Bills a probability-time segment to the active listeners that
    /// asked for the weight.
    pub fn add_probability_time(&mut self, elapsed: Duration) {
        for listener in &mut self.listeners {
            if !listener.stopped && listener.estimator.requires_probability() {
                listener.elapsed += elapsed;
            }
        }
    }

    /// Evaluates the stopping rules, freezing listeners whose rule
    /// fired.
    pub fn refresh_stops(&mut self) {
        for listener in &mut self.listeners {
            if !listener.stopped && listener.estimator.within_limit() {
                listener.stopped = true;
            }
        }
    }

    /// Final per-estimator outcomes.
    pub fn finish(&self) -> Vec<EstimatedMetric> {
        self.listeners
            .iter()
            .map(|listener| EstimatedMetric {
                kind: listener.estimator.kind(),
                value: listener.estimator.estimate(&self.log),
                elapsed: listener.elapsed,
                matching_calls: listener.matching_calls,
                report: listener.estimator.report(&self.log),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frozen_listener_ignores_later_draws() {
        // A one-item population stops after the first draw.
        let kinds = [EstimatorKind::Binomial, EstimatorKind::Chao2];
        let mut recorder = Recorder::new(&kinds, &EstimatorPolicy::default()).unwrap();
        recorder.reset(1);

        recorder.success(Pair::from((1, 2)), Decimal::ONE);
        recorder.add_calls(5);
        recorder.refresh_stops();
        assert!(!recorder.any_active());

        recorder.add_calls(100);
        recorder.add_time(Duration::from_secs(1));

        for metric in recorder.finish() {
            assert_eq!(metric.matching_calls, 5);
            assert_eq!(metric.elapsed, Duration::ZERO);
        }
    }

    #[test]
    fn test_probability_time_only_bills_weighted_estimators() {
        let kinds = [EstimatorKind::Binomial, EstimatorKind::HorvitzThompsonWith];
        let mut recorder = Recorder::new(&kinds, &EstimatorPolicy::default()).unwrap();
        recorder.reset(100);

        assert!(recorder.needs_probability());
        recorder.add_probability_time(Duration::from_millis(10));

        let metrics = recorder.finish();
        assert_eq!(metrics[0].elapsed, Duration::ZERO);
        assert_eq!(metrics[1].elapsed, Duration::from_millis(10));
    }
}
