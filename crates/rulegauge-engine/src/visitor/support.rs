//! Exact and estimated support.
//!
//! Support asks for how many known head pairs the whole pattern (head
//! included) matches. The exact visitor enumerates the head pairs; the
//! estimated visitor samples them and feeds successes/failures to the
//! configured estimators.

use std::cell::{Cell, RefCell};
use std::time::Instant;

use rust_decimal::Decimal;
use tracing::debug;

use rulegauge_common::utils::hash::FxHashSet;
use rulegauge_common::{Pair, Result, VarId};
use rulegauge_core::{candidate_pairs, Atom, Binding, EstimatorKind, JoinOrder, JoinPlanner, Matcher, Rule, Sampler, TripleStore};

use super::Recorder;
use crate::config::ApproximationConfig;
use crate::metric::{EstimatedSupport, Exact, Support};

/// Full head-pair enumeration.
pub(crate) fn exact(store: &TripleStore, rule: &Rule) -> Exact<Support> {
    let start = Instant::now();

    let pattern = rule.pattern();
    let head = rule.head();
    let planner = JoinPlanner::new(store, pattern);
    let grounded: FxHashSet<VarId> = [head.source, head.target].into_iter().collect();
    let order = planner.order_for(&grounded);

    let mut matcher = Matcher::new(store, pattern, head);
    let mut support = 0u64;
    let mut calls = 0u64;

    for &pair in store.candidates(&head.predicate) {
        let mut partial = Binding::default();
        partial.insert(head.source, pair.subject);
        partial.insert(head.target, pair.object);

        let found = Cell::new(false);
        matcher.matching(
            &order,
            &mut partial,
            &mut |_| found.set(true),
            &mut |atom, pm| candidate_pairs(store, atom, pm),
            &mut |_| found.get(),
        );

        calls += matcher.stats().calls;
        if found.get() {
            support += 1;
        }
    }

    let metric = Support {
        support,
        head_size: store.predicate_size(&head.predicate),
        matching_calls: calls,
    };
    debug!(
        support = metric.support,
        head_size = metric.head_size,
        calls = metric.matching_calls,
        "exact support computed"
    );

    Exact {
        metric,
        elapsed: start.elapsed(),
    }
}

/// Sampled head-pair draws into the configured estimators. A known
/// prior success, when given, is consumed as the first draw.
pub(crate) fn estimated(
    store: &TripleStore,
    rule: &Rule,
    config: &ApproximationConfig,
    kinds: &[EstimatorKind],
    known: Option<Pair>,
) -> Result<EstimatedSupport> {
    let policy = config.policy();
    let mut recorder = Recorder::new(kinds, &policy)?;

    let pattern = rule.pattern();
    let head = rule.head();
    let planner = JoinPlanner::new(store, pattern);
    let grounded: FxHashSet<VarId> = [head.source, head.target].into_iter().collect();
    let order = planner.order_for(&grounded);

    let head_pairs: Vec<Pair> = store.candidates(&head.predicate).to_vec();
    let total = head_pairs.len() as u64;
    recorder.reset(total);

    let mut sampler = match config.seed {
        Some(seed) => Sampler::with_seed(true, config.with_replacement, None, seed),
        None => Sampler::new(true, config.with_replacement, None),
    };
    sampler.init(head_pairs);

    let mut matcher = Matcher::new(store, pattern, head);

    if let Some(pair) = known {
        process_draw(store, &mut matcher, &planner, &order, head, &mut recorder, pair);
        recorder.refresh_stops();
    }

    while recorder.any_active() {
        let Some(pair) = sampler.next_draw() else {
            break;
        };

        process_draw(store, &mut matcher, &planner, &order, head, &mut recorder, pair);
        recorder.refresh_stops();
    }

    debug!(total, "estimated support computed");

    Ok(EstimatedSupport {
        head_size: total,
        estimates: recorder.finish(),
    })
}

fn process_draw<'a>(
    store: &'a TripleStore,
    matcher: &mut Matcher<'a>,
    planner: &JoinPlanner<'_>,
    order: &JoinOrder,
    head: &Atom,
    recorder: &mut Recorder,
    pair: Pair,
) {
    let start = Instant::now();

    let mut partial = Binding::default();
    partial.insert(head.source, pair.subject);
    partial.insert(head.target, pair.object);

    let found: RefCell<Option<Binding>> = RefCell::new(None);
    matcher.matching(
        order,
        &mut partial,
        &mut |b| {
            found.replace(Some(b.clone()));
        },
        &mut |atom, pm| candidate_pairs(store, atom, pm),
        &mut |_| found.borrow().is_some(),
    );

    recorder.add_calls(matcher.stats().calls);
    recorder.add_time(start.elapsed());

    match found.into_inner() {
        Some(binding) => {
            let weight = if recorder.needs_probability() {
                let begin = Instant::now();
                let weight = matcher.joint_probability(planner, &binding, None);
                recorder.add_probability_time(begin.elapsed());
                weight
            } else {
                Decimal::ZERO
            };

            recorder.success(pair, weight);
        }
        None => recorder.failure(),
    }
}
