//! Exact and estimated PCA confidence.
//!
//! The PCA complement counts corrupted head pairs, known head pairs
//! excluded, under which the body still matches. The derived query is
//! the rule body plus a fresh head atom whose corrupted endpoint is the
//! reserved free variable; its selectivities get the full refinement
//! pass before planning.

use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::time::Instant;

use rand::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;

use rulegauge_common::utils::hash::FxHashSet;
use rulegauge_common::{EntityId, Pair, Result, VarId};
use rulegauge_core::{candidate_pairs, Atom, Binding, EstimatorKind, JoinPlanner, Matcher, Rule, Sampler, TripleStore};

use super::Recorder;
use crate::config::{ApproximationConfig, ConfidenceMode, SampleSelection};
use crate::metric::{EstimatedPcaConfidence, Exact, PcaConfidence};

/// Matcher-call ceiling per full-pair draw; a draw that exhausts it
/// without a match counts as a failure.
const MAX_MATCHING_CALLS: u64 = 100_000;

fn sorted_candidates(planner: &JoinPlanner<'_>, var: VarId) -> Vec<EntityId> {
    let mut candidates: Vec<EntityId> = planner
        .variable_candidates(var, &Binding::default())
        .into_iter()
        .collect();
    candidates.sort_unstable();
    candidates
}

/// Nested corrupted-side enumeration with head-pair exclusion.
pub(crate) fn exact(store: &TripleStore, rule: &Rule, corrupt: VarId) -> Result<Exact<PcaConfidence>> {
    let start = Instant::now();

    let (pattern, _) = rule.pca_query(corrupt)?;
    let mut planner = JoinPlanner::new(store, &pattern);
    planner.refine_selectivities()?;
    planner.recompute_variable_sizes();

    let head = rule.head();
    let (x, y) = (head.source, head.target);
    let x_candidates = sorted_candidates(&planner, x);
    let y_candidates = sorted_candidates(&planner, y);

    let grounded: FxHashSet<VarId> = [x, y].into_iter().collect();
    let order = planner.order_for(&grounded);

    let mut matcher = Matcher::new(store, &pattern, head);
    let mut complement = 0u64;
    let mut positives = 0u64;
    let mut calls = 0u64;

    for &sx in &x_candidates {
        for &sy in &y_candidates {
            if matcher.is_head_candidate(sx, sy) {
                positives += 1;
                continue;
            }

            let mut partial = Binding::default();
            partial.insert(x, sx);
            partial.insert(y, sy);

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
                complement += 1;
            }
        }
    }

    let metric = PcaConfidence {
        complement,
        corrupt,
        positive_pairs: positives,
        matching_calls: calls,
    };
    debug!(
        complement = metric.complement,
        positives = metric.positive_pairs,
        calls = metric.matching_calls,
        "exact pca complement computed"
    );

    Ok(Exact {
        metric,
        elapsed: start.elapsed(),
    })
}

/// Sampled complement estimation, in full-pair or beam mode.
pub(crate) fn estimated(
    store: &TripleStore,
    rule: &Rule,
    corrupt: VarId,
    mode: ConfidenceMode,
    config: &ApproximationConfig,
    kinds: &[EstimatorKind],
) -> Result<EstimatedPcaConfidence> {
    let policy = config.policy();
    let mut recorder = Recorder::new(kinds, &policy)?;

    let (pattern, _) = rule.pca_query(corrupt)?;
    let mut planner = JoinPlanner::new(store, &pattern);
    planner.refine_selectivities()?;
    planner.recompute_variable_sizes();

    let head = rule.head();
    let (x, y) = (head.source, head.target);
    let x_candidates = sorted_candidates(&planner, x);
    let y_candidates = sorted_candidates(&planner, y);

    let total = (x_candidates.len() as u64) * (y_candidates.len() as u64);
    recorder.reset(total);

    let mut matcher = Matcher::new(store, &pattern, head);

    match mode {
        ConfidenceMode::FullPair => {
            let grounded: FxHashSet<VarId> = [x, y].into_iter().collect();
            let order = planner.order_for(&grounded);

            let mut pairs = Vec::with_capacity(x_candidates.len() * y_candidates.len());
            for &sx in &x_candidates {
                for &sy in &y_candidates {
                    pairs.push(Pair::new(sx, sy));
                }
            }

            let mut sampler = match config.seed {
                Some(seed) => Sampler::with_seed(true, config.with_replacement, None, seed),
                None => Sampler::new(true, config.with_replacement, None),
            };
            sampler.init(pairs);

            while recorder.any_active() {
                let Some(pair) = sampler.next_draw() else {
                    break;
                };

                // A known head pair never contributes to the
                // complement; no matching is run for it.
                if matcher.is_head_candidate(pair.subject, pair.object) {
                    recorder.positive(pair);
                    recorder.failure();
                    recorder.refresh_stops();
                    continue;
                }

                let start = Instant::now();
                let mut partial = Binding::default();
                partial.insert(x, pair.subject);
                partial.insert(y, pair.object);

                let found: RefCell<Option<Binding>> = RefCell::new(None);
                matcher.matching(
                    &order,
                    &mut partial,
                    &mut |b| {
                        found.replace(Some(b.clone()));
                    },
                    &mut |atom, pm| candidate_pairs(store, atom, pm),
                    &mut |stats| found.borrow().is_some() || stats.calls >= MAX_MATCHING_CALLS,
                );

                recorder.add_calls(matcher.stats().calls);
                recorder.add_time(start.elapsed());

                match found.into_inner() {
                    Some(binding) => {
                        let weight =
                            compute_weight(&matcher, &planner, &mut recorder, &binding, None);
                        recorder.success(pair, weight);
                    }
                    None => recorder.failure(),
                }

                recorder.refresh_stops();
            }
        }
        ConfidenceMode::Beam(selection) => {
            let order_x = planner.order_for(&[x].into_iter().collect());
            let order_y = planner.order_for(&[y].into_iter().collect());

            let (mut sampler_x, mut sampler_y, mut rng) = match config.seed {
                Some(seed) => (
                    Sampler::with_seed(true, config.with_replacement, None, seed),
                    Sampler::with_seed(true, config.with_replacement, None, seed.wrapping_add(1)),
                    StdRng::seed_from_u64(seed.wrapping_add(2)),
                ),
                None => (
                    Sampler::new(true, config.with_replacement, None),
                    Sampler::new(true, config.with_replacement, None),
                    StdRng::from_entropy(),
                ),
            };
            sampler_x.init(x_candidates);
            sampler_y.init(y_candidates);

            while recorder.any_active() {
                let seeded = match selection {
                    SampleSelection::Minimum => {
                        if planner.variable_size(x) <= planner.variable_size(y) {
                            x
                        } else {
                            y
                        }
                    }
                    SampleSelection::Maximum => {
                        if planner.variable_size(x) <= planner.variable_size(y) {
                            y
                        } else {
                            x
                        }
                    }
                    SampleSelection::Random => {
                        if rng.gen_bool(0.5) {
                            x
                        } else {
                            y
                        }
                    }
                    SampleSelection::Corrupt => corrupt,
                    SampleSelection::NonCorrupt => {
                        if corrupt == x {
                            y
                        } else {
                            x
                        }
                    }
                };

                let (sampler, order) = if seeded == x {
                    (&mut sampler_x, &order_x)
                } else {
                    (&mut sampler_y, &order_y)
                };

                let Some(entity) = sampler.next_draw() else {
                    break;
                };

                let start = Instant::now();
                let mut partial = Binding::default();
                partial.insert(seeded, entity);

                let found: RefCell<Option<Binding>> = RefCell::new(None);
                matcher.matching(
                    order,
                    &mut partial,
                    &mut |b| {
                        found.replace(Some(b.clone()));
                    },
                    &mut |atom, pm| {
                        // One random admissible pair per atom: the beam
                        // descends a single path, never wasting the
                        // draw on a pair the injectivity rule would
                        // discard anyway.
                        let pairs = candidate_pairs(store, atom, pm);
                        let open: Vec<Pair> = pairs
                            .iter()
                            .copied()
                            .filter(|&pair| admissible(atom, pm, pair))
                            .collect();
                        if open.is_empty() {
                            Cow::Owned(Vec::new())
                        } else {
                            let idx = rng.gen_range(0..open.len());
                            Cow::Owned(vec![open[idx]])
                        }
                    },
                    &mut |_| found.borrow().is_some(),
                );

                recorder.add_calls(matcher.stats().calls);
                recorder.add_time(start.elapsed());

                let outcome = found.into_inner().and_then(|binding| {
                    let vx = binding.get(&x).copied()?;
                    let vy = binding.get(&y).copied()?;
                    Some((binding, Pair::new(vx, vy)))
                });

                match outcome {
                    Some((binding, pair)) => {
                        if matcher.is_head_candidate(pair.subject, pair.object) {
                            recorder.positive(pair);
                            recorder.failure();
                        } else {
                            let weight = compute_weight(
                                &matcher,
                                &planner,
                                &mut recorder,
                                &binding,
                                Some(seeded),
                            );
                            recorder.success(pair, weight);
                        }
                    }
                    None => recorder.failure(),
                }

                recorder.refresh_stops();
            }
        }
    }

    debug!(total, positives = recorder.positive_count(), "estimated pca complement computed");

    Ok(EstimatedPcaConfidence {
        corrupt,
        positive_pairs: recorder.positive_count(),
        estimates: recorder.finish(),
    })
}

/// Injectivity pre-check for one beam step: whether binding the free
/// endpoints of `atom` to `pair` would keep the partial binding
/// injective. Mirrors the checks the matcher applies per candidate.
fn admissible(atom: &Atom, partial: &Binding, pair: Pair) -> bool {
    let free_source = !partial.contains_key(&atom.source);
    let free_target = !partial.contains_key(&atom.target);

    if free_source && partial.values().any(|&bound| bound == pair.subject) {
        return false;
    }
    if free_target && partial.values().any(|&bound| bound == pair.object) {
        return false;
    }

    if atom.source == atom.target {
        pair.subject == pair.object
    } else if free_source && free_target {
        pair.subject != pair.object
    } else {
        true
    }
}

fn compute_weight(
    matcher: &Matcher<'_>,
    planner: &JoinPlanner<'_>,
    recorder: &mut Recorder,
    binding: &Binding,
    seeded: Option<VarId>,
) -> Decimal {
    if !recorder.needs_probability() {
        return Decimal::ZERO;
    }

    let begin = Instant::now();
    let weight = matcher.joint_probability(planner, binding, seeded);
    recorder.add_probability_time(begin.elapsed());
    weight
}
