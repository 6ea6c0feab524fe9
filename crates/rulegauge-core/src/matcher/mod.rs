//! Injective backtracking pattern matching.
//!
//! [`Matcher::matching`] walks a [`JoinOrder`] and extends a [`Binding`]
//! one atom at a time, backtracking on dead ends. The candidate source
//! and the early-stop predicate are caller-supplied closures, so
//! confidence estimation can substitute a single random admissible pair
//! per atom (beam mode) or cut the search off at a call-count ceiling.
//!
//! The binding stays injective throughout: no two variables are ever
//! mapped to the same entity.

use std::borrow::Cow;

use rust_decimal::Decimal;

use rulegauge_common::utils::hash::FxHashSet;
use rulegauge_common::{EntityId, Pair, VarId};

use crate::pattern::{Atom, Binding, Pattern};
use crate::plan::{JoinOrder, JoinPlanner};
use crate::store::TripleStore;

/// Matching-call and failure counters for one top-level invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Recursive matching calls, the leaf included.
    pub calls: u64,
    /// Levels exhausted without a single admissible candidate.
    pub failures: u64,
}

/// Returns the store pairs consistent with an atom under a partial
/// binding. One of four lookup modes applies: both endpoints unbound
/// (all pairs of the predicate), one bound (by-subject or by-object),
/// both bound (a membership test yielding zero or one pair).
#[must_use]
pub fn candidate_pairs<'s>(
    store: &'s TripleStore,
    atom: &Atom,
    partial: &Binding,
) -> Cow<'s, [Pair]> {
    let subject = partial.get(&atom.source).copied();
    let object = partial.get(&atom.target).copied();

    match (subject, object) {
        (None, None) => Cow::Borrowed(store.candidates(&atom.predicate)),
        (Some(s), None) => Cow::Borrowed(store.candidates_by_subject(&atom.predicate, s)),
        (None, Some(o)) => Cow::Borrowed(store.candidates_by_object(&atom.predicate, o)),
        (Some(s), Some(o)) => {
            let pair = Pair::new(s, o);
            if store.contains(&atom.predicate, pair) {
                Cow::Owned(vec![pair])
            } else {
                Cow::Owned(Vec::new())
            }
        }
    }
}

/// Backtracking matcher over one pattern and join order.
pub struct Matcher<'a> {
    store: &'a TripleStore,
    pattern: &'a Pattern,
    head: &'a Atom,
    stats: MatchStats,
}

impl<'a> Matcher<'a> {
    /// Creates a matcher for a pattern with the given head atom.
    #[must_use]
    pub fn new(store: &'a TripleStore, pattern: &'a Pattern, head: &'a Atom) -> Self {
        Self {
            store,
            pattern,
            head,
            stats: MatchStats::default(),
        }
    }

    /// Counters of the most recent top-level [`Self::matching`] run.
    #[must_use]
    pub fn stats(&self) -> &MatchStats {
        &self.stats
    }

    /// Tests whether `(s, o)` is a known pair of the head predicate.
    #[must_use]
    pub fn is_head_candidate(&self, s: EntityId, o: EntityId) -> bool {
        self.store.contains(&self.head.predicate, Pair::new(s, o))
    }

    /// Runs the backtracking search along `order`, starting from
    /// `partial`. `on_match` fires once per full binding found;
    /// `candidates` supplies the pairs to try per atom; `early_stop` is
    /// checked after every candidate and aborts the search when true.
    ///
    /// Counters reset at each top-level invocation.
    pub fn matching<F, C, E>(
        &mut self,
        order: &JoinOrder,
        partial: &mut Binding,
        on_match: &mut F,
        candidates: &mut C,
        early_stop: &mut E,
    ) where
        F: FnMut(&Binding),
        C: FnMut(&Atom, &Binding) -> Cow<'a, [Pair]>,
        E: FnMut(&MatchStats) -> bool,
    {
        self.stats = MatchStats::default();
        self.matching_at(0, order, partial, on_match, candidates, early_stop);
    }

    fn matching_at<F, C, E>(
        &mut self,
        i: usize,
        order: &JoinOrder,
        partial: &mut Binding,
        on_match: &mut F,
        candidates: &mut C,
        early_stop: &mut E,
    ) where
        F: FnMut(&Binding),
        C: FnMut(&Atom, &Binding) -> Cow<'a, [Pair]>,
        E: FnMut(&MatchStats) -> bool,
    {
        self.stats.calls += 1;

        if i == order.len() {
            on_match(partial);
            return;
        }

        let Some(atom) = self.pattern.atom(order.atoms()[i]) else {
            return;
        };
        let atom = atom.clone();

        let (u, up) = (atom.source, atom.target);
        let replace_u = !partial.contains_key(&u);
        let replace_up = !partial.contains_key(&up);

        // Snapshot of the values bound so far, for the injectivity
        // checks below.
        let values: FxHashSet<EntityId> = partial.values().copied().collect();

        let pairs = candidates(&atom, partial);
        let mut matches = 0u64;

        for &pair in pairs.iter() {
            let (v, vp) = (pair.subject, pair.object);

            if replace_u && values.contains(&v) {
                continue;
            }
            if replace_up && values.contains(&vp) {
                continue;
            }
            // A self-loop atom binds one variable to both endpoints;
            // two distinct unbound endpoints must not collapse onto one
            // entity.
            if u == up {
                if v != vp {
                    continue;
                }
            } else if replace_u && replace_up && v == vp {
                continue;
            }

            matches += 1;

            if replace_u {
                partial.insert(u, v);
            }
            if replace_up && up != u {
                partial.insert(up, vp);
            }

            self.matching_at(i + 1, order, partial, on_match, candidates, early_stop);

            if replace_u {
                partial.remove(&u);
            }
            if replace_up && up != u {
                partial.remove(&up);
            }

            if early_stop(&self.stats) {
                return;
            }
        }

        if matches == 0 {
            self.stats.failures += 1;
        }
    }

    /// Greedy lower bound on the joint candidate count of a completed
    /// match: repeatedly picks the not-yet-accounted atom with the
    /// smallest candidate count given the accounted variables and
    /// multiplies the counts. If the draw was seeded from one variable
    /// (beam mode), the product is divided by that variable's
    /// candidate-set size under the full binding; a zero divisor yields
    /// zero.
    #[must_use]
    pub fn joint_probability(
        &self,
        planner: &JoinPlanner<'_>,
        binding: &Binding,
        seeded: Option<VarId>,
    ) -> Decimal {
        let pattern = planner.pattern();

        // Local per-atom sizes under the full binding.
        let local_size = |atom: &Atom| -> u64 {
            let base = planner.atom_size(atom.id);

            let by_subject = binding.get(&atom.source).map_or(0, |&s| {
                self.store
                    .candidates_by_subject_set(&atom.predicate, s)
                    .map_or(0, |set| set.len() as u64)
            });
            let by_object = binding.get(&atom.target).map_or(0, |&o| {
                self.store
                    .candidates_by_object_set(&atom.predicate, o)
                    .map_or(0, |set| set.len() as u64)
            });

            let source_bound = planner.variable_size(atom.source).saturating_mul(by_subject);
            let target_bound = planner.variable_size(atom.target).saturating_mul(by_object);

            base.min(source_bound).min(target_bound)
        };

        let mut pending: Vec<&Atom> = pattern.atoms().iter().collect();
        let mut accounted = Binding::default();
        let mut product = Decimal::ONE;

        while !pending.is_empty() {
            let mut best_idx = 0;
            let mut best_cost = u64::MAX;

            for (idx, atom) in pending.iter().enumerate() {
                let cost = if !accounted.contains_key(&atom.source)
                    && !accounted.contains_key(&atom.target)
                {
                    local_size(atom)
                } else {
                    candidate_pairs(self.store, atom, &accounted).len() as u64
                };

                if cost < best_cost {
                    best_cost = cost;
                    best_idx = idx;
                }
            }

            product *= Decimal::from(best_cost);

            let atom = pending.remove(best_idx);
            for var in [atom.source, atom.target] {
                if let Some(&value) = binding.get(&var) {
                    accounted.insert(var, value);
                }
            }
        }

        if let Some(var) = seeded {
            let size = planner.variable_candidates(var, binding).len() as u64;
            product = product
                .checked_div(Decimal::from(size))
                .unwrap_or(Decimal::ZERO);
        }

        product
    }
}
