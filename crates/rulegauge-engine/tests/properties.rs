//! Property-based invariants of the planner and the matcher.

use proptest::prelude::*;

use rulegauge_common::utils::hash::FxHashSet;
use rulegauge_common::{EntityId, VarId};
use rulegauge_core::{candidate_pairs, Atom, Binding, JoinPlanner, Matcher, Pattern, TripleStore, TripleStoreBuilder};

fn v(i: i32) -> VarId {
    VarId::new(i)
}

/// p(a, b), q(b, c): a three-variable chain.
fn chain_pattern() -> Pattern {
    Pattern::new(vec![
        Atom::new(0, "p", v(0), v(1)),
        Atom::new(1, "q", v(1), v(2)),
    ])
}

fn store_from(triples: &[(u32, bool, u32)]) -> TripleStore {
    let mut builder = TripleStoreBuilder::new();
    for &(s, is_p, o) in triples {
        builder.add_triple(s, if is_p { "p" } else { "q" }, o);
    }
    builder.build()
}

fn arb_triples() -> impl Strategy<Value = Vec<(u32, bool, u32)>> {
    prop::collection::vec((0u32..8, any::<bool>(), 0u32..8), 1..40)
}

proptest! {
    /// Every produced full match binds distinct entities to distinct
    /// variables.
    #[test]
    fn prop_matches_are_injective(triples in arb_triples()) {
        let store = store_from(&triples);
        let pattern = chain_pattern();
        let planner = JoinPlanner::new(&store, &pattern);
        let order = planner.order_for(&FxHashSet::default());

        let head = &pattern.atoms()[0];
        let mut matcher = Matcher::new(&store, &pattern, head);

        let mut bindings: Vec<Binding> = Vec::new();
        let mut partial = Binding::default();
        matcher.matching(
            &order,
            &mut partial,
            &mut |b| bindings.push(b.clone()),
            &mut |atom, pm| candidate_pairs(&store, atom, pm),
            &mut |_| false,
        );

        for binding in &bindings {
            let values: FxHashSet<EntityId> = binding.values().copied().collect();
            prop_assert_eq!(values.len(), binding.len());
        }
    }

    /// Full matches agree with a direct nested-loop enumeration.
    #[test]
    fn prop_match_count_equals_nested_loops(triples in arb_triples()) {
        let store = store_from(&triples);
        let pattern = chain_pattern();
        let planner = JoinPlanner::new(&store, &pattern);
        let order = planner.order_for(&FxHashSet::default());

        let head = &pattern.atoms()[0];
        let mut matcher = Matcher::new(&store, &pattern, head);

        let mut matched = 0u64;
        let mut partial = Binding::default();
        matcher.matching(
            &order,
            &mut partial,
            &mut |_| matched += 1,
            &mut |atom, pm| candidate_pairs(&store, atom, pm),
            &mut |_| false,
        );

        let mut expected = 0u64;
        for &p in store.candidates("p") {
            for &q in store.candidates("q") {
                let (a, b, c) = (p.subject, p.object, q.object);
                if q.subject == b && a != b && b != c && a != c {
                    expected += 1;
                }
            }
        }

        prop_assert_eq!(matched, expected);
    }

    /// The planner is a pure function of store and grounding.
    #[test]
    fn prop_join_order_deterministic(triples in arb_triples(), ground_b in any::<bool>()) {
        let store = store_from(&triples);
        let pattern = chain_pattern();
        let planner = JoinPlanner::new(&store, &pattern);

        let grounded: FxHashSet<VarId> = if ground_b {
            [v(1)].into_iter().collect()
        } else {
            FxHashSet::default()
        };

        let first = planner.order_for(&grounded);
        for _ in 0..5 {
            prop_assert_eq!(&planner.order_for(&grounded), &first);
        }

        // A second planner over the same inputs agrees.
        let other = JoinPlanner::new(&store, &pattern);
        prop_assert_eq!(&other.order_for(&grounded), &first);
    }

    /// Orders cover every atom exactly once and never introduce a
    /// disconnected atom while a connected one remains.
    #[test]
    fn prop_join_order_connected(triples in arb_triples()) {
        let store = store_from(&triples);
        let pattern = chain_pattern();
        let planner = JoinPlanner::new(&store, &pattern);
        let order = planner.order_for(&FxHashSet::default());

        prop_assert_eq!(order.len(), pattern.len());

        let mut seen: FxHashSet<VarId> = FxHashSet::default();
        for (i, id) in order.atoms().iter().enumerate() {
            let atom = pattern.atom(*id).unwrap();
            if i > 0 {
                prop_assert!(seen.contains(&atom.source) || seen.contains(&atom.target));
            }
            seen.insert(atom.source);
            seen.insert(atom.target);
        }
    }
}
