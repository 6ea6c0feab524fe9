//! Selectivity estimation and join-order planning.
//!
//! The planner turns a pattern plus a set of grounded variables into an
//! evaluation order for the backtracking matcher. Atom selectivities
//! start at the predicate's candidate-pair count; a PCA-confidence query
//! additionally runs [`JoinPlanner::refine_selectivities`], which
//! tightens each atom against the subject/object indices of every
//! touching atom.
//!
//! The greedy order minimizes `selectivity * gamma^(2*connections +
//! grounded)` with `gamma = selectivity / (N * (N - 1))`, which biases
//! toward atoms that extend the current partial match instead of opening
//! a disjoint component. Ties break on the lowest atom id.

use smallvec::SmallVec;
use tracing::debug;

use rulegauge_common::utils::hash::{FxHashMap, FxHashSet};
use rulegauge_common::{AtomId, EntityId, Error, Result, VarId};

use crate::pattern::{Atom, Binding, Pattern};
use crate::store::TripleStore;

/// The sequence in which pattern atoms are evaluated during matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOrder {
    atoms: SmallVec<[AtomId; 8]>,
}

impl JoinOrder {
    /// Returns the atom ids in evaluation order.
    #[must_use]
    pub fn atoms(&self) -> &[AtomId] {
        &self.atoms
    }

    /// Number of atoms in the order.
    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// True if the order is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// Per-pattern selectivity state and join-order computation.
pub struct JoinPlanner<'a> {
    store: &'a TripleStore,
    pattern: &'a Pattern,
    atom_sizes: FxHashMap<AtomId, u64>,
    variable_sizes: FxHashMap<VarId, u64>,
    total_entities: u64,
}

impl<'a> JoinPlanner<'a> {
    /// Creates a planner with base selectivities (predicate pair counts)
    /// and per-variable candidate-set sizes.
    #[must_use]
    pub fn new(store: &'a TripleStore, pattern: &'a Pattern) -> Self {
        let atom_sizes = pattern
            .atoms()
            .iter()
            .map(|a| (a.id, store.predicate_size(&a.predicate)))
            .collect();

        let mut planner = Self {
            store,
            pattern,
            atom_sizes,
            variable_sizes: FxHashMap::default(),
            total_entities: store.entity_count(),
        };

        for &v in pattern.vertices() {
            let size = planner.variable_candidates(v, &Binding::default()).len() as u64;
            planner.variable_sizes.insert(v, size);
        }

        planner
    }

    /// Returns the pattern this planner was built for.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        self.pattern
    }

    /// Returns the current selectivity of an atom.
    #[must_use]
    pub fn atom_size(&self, id: AtomId) -> u64 {
        self.atom_sizes.get(&id).copied().unwrap_or(0)
    }

    /// Returns the candidate-set size of a variable.
    #[must_use]
    pub fn variable_size(&self, var: VarId) -> u64 {
        self.variable_sizes.get(&var).copied().unwrap_or(0)
    }

    /// Tightens every atom's selectivity by intersecting its candidate
    /// pairs against the subject/object indices of each touching atom.
    /// Covers the four source/target adjacency cases in both directions
    /// plus the reversed-pair case for parallel opposite atoms.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if a touching atom falls under no
    /// adjacency case, which would indicate a planner bug.
    pub fn refine_selectivities(&mut self) -> Result<()> {
        for atom in self.pattern.atoms() {
            let (u, up) = (atom.source, atom.target);

            let mut entries: FxHashSet<_> = self
                .store
                .candidates_set(&atom.predicate)
                .cloned()
                .unwrap_or_default();

            for touching in self.pattern.atoms() {
                if touching.id == atom.id || !(touching.touches(u) || touching.touches(up)) {
                    continue;
                }

                let (tu, tup) = (touching.source, touching.target);
                let mut checked = false;

                if tu == u && tup != up {
                    checked = true;

                    // Subjects must also be subjects of the touching atom.
                    match self.store.all_subjects(&touching.predicate) {
                        Some(valid) => entries.retain(|p| valid.contains(&p.subject)),
                        None => entries.clear(),
                    }
                } else if tu != u && tup == up {
                    checked = true;

                    match self.store.all_objects(&touching.predicate) {
                        Some(valid) => entries.retain(|p| valid.contains(&p.object)),
                        None => entries.clear(),
                    }
                } else if tu == u && tup == up {
                    checked = true;

                    // Parallel atoms: pairs must satisfy both predicates.
                    match self.store.candidates_set(&touching.predicate) {
                        Some(other) => entries.retain(|p| other.contains(p)),
                        None => entries.clear(),
                    }
                }

                if tup == u && tu != up {
                    checked = true;

                    match self.store.all_objects(&touching.predicate) {
                        Some(valid) => entries.retain(|p| valid.contains(&p.subject)),
                        None => entries.clear(),
                    }
                } else if tup != u && tu == up {
                    checked = true;

                    match self.store.all_subjects(&touching.predicate) {
                        Some(valid) => entries.retain(|p| valid.contains(&p.object)),
                        None => entries.clear(),
                    }
                } else if tup == u && tu == up {
                    checked = true;

                    // Opposite parallel atoms: the reversed pair must
                    // satisfy the touching predicate.
                    match self.store.candidates_set(&touching.predicate) {
                        Some(other) => entries.retain(|p| other.contains(&p.reversed())),
                        None => entries.clear(),
                    }
                }

                if !checked {
                    return Err(Error::internal(format!(
                        "no adjacency case for atom {} touching {}",
                        touching.id, atom.id
                    )));
                }
            }

            debug!(atom = %atom.id, size = entries.len(), "refined selectivity");
            self.atom_sizes.insert(atom.id, entries.len() as u64);
        }

        Ok(())
    }

    /// Recomputes candidate-set sizes for the non-synthetic variables,
    /// typically after [`Self::refine_selectivities`].
    pub fn recompute_variable_sizes(&mut self) {
        for &v in self.pattern.vertices() {
            if v.is_synthetic() {
                continue;
            }

            let size = self.variable_candidates(v, &Binding::default()).len() as u64;
            self.variable_sizes.insert(v, size);
        }
    }

    /// Returns the entities a variable can bind to: the intersection
    /// over its incident atoms of the matching subject/object index,
    /// narrowed through already-bound neighbour endpoints.
    #[must_use]
    pub fn variable_candidates(&self, var: VarId, partial: &Binding) -> FxHashSet<EntityId> {
        let mut all: Option<FxHashSet<EntityId>> = None;

        for atom in self.pattern.edges_of(var) {
            let mut candidates: FxHashSet<EntityId> = FxHashSet::default();

            if atom.source == var {
                candidates = self
                    .store
                    .all_subjects(&atom.predicate)
                    .cloned()
                    .unwrap_or_default();

                if let Some(&bound) = partial.get(&atom.target) {
                    candidates = match self.store.candidates_by_object_set(&atom.predicate, bound)
                    {
                        Some(pairs) => pairs
                            .iter()
                            .map(|p| p.subject)
                            .filter(|s| candidates.contains(s))
                            .collect(),
                        None => FxHashSet::default(),
                    };
                }
            }

            if atom.target == var {
                candidates = self
                    .store
                    .all_objects(&atom.predicate)
                    .cloned()
                    .unwrap_or_default();

                if let Some(&bound) = partial.get(&atom.source) {
                    candidates = match self.store.candidates_by_subject_set(&atom.predicate, bound)
                    {
                        Some(pairs) => pairs
                            .iter()
                            .map(|p| p.object)
                            .filter(|o| candidates.contains(o))
                            .collect(),
                        None => FxHashSet::default(),
                    };
                }
            }

            match all.as_mut() {
                None => all = Some(candidates),
                Some(acc) => acc.retain(|e| candidates.contains(e)),
            }
        }

        all.unwrap_or_default()
    }

    /// Computes the join order for a set of grounded variables.
    ///
    /// Atoms with both endpoints grounded go first, in ascending id
    /// order. The remaining atoms are picked greedily by the discounted
    /// cost; an atom disconnected from the order so far is only picked
    /// once no connected atom remains.
    #[must_use]
    pub fn order_for(&self, grounded: &FxHashSet<VarId>) -> JoinOrder {
        let mut order: SmallVec<[AtomId; 8]> = SmallVec::new();
        let mut with_values: FxHashSet<VarId> = grounded.clone();
        let mut in_order: FxHashSet<VarId> = FxHashSet::default();

        let mut pending: Vec<&Atom> = Vec::with_capacity(self.pattern.len());

        for atom in self.pattern.atoms() {
            if grounded.contains(&atom.source) && grounded.contains(&atom.target) {
                order.push(atom.id);
                in_order.insert(atom.source);
                in_order.insert(atom.target);
                with_values.insert(atom.source);
                with_values.insert(atom.target);
            } else {
                pending.push(atom);
            }
        }

        while !pending.is_empty() {
            let mut next: Option<usize> = None;
            let mut best = f64::INFINITY;

            for (idx, atom) in pending.iter().enumerate() {
                let endpoints: FxHashSet<VarId> =
                    [atom.source, atom.target].into_iter().collect();

                let connections = endpoints.iter().filter(|v| in_order.contains(*v)).count();
                let grounded_count = endpoints
                    .iter()
                    .filter(|v| with_values.contains(*v))
                    .count();

                if !order.is_empty() && connections == 0 && grounded_count == 0 {
                    continue;
                }

                let cost = if connections == 2 || grounded_count == 2 {
                    0.0
                } else {
                    let size = self.atom_size(atom.id) as f64;
                    let denom = if self.total_entities < 2 {
                        0.0
                    } else {
                        (self.total_entities * (self.total_entities - 1)) as f64
                    };
                    let gamma = if denom == 0.0 { 0.0 } else { size / denom };

                    size * gamma.powi((2 * connections + grounded_count) as i32)
                };

                if cost < best {
                    best = cost;
                    next = Some(idx);
                }
            }

            // Every remaining atom is disconnected from the order so
            // far; fall back to the lowest-id one.
            let idx = next.unwrap_or(0);
            let atom = pending.remove(idx);

            order.push(atom.id);
            in_order.insert(atom.source);
            in_order.insert(atom.target);
            with_values.insert(atom.source);
            with_values.insert(atom.target);
        }

        JoinOrder { atoms: order }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TripleStoreBuilder;

    fn v(i: i32) -> VarId {
        VarId::new(i)
    }

    fn grounded(vars: &[i32]) -> FxHashSet<VarId> {
        vars.iter().map(|&i| VarId::new(i)).collect()
    }

    fn chain_store() -> TripleStore {
        let mut builder = TripleStoreBuilder::new();
        // p1 is dense, p2 is sparse, p3 is mid-sized.
        for i in 0..10u32 {
            for j in 0..5u32 {
                builder.add_triple(i, "p1", 100 + j);
            }
        }
        builder.add_triple(0, "p2", 100);
        builder.add_triple(1, "p2", 101);
        for i in 0..10u32 {
            builder.add_triple(100, "p3", 200 + i % 3);
        }
        builder.build()
    }

    fn chain_pattern() -> Pattern {
        // p1(a, b), p2(a, c), p3(b, d)
        Pattern::new(vec![
            Atom::new(0, "p1", v(0), v(1)),
            Atom::new(1, "p2", v(0), v(2)),
            Atom::new(2, "p3", v(1), v(3)),
        ])
    }

    #[test]
    fn test_base_selectivities() {
        let store = chain_store();
        let pattern = chain_pattern();
        let planner = JoinPlanner::new(&store, &pattern);

        assert_eq!(planner.atom_size(AtomId::new(0)), 50);
        assert_eq!(planner.atom_size(AtomId::new(1)), 2);
        assert_eq!(planner.atom_size(AtomId::new(2)), 3);
    }

    #[test]
    fn test_grounded_atoms_first() {
        let store = chain_store();
        let pattern = chain_pattern();
        let planner = JoinPlanner::new(&store, &pattern);

        let order = planner.order_for(&grounded(&[0, 1]));
        assert_eq!(order.atoms()[0], AtomId::new(0));
    }

    #[test]
    fn test_order_is_deterministic() {
        let store = chain_store();
        let pattern = chain_pattern();
        let planner = JoinPlanner::new(&store, &pattern);

        let first = planner.order_for(&grounded(&[0]));
        for _ in 0..10 {
            assert_eq!(planner.order_for(&grounded(&[0])), first);
        }
    }

    #[test]
    fn test_order_stays_connected() {
        let store = chain_store();
        let pattern = chain_pattern();
        let planner = JoinPlanner::new(&store, &pattern);

        let order = planner.order_for(&FxHashSet::default());
        assert_eq!(order.len(), 3);

        // Each atom after the first shares a variable with its
        // predecessors.
        let mut seen: FxHashSet<VarId> = FxHashSet::default();
        for (i, id) in order.atoms().iter().enumerate() {
            let atom = pattern.atom(*id).unwrap();
            if i > 0 {
                assert!(seen.contains(&atom.source) || seen.contains(&atom.target));
            }
            seen.insert(atom.source);
            seen.insert(atom.target);
        }
    }

    #[test]
    fn test_variable_candidates_narrowed_by_binding() {
        let store = chain_store();
        let pattern = chain_pattern();
        let planner = JoinPlanner::new(&store, &pattern);

        // Unbound: a ranges over p1-subjects that also have a p2 edge.
        let unbound = planner.variable_candidates(v(0), &Binding::default());
        assert_eq!(unbound.len(), 2);

        // Binding c = 101 pins a to 1.
        let mut partial = Binding::default();
        partial.insert(v(2), EntityId(101));
        let narrowed = planner.variable_candidates(v(0), &partial);
        assert_eq!(narrowed.len(), 1);
        assert!(narrowed.contains(&EntityId(1)));
    }

    #[test]
    fn test_refine_tightens_selectivity() {
        let mut builder = TripleStoreBuilder::new();
        // q1 pairs share subjects with q2 only for subject 0.
        builder
            .add_triple(0, "q1", 10)
            .add_triple(1, "q1", 11)
            .add_triple(2, "q1", 12)
            .add_triple(0, "q2", 20);
        let store = builder.build();

        // q1(a, b), q2(a, c): only q1 pairs whose subject has a q2 edge
        // survive.
        let pattern = Pattern::new(vec![
            Atom::new(0, "q1", v(0), v(1)),
            Atom::new(1, "q2", v(0), v(2)),
        ]);

        let mut planner = JoinPlanner::new(&store, &pattern);
        assert_eq!(planner.atom_size(AtomId::new(0)), 3);

        planner.refine_selectivities().unwrap();
        assert_eq!(planner.atom_size(AtomId::new(0)), 1);
    }

    #[test]
    fn test_refine_reversed_pair_case() {
        let mut builder = TripleStoreBuilder::new();
        builder
            .add_triple(0, "r1", 1)
            .add_triple(2, "r1", 3)
            .add_triple(1, "r2", 0);
        let store = builder.build();

        // r1(a, b), r2(b, a): r1 pairs must appear reversed in r2.
        let pattern = Pattern::new(vec![
            Atom::new(0, "r1", v(0), v(1)),
            Atom::new(1, "r2", v(1), v(0)),
        ]);

        let mut planner = JoinPlanner::new(&store, &pattern);
        planner.refine_selectivities().unwrap();

        assert_eq!(planner.atom_size(AtomId::new(0)), 1);
        assert_eq!(planner.atom_size(AtomId::new(1)), 1);
    }
}
