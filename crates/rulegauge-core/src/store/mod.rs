//! Read-only predicate-indexed triple store.
//!
//! The store is built once from a batch of (subject, predicate, object)
//! triples and is immutable afterwards, so it can be shared freely across
//! concurrent metric computations behind an `Arc`. Per predicate it keeps
//! the candidate pairs both as a list (for iteration and sampling) and as
//! a set (for membership tests), plus by-subject and by-object multimaps
//! and the sets of all subjects/objects seen with that predicate.
//!
//! A lookup for an unknown predicate or entity is a normal empty result,
//! never an error.

use indexmap::IndexMap;
use rulegauge_common::utils::hash::{FxHashMap, FxHashSet};
use rulegauge_common::{EntityId, Pair};

/// Read-only candidate indices over a set of triples.
pub struct TripleStore {
    /// Number of pairs per predicate.
    predicate_sizes: IndexMap<String, u64>,
    /// All entities, including any registered isolated ones.
    entities: Vec<EntityId>,
    /// Candidate pairs per predicate, in insertion order.
    pairs_list: FxHashMap<String, Vec<Pair>>,
    /// Candidate pairs per predicate, for membership tests.
    pairs_set: FxHashMap<String, FxHashSet<Pair>>,
    /// Pairs grouped by subject, as lists.
    by_subject_list: FxHashMap<String, FxHashMap<EntityId, Vec<Pair>>>,
    /// Pairs grouped by object, as lists.
    by_object_list: FxHashMap<String, FxHashMap<EntityId, Vec<Pair>>>,
    /// Pairs grouped by subject, as sets.
    by_subject_set: FxHashMap<String, FxHashMap<EntityId, FxHashSet<Pair>>>,
    /// Pairs grouped by object, as sets.
    by_object_set: FxHashMap<String, FxHashMap<EntityId, FxHashSet<Pair>>>,
    /// All subjects seen per predicate.
    subjects: FxHashMap<String, FxHashSet<EntityId>>,
    /// All objects seen per predicate.
    objects: FxHashMap<String, FxHashSet<EntityId>>,
}

impl TripleStore {
    /// Returns the candidate pairs of a predicate as a list.
    #[must_use]
    pub fn candidates(&self, predicate: &str) -> &[Pair] {
        self.pairs_list.get(predicate).map_or(&[], Vec::as_slice)
    }

    /// Returns the candidate pairs of a predicate as a set.
    #[must_use]
    pub fn candidates_set(&self, predicate: &str) -> Option<&FxHashSet<Pair>> {
        self.pairs_set.get(predicate)
    }

    /// Returns the candidate pairs with the given subject.
    #[must_use]
    pub fn candidates_by_subject(&self, predicate: &str, subject: EntityId) -> &[Pair] {
        self.by_subject_list
            .get(predicate)
            .and_then(|m| m.get(&subject))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the candidate pairs with the given object.
    #[must_use]
    pub fn candidates_by_object(&self, predicate: &str, object: EntityId) -> &[Pair] {
        self.by_object_list
            .get(predicate)
            .and_then(|m| m.get(&object))
            .map_or(&[], Vec::as_slice)
    }

    /// Returns the candidate pair set with the given subject.
    #[must_use]
    pub fn candidates_by_subject_set(
        &self,
        predicate: &str,
        subject: EntityId,
    ) -> Option<&FxHashSet<Pair>> {
        self.by_subject_set
            .get(predicate)
            .and_then(|m| m.get(&subject))
    }

    /// Returns the candidate pair set with the given object.
    #[must_use]
    pub fn candidates_by_object_set(
        &self,
        predicate: &str,
        object: EntityId,
    ) -> Option<&FxHashSet<Pair>> {
        self.by_object_set
            .get(predicate)
            .and_then(|m| m.get(&object))
    }

    /// Returns all subjects seen with a predicate.
    #[must_use]
    pub fn all_subjects(&self, predicate: &str) -> Option<&FxHashSet<EntityId>> {
        self.subjects.get(predicate)
    }

    /// Returns all objects seen with a predicate.
    #[must_use]
    pub fn all_objects(&self, predicate: &str) -> Option<&FxHashSet<EntityId>> {
        self.objects.get(predicate)
    }

    /// Tests whether a pair satisfies a predicate.
    #[must_use]
    pub fn contains(&self, predicate: &str, pair: Pair) -> bool {
        self.pairs_set
            .get(predicate)
            .is_some_and(|set| set.contains(&pair))
    }

    /// Returns the number of candidate pairs of a predicate.
    #[must_use]
    pub fn predicate_size(&self, predicate: &str) -> u64 {
        self.predicate_sizes.get(predicate).copied().unwrap_or(0)
    }

    /// Iterates over the known predicates in insertion order.
    pub fn predicates(&self) -> impl Iterator<Item = &str> {
        self.predicate_sizes.keys().map(String::as_str)
    }

    /// Returns all known entities.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Returns the total number of entities.
    #[must_use]
    pub fn entity_count(&self) -> u64 {
        self.entities.len() as u64
    }
}

/// Builder for [`TripleStore`]. Collects triples (and optionally isolated
/// entities), then freezes them into the read-only indices.
#[derive(Default)]
pub struct TripleStoreBuilder {
    triples: Vec<(EntityId, String, EntityId)>,
    extra_entities: FxHashSet<EntityId>,
}

impl TripleStoreBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single triple.
    pub fn add_triple(
        &mut self,
        subject: impl Into<EntityId>,
        predicate: impl Into<String>,
        object: impl Into<EntityId>,
    ) -> &mut Self {
        self.triples
            .push((subject.into(), predicate.into(), object.into()));
        self
    }

    /// Registers an entity that may not occur in any triple. Entities
    /// occurring in triples are registered automatically.
    pub fn add_entity(&mut self, entity: impl Into<EntityId>) -> &mut Self {
        self.extra_entities.insert(entity.into());
        self
    }

    /// Builds the read-only store, draining the collected triples.
    #[must_use]
    pub fn build(&mut self) -> TripleStore {
        let mut predicate_sizes: IndexMap<String, u64> = IndexMap::new();
        let mut pairs_list: FxHashMap<String, Vec<Pair>> = FxHashMap::default();
        let mut pairs_set: FxHashMap<String, FxHashSet<Pair>> = FxHashMap::default();
        let mut by_subject_list: FxHashMap<String, FxHashMap<EntityId, Vec<Pair>>> =
            FxHashMap::default();
        let mut by_object_list: FxHashMap<String, FxHashMap<EntityId, Vec<Pair>>> =
            FxHashMap::default();
        let mut by_subject_set: FxHashMap<String, FxHashMap<EntityId, FxHashSet<Pair>>> =
            FxHashMap::default();
        let mut by_object_set: FxHashMap<String, FxHashMap<EntityId, FxHashSet<Pair>>> =
            FxHashMap::default();
        let mut subjects: FxHashMap<String, FxHashSet<EntityId>> = FxHashMap::default();
        let mut objects: FxHashMap<String, FxHashSet<EntityId>> = FxHashMap::default();

        let mut entity_set = std::mem::take(&mut self.extra_entities);

        for (s, p, o) in self.triples.drain(..) {
            let pair = Pair::new(s, o);

            entity_set.insert(s);
            entity_set.insert(o);

            // Duplicate triples collapse into one candidate pair.
            if !pairs_set.entry_ref(&p).or_default().insert(pair) {
                continue;
            }

            *predicate_sizes.entry(p.clone()).or_insert(0) += 1;

            pairs_list.entry_ref(&p).or_default().push(pair);

            by_subject_list
                .entry_ref(&p)
                .or_default()
                .entry(s)
                .or_default()
                .push(pair);
            by_object_list
                .entry_ref(&p)
                .or_default()
                .entry(o)
                .or_default()
                .push(pair);

            by_subject_set
                .entry_ref(&p)
                .or_default()
                .entry(s)
                .or_default()
                .insert(pair);
            by_object_set
                .entry_ref(&p)
                .or_default()
                .entry(o)
                .or_default()
                .insert(pair);

            subjects.entry_ref(&p).or_default().insert(s);
            objects.entry_ref(&p).or_default().insert(o);
        }

        let mut entities: Vec<EntityId> = entity_set.into_iter().collect();
        entities.sort_unstable();

        TripleStore {
            predicate_sizes,
            entities,
            pairs_list,
            pairs_set,
            by_subject_list,
            by_object_list,
            by_subject_set,
            by_object_set,
            subjects,
            objects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> TripleStore {
        let mut builder = TripleStoreBuilder::new();
        builder
            .add_triple(1, "knows", 2)
            .add_triple(1, "knows", 3)
            .add_triple(2, "knows", 3)
            .add_triple(3, "likes", 1)
            .add_entity(9);
        builder.build()
    }

    #[test]
    fn test_candidates() {
        let store = sample_store();

        assert_eq!(store.candidates("knows").len(), 3);
        assert_eq!(store.candidates("likes").len(), 1);
        assert!(store.candidates("missing").is_empty());
    }

    #[test]
    fn test_by_subject_and_object() {
        let store = sample_store();

        assert_eq!(store.candidates_by_subject("knows", EntityId(1)).len(), 2);
        assert_eq!(store.candidates_by_object("knows", EntityId(3)).len(), 2);
        assert!(store.candidates_by_subject("knows", EntityId(9)).is_empty());
    }

    #[test]
    fn test_membership() {
        let store = sample_store();

        assert!(store.contains("knows", Pair::from((1, 2))));
        assert!(!store.contains("knows", Pair::from((2, 1))));
        assert!(!store.contains("missing", Pair::from((1, 2))));
    }

    #[test]
    fn test_subjects_and_objects() {
        let store = sample_store();

        let subjects = store.all_subjects("knows").unwrap();
        assert_eq!(subjects.len(), 2);
        assert!(subjects.contains(&EntityId(1)) && subjects.contains(&EntityId(2)));

        let objects = store.all_objects("knows").unwrap();
        assert_eq!(objects.len(), 2);
    }

    #[test]
    fn test_entities_include_isolated() {
        let store = sample_store();

        assert_eq!(store.entity_count(), 4);
        assert!(store.entities().contains(&EntityId(9)));
    }

    #[test]
    fn test_duplicate_triples_collapse() {
        let mut builder = TripleStoreBuilder::new();
        builder.add_triple(1, "p", 2).add_triple(1, "p", 2);
        let store = builder.build();

        assert_eq!(store.predicate_size("p"), 1);
        assert_eq!(store.candidates("p").len(), 1);
    }
}
