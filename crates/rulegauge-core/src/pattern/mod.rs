//! Query patterns: directed multigraphs of labeled atoms.
//!
//! A [`Pattern`] is the small fixed graph evaluated against the store:
//! vertices are variables, edges are [`Atom`]s labeled with a predicate.
//! A [`Rule`] designates one atom of its pattern as the head. The
//! PCA-confidence query of a rule is derived with [`Rule::pca_query`],
//! which swaps the head for a copy whose corrupted endpoint is the
//! reserved free variable.

use rulegauge_common::utils::hash::FxHashMap;
use rulegauge_common::{AtomId, EntityId, Error, Result, VarId};

/// A labeled directed edge of a query pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Identifier, unique within one pattern.
    pub id: AtomId,
    /// The predicate this atom must satisfy.
    pub predicate: String,
    /// The subject-side variable.
    pub source: VarId,
    /// The object-side variable.
    pub target: VarId,
}

impl Atom {
    /// Creates a new atom.
    #[must_use]
    pub fn new(id: u32, predicate: impl Into<String>, source: VarId, target: VarId) -> Self {
        Self {
            id: AtomId::new(id),
            predicate: predicate.into(),
            source,
            target,
        }
    }

    /// Returns true if `var` is an endpoint of this atom.
    #[must_use]
    pub fn touches(&self, var: VarId) -> bool {
        self.source == var || self.target == var
    }
}

/// A partial or full assignment of pattern variables to entities.
pub type Binding = FxHashMap<VarId, EntityId>;

/// A directed multigraph of atoms over shared variables.
///
/// Atoms are kept sorted by id so that every iteration over the pattern
/// is deterministic.
#[derive(Debug, Clone)]
pub struct Pattern {
    atoms: Vec<Atom>,
    vertices: Vec<VarId>,
}

impl Pattern {
    /// Creates a pattern from a set of atoms.
    #[must_use]
    pub fn new(mut atoms: Vec<Atom>) -> Self {
        atoms.sort_unstable_by_key(|a| a.id);

        let mut vertices: Vec<VarId> = atoms
            .iter()
            .flat_map(|a| [a.source, a.target])
            .collect();
        vertices.sort_unstable();
        vertices.dedup();

        Self { atoms, vertices }
    }

    /// Returns the atoms in ascending id order.
    #[must_use]
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// Looks up an atom by id.
    #[must_use]
    pub fn atom(&self, id: AtomId) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.id == id)
    }

    /// Returns the variables of the pattern, sorted.
    #[must_use]
    pub fn vertices(&self) -> &[VarId] {
        &self.vertices
    }

    /// Iterates over the atoms incident to a variable.
    pub fn edges_of(&self, var: VarId) -> impl Iterator<Item = &Atom> {
        self.atoms.iter().filter(move |a| a.touches(var))
    }

    /// Number of atoms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    /// True if the pattern has no atoms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

/// A rule: a pattern with one atom designated as the head.
///
/// The pattern includes the head atom, so a support computation can
/// evaluate head and body along one join order.
#[derive(Debug, Clone)]
pub struct Rule {
    pattern: Pattern,
    head: AtomId,
}

impl Rule {
    /// Creates a rule over `pattern` with head atom `head`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `head` names no atom of the pattern.
    pub fn new(pattern: Pattern, head: AtomId) -> Result<Self> {
        if pattern.atom(head).is_none() {
            return Err(Error::config(format!(
                "head atom {head} not found in pattern"
            )));
        }

        Ok(Self { pattern, head })
    }

    /// Returns the full pattern, head included.
    #[must_use]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Returns the head atom.
    #[must_use]
    pub fn head(&self) -> &Atom {
        // The constructor verified the head is present.
        self.pattern
            .atoms
            .iter()
            .find(|a| a.id == self.head)
            .unwrap_or(&self.pattern.atoms[0])
    }

    /// Returns the body atoms (everything but the head).
    #[must_use]
    pub fn body(&self) -> Vec<Atom> {
        self.pattern
            .atoms
            .iter()
            .filter(|a| a.id != self.head)
            .cloned()
            .collect()
    }

    /// Derives the PCA-confidence query for this rule: the body plus a
    /// fresh head atom whose `corrupt` endpoint is replaced by the
    /// reserved free variable. Returns the derived pattern and the
    /// fresh head atom.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `corrupt` is not an endpoint of the
    /// head atom.
    pub fn pca_query(&self, corrupt: VarId) -> Result<(Pattern, Atom)> {
        let head = self.head();
        let fresh_id = self
            .pattern
            .atoms
            .iter()
            .map(|a| a.id.0)
            .max()
            .unwrap_or(0)
            + 1;

        let new_head = if corrupt == head.target {
            Atom::new(fresh_id, head.predicate.clone(), head.source, VarId::FREE)
        } else if corrupt == head.source {
            Atom::new(fresh_id, head.predicate.clone(), VarId::FREE, head.target)
        } else {
            return Err(Error::config(format!(
                "variable to corrupt {corrupt} not found in head"
            )));
        };

        let mut atoms = self.body();
        atoms.push(new_head.clone());

        Ok((Pattern::new(atoms), new_head))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: i32) -> VarId {
        VarId::new(i)
    }

    fn triangle_rule() -> Rule {
        // p1(a, b) <= p2(a, c), p3(c, b)
        let pattern = Pattern::new(vec![
            Atom::new(0, "p1", v(0), v(1)),
            Atom::new(1, "p2", v(0), v(2)),
            Atom::new(2, "p3", v(2), v(1)),
        ]);
        Rule::new(pattern, AtomId::new(0)).unwrap()
    }

    #[test]
    fn test_pattern_vertices_sorted() {
        let rule = triangle_rule();
        assert_eq!(rule.pattern().vertices(), &[v(0), v(1), v(2)]);
    }

    #[test]
    fn test_edges_of() {
        let rule = triangle_rule();
        let incident: Vec<u32> = rule.pattern().edges_of(v(2)).map(|a| a.id.0).collect();
        assert_eq!(incident, vec![1, 2]);
    }

    #[test]
    fn test_body_excludes_head() {
        let rule = triangle_rule();
        let body: Vec<u32> = rule.body().iter().map(|a| a.id.0).collect();
        assert_eq!(body, vec![1, 2]);
    }

    #[test]
    fn test_pca_query_corrupts_target() {
        let rule = triangle_rule();
        let (pattern, head) = rule.pca_query(v(1)).unwrap();

        assert_eq!(head.source, v(0));
        assert_eq!(head.target, VarId::FREE);
        assert_eq!(pattern.len(), 3);
        assert!(pattern.vertices().contains(&VarId::FREE));
    }

    #[test]
    fn test_pca_query_corrupts_source() {
        let rule = triangle_rule();
        let (_, head) = rule.pca_query(v(0)).unwrap();

        assert_eq!(head.source, VarId::FREE);
        assert_eq!(head.target, v(1));
    }

    #[test]
    fn test_pca_query_rejects_non_head_variable() {
        let rule = triangle_rule();
        assert!(matches!(rule.pca_query(v(2)), Err(Error::Config(_))));
    }

    #[test]
    fn test_rule_rejects_missing_head() {
        let pattern = Pattern::new(vec![Atom::new(0, "p", v(0), v(1))]);
        assert!(Rule::new(pattern, AtomId::new(9)).is_err());
    }
}
