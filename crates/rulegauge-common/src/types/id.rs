//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an entity in the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Creates a new entity id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier of a pattern variable.
///
/// Negative ids are reserved for synthetic variables introduced by the
/// engine itself, such as the free head endpoint of a PCA-confidence
/// query (see [`VarId::FREE`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub i32);

impl VarId {
    /// The reserved free variable used as the resampled head endpoint of
    /// a PCA-confidence query.
    pub const FREE: VarId = VarId(-1);

    /// Creates a new variable id.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns true for engine-introduced synthetic variables.
    #[must_use]
    pub const fn is_synthetic(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl From<i32> for VarId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// Identifier of a pattern atom (edge). Unique within one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AtomId(pub u32);

impl AtomId {
    /// Creates a new atom id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for AtomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}
