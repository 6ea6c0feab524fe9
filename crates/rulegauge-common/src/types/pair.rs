//! The (subject, object) candidate pair.

use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A (subject, object) pair satisfying some predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pair {
    /// The subject entity.
    pub subject: EntityId,
    /// The object entity.
    pub object: EntityId,
}

impl Pair {
    /// Creates a new pair.
    #[must_use]
    pub const fn new(subject: EntityId, object: EntityId) -> Self {
        Self { subject, object }
    }

    /// Returns the pair with subject and object swapped.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self {
            subject: self.object,
            object: self.subject,
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.subject, self.object)
    }
}

impl From<(u32, u32)> for Pair {
    fn from((s, o): (u32, u32)) -> Self {
        Self::new(EntityId(s), EntityId(o))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed() {
        let pair = Pair::from((1, 2));
        assert_eq!(pair.reversed(), Pair::from((2, 1)));
        assert_eq!(pair.reversed().reversed(), pair);
    }
}
