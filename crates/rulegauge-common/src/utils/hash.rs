//! Fast hashing aliases.
//!
//! All in-memory indices use hashbrown maps with the ahash hasher;
//! these aliases keep call sites short.

use ahash::RandomState;

/// A fast, non-cryptographic hash map.
pub type FxHashMap<K, V> = hashbrown::HashMap<K, V, RandomState>;

/// A fast, non-cryptographic hash set.
pub type FxHashSet<T> = hashbrown::HashSet<T, RandomState>;
