//! # rulegauge-common
//!
//! Foundation layer for Rulegauge: types, errors, and utilities.
//!
//! This crate provides the fundamental building blocks used by all other
//! Rulegauge crates. It has no internal dependencies and should be kept
//! minimal.
//!
//! ## Modules
//!
//! - [`types`] - Core type definitions (EntityId, VarId, AtomId, Pair)
//! - [`utils`] - Utility functions and helpers (hashing, errors)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod types;
pub mod utils;

// Re-export commonly used types at crate root
pub use types::{AtomId, EntityId, Pair, VarId};
pub use utils::error::{Error, Result};
