//! Core type definitions for Rulegauge.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Identifier types ([`EntityId`], [`VarId`], [`AtomId`])
//! - The candidate pair type ([`Pair`])

mod id;
mod pair;

pub use id::{AtomId, EntityId, VarId};
pub use pair::Pair;
