//! # rulegauge-core
//!
//! Core layer for Rulegauge: the predicate-indexed triple store, query
//! patterns, the join planner, the backtracking pattern matcher, the
//! sampling engine, and the statistical-estimator framework.
//!
//! This crate depends only on `rulegauge-common`.
//!
//! ## Modules
//!
//! - [`store`] - Read-only predicate-indexed triple store
//! - [`pattern`] - Query patterns (directed multigraphs of labeled atoms)
//! - [`plan`] - Selectivity estimation and join-order planning
//! - [`matcher`] - Injective backtracking pattern matching
//! - [`sample`] - Index-selection sampling (with/without replacement)
//! - [`estimator`] - Stopping rules and point estimates over draw streams

pub mod estimator;
pub mod matcher;
pub mod pattern;
pub mod plan;
pub mod sample;
pub mod store;

// Re-export commonly used types
pub use estimator::{Estimator, EstimatorKind, EstimatorPolicy, EstimatorReport, ObservationLog, StoppingRule};
pub use matcher::{candidate_pairs, Matcher};
pub use pattern::{Atom, Binding, Pattern, Rule};
pub use plan::{JoinOrder, JoinPlanner};
pub use sample::Sampler;
pub use store::{TripleStore, TripleStoreBuilder};
