//! # Rulegauge
//!
//! Exact and approximate computation of support and PCA confidence for
//! logical rules over a predicate-indexed triple store.
//!
//! Start with [`MetricEngine`]: build a [`TripleStore`] once, wrap it in
//! an `Arc`, and compute metrics for [`Rule`]s against it. Estimated
//! computations are configured with an [`ApproximationConfig`] and a set
//! of [`EstimatorKind`]s that all consume one sampled draw stream.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use rulegauge::{
//!     Atom, AtomId, MetricEngine, Pattern, Rule, TripleStoreBuilder, VarId,
//! };
//!
//! // knows(a, b) <= workswith(a, c), knows(c, b)
//! let store = TripleStoreBuilder::new()
//!     .add_triple(1, "knows", 2)
//!     .add_triple(1, "workswith", 3)
//!     .add_triple(3, "knows", 2)
//!     .build();
//!
//! let (a, b, c) = (VarId::new(0), VarId::new(1), VarId::new(2));
//! let pattern = Pattern::new(vec![
//!     Atom::new(0, "knows", a, b),
//!     Atom::new(1, "workswith", a, c),
//!     Atom::new(2, "knows", c, b),
//! ]);
//! let rule = Rule::new(pattern, AtomId::new(0))?;
//!
//! let engine = MetricEngine::new(Arc::new(store));
//! let support = engine.exact_support(&rule);
//! assert_eq!(support.metric.support, 1);
//! # Ok::<(), rulegauge::Error>(())
//! ```

// Re-export the engine API
pub use rulegauge_engine::{
    pca_confidence, ApproximationConfig, ConfidenceMode, EstimatedMetric, EstimatedPcaConfidence,
    EstimatedSupport, Exact, MetricEngine, PcaConfidence, SampleSelection, Support,
};

// Re-export the core building blocks
pub use rulegauge_core::{
    Atom, Binding, EstimatorKind, EstimatorPolicy, EstimatorReport, Pattern, Rule, Sampler,
    StoppingRule, TripleStore, TripleStoreBuilder,
};

// Re-export the shared identifier and error types
pub use rulegauge_common::{AtomId, EntityId, Error, Pair, Result, VarId};
