//! The metric engine entry point.

use std::sync::Arc;

use rulegauge_common::{Error, Pair, Result, VarId};
use rulegauge_core::{EstimatorKind, Rule, TripleStore};

use crate::config::{ApproximationConfig, ConfidenceMode};
use crate::metric::{EstimatedPcaConfidence, EstimatedSupport, Exact, PcaConfidence, Support};
use crate::visitor;

/// Computes exact and estimated rule metrics over one store.
///
/// Every computation builds its own planner, matcher, sampler and
/// observation log, so an engine can be shared and called repeatedly
/// without cross-talk between runs.
pub struct MetricEngine {
    store: Arc<TripleStore>,
}

impl MetricEngine {
    /// Creates an engine over a shared store.
    #[must_use]
    pub fn new(store: Arc<TripleStore>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &TripleStore {
        &self.store
    }

    /// Exact support via full head-pair enumeration.
    #[must_use]
    pub fn exact_support(&self, rule: &Rule) -> Exact<Support> {
        visitor::support::exact(&self.store, rule)
    }

    /// Estimated support via sampled head-pair draws. A known prior
    /// success, when given, is consumed as the first draw.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `kinds` is empty, an estimator
    /// disagrees with the configured replacement mode, or the policy is
    /// invalid.
    pub fn estimated_support(
        &self,
        rule: &Rule,
        config: &ApproximationConfig,
        kinds: &[EstimatorKind],
        known: Option<Pair>,
    ) -> Result<EstimatedSupport> {
        validate_kinds(kinds, config)?;
        visitor::support::estimated(&self.store, rule, config, kinds, known)
    }

    /// Exact PCA complement via nested corrupted-side enumeration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `corrupt` is not an endpoint of the
    /// rule head.
    pub fn exact_pca_confidence(&self, rule: &Rule, corrupt: VarId) -> Result<Exact<PcaConfidence>> {
        visitor::confidence::exact(&self.store, rule, corrupt)
    }

    /// Estimated PCA complement, in full-pair or beam mode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] under the same conditions as
    /// [`Self::estimated_support`], or if `corrupt` is not an endpoint
    /// of the rule head.
    pub fn estimated_pca_confidence(
        &self,
        rule: &Rule,
        corrupt: VarId,
        mode: ConfidenceMode,
        config: &ApproximationConfig,
        kinds: &[EstimatorKind],
    ) -> Result<EstimatedPcaConfidence> {
        validate_kinds(kinds, config)?;
        visitor::confidence::estimated(&self.store, rule, corrupt, mode, config, kinds)
    }
}

fn validate_kinds(kinds: &[EstimatorKind], config: &ApproximationConfig) -> Result<()> {
    if kinds.is_empty() {
        return Err(Error::config("no estimators configured"));
    }

    for kind in kinds {
        if kind.with_replacement() != config.with_replacement {
            return Err(Error::config(format!(
                "estimator {kind:?} expects draws {} replacement",
                if kind.with_replacement() { "with" } else { "without" }
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rulegauge_common::AtomId;
    use rulegauge_core::{Atom, Pattern, TripleStoreBuilder};

    fn engine() -> MetricEngine {
        let store = TripleStoreBuilder::new().add_triple(1, "p", 2).build();
        MetricEngine::new(Arc::new(store))
    }

    fn unit_rule() -> Rule {
        let pattern = Pattern::new(vec![Atom::new(0, "p", VarId::new(0), VarId::new(1))]);
        Rule::new(pattern, AtomId::new(0)).unwrap()
    }

    #[test]
    fn test_empty_estimator_list_rejected() {
        let engine = engine();
        let config = ApproximationConfig::default();

        let result = engine.estimated_support(&unit_rule(), &config, &[], None);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_replacement_mismatch_rejected() {
        let engine = engine();
        let config = ApproximationConfig::default().with_replacement(false);

        let result =
            engine.estimated_support(&unit_rule(), &config, &[EstimatorKind::Binomial], None);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
