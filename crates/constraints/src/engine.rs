//! The constraint filter engine

use crate::state::LayerQueryState;
use crate::store::RuleStore;
use crate::types::{RuleKind, UserContext};
use crate::ConstraintResult;
use layerguard_core::ConstraintsConfig;
use std::fmt;
use std::sync::Arc;

/// Composes per-user, per-layer constraint rules onto a query snapshot.
///
/// The engine is stateless apart from its store handle, so one instance can
/// serve every request. It never retries and never logs lookup failures;
/// those go straight back to the caller.
#[derive(Clone)]
pub struct ConstraintFilterEngine {
    store: Arc<dyn RuleStore>,
    subset_string_rules: bool,
    expression_rules: bool,
}

impl ConstraintFilterEngine {
    /// Create an engine with both rule kinds enabled
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self {
            store,
            subset_string_rules: true,
            expression_rules: true,
        }
    }

    /// Take the per-kind switches from configuration.
    ///
    /// The switches only affect [`apply_all`](Self::apply_all); the per-kind
    /// operations always run when called directly.
    pub fn with_config(mut self, config: &ConstraintsConfig) -> Self {
        self.subset_string_rules = config.subset_string_rules;
        self.expression_rules = config.expression_rules;
        self
    }

    /// Whether `apply_all` runs rules of this kind
    pub fn is_enabled(&self, kind: RuleKind) -> bool {
        match kind {
            RuleKind::SubsetString => self.subset_string_rules,
            RuleKind::Expression => self.expression_rules,
        }
    }

    /// Apply the rule of `kind` for (`user`, `layer_id`) to `state`.
    ///
    /// With no applicable rule the returned snapshot equals the input.
    pub fn apply(
        &self,
        kind: RuleKind,
        user: &UserContext,
        layer_id: &str,
        state: &LayerQueryState,
    ) -> ConstraintResult<LayerQueryState> {
        match kind {
            RuleKind::SubsetString => self.apply_subset_string_filter(user, layer_id, state),
            RuleKind::Expression => self.apply_expression_filter(user, layer_id, state),
        }
    }

    /// AND the user's subset string rule onto the layer subset string
    pub fn apply_subset_string_filter(
        &self,
        user: &UserContext,
        layer_id: &str,
        state: &LayerQueryState,
    ) -> ConstraintResult<LayerQueryState> {
        self.compose_rule(RuleKind::SubsetString, user, layer_id, state)
    }

    /// AND the user's expression rule onto the feature request expression
    pub fn apply_expression_filter(
        &self,
        user: &UserContext,
        layer_id: &str,
        state: &LayerQueryState,
    ) -> ConstraintResult<LayerQueryState> {
        self.compose_rule(RuleKind::Expression, user, layer_id, state)
    }

    /// Apply every enabled rule kind, subset strings first
    pub fn apply_all(
        &self,
        user: &UserContext,
        layer_id: &str,
        state: &LayerQueryState,
    ) -> ConstraintResult<LayerQueryState> {
        let mut current = state.clone();
        for kind in RuleKind::ALL {
            if self.is_enabled(kind) {
                current = self.apply(kind, user, layer_id, &current)?;
            }
        }
        Ok(current)
    }

    fn compose_rule(
        &self,
        kind: RuleKind,
        user: &UserContext,
        layer_id: &str,
        state: &LayerQueryState,
    ) -> ConstraintResult<LayerQueryState> {
        let definition = self
            .store
            .get_rule_definition_for_user(user, layer_id, kind)?;

        match definition {
            Some(rule) if !rule.is_empty() => {
                let next = state.restricted(kind, &rule);
                tracing::debug!(
                    layer = layer_id,
                    kind = %kind,
                    user = %user.username,
                    "Applied constraint rule"
                );
                Ok(next)
            }
            _ => {
                tracing::trace!(layer = layer_id, kind = %kind, "No constraint rule applies");
                Ok(state.clone())
            }
        }
    }
}

impl fmt::Debug for ConstraintFilterEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintFilterEngine")
            .field("subset_string_rules", &self.subset_string_rules)
            .field("expression_rules", &self.expression_rules)
            .finish_non_exhaustive()
    }
}
