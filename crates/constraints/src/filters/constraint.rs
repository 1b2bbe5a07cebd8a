//! Filter backends backed by constraint rules

use super::{FilterBackend, FilterContext};
use crate::engine::ConstraintFilterEngine;
use crate::state::LayerQueryState;
use crate::ConstraintResult;
use std::sync::Arc;

/// Applies the user's subset string rules to the layer
#[derive(Debug, Clone)]
pub struct SubsetStringConstraintFilter {
    engine: Arc<ConstraintFilterEngine>,
}

impl SubsetStringConstraintFilter {
    pub fn new(engine: Arc<ConstraintFilterEngine>) -> Self {
        Self { engine }
    }
}

impl FilterBackend for SubsetStringConstraintFilter {
    fn apply_filter(
        &self,
        ctx: &FilterContext<'_>,
        state: LayerQueryState,
    ) -> ConstraintResult<LayerQueryState> {
        self.engine
            .apply_subset_string_filter(ctx.user, ctx.layer_id, &state)
    }

    fn name(&self) -> &'static str {
        "SubsetStringConstraintFilter"
    }
}

/// Applies the user's expression rules to the feature request
#[derive(Debug, Clone)]
pub struct ExpressionConstraintFilter {
    engine: Arc<ConstraintFilterEngine>,
}

impl ExpressionConstraintFilter {
    pub fn new(engine: Arc<ConstraintFilterEngine>) -> Self {
        Self { engine }
    }
}

impl FilterBackend for ExpressionConstraintFilter {
    fn apply_filter(
        &self,
        ctx: &FilterContext<'_>,
        state: LayerQueryState,
    ) -> ConstraintResult<LayerQueryState> {
        self.engine
            .apply_expression_filter(ctx.user, ctx.layer_id, &state)
    }

    fn name(&self) -> &'static str {
        "ExpressionConstraintFilter"
    }
}
