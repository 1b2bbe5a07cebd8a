//! Filter backends and the per-request filter pipeline.
//!
//! Each backend looks at the request context and returns a new
//! [`LayerQueryState`]. The pipeline runs them in order and stops at the
//! first error.

pub mod bbox;
pub mod constraint;
pub mod session;

use crate::engine::ConstraintFilterEngine;
use crate::session::SessionTokenStore;
use crate::state::LayerQueryState;
use crate::types::UserContext;
use crate::ConstraintResult;
use layerguard_core::ConstraintsConfig;
use std::fmt;
use std::sync::Arc;

use self::bbox::BboxFilter;
use self::constraint::{ExpressionConstraintFilter, SubsetStringConstraintFilter};
use self::session::SessionTokenFilter;

/// Per-request inputs the backends read
#[derive(Debug, Clone, Copy)]
pub struct FilterContext<'a> {
    pub user: &'a UserContext,
    pub layer_id: &'a str,
    /// Raw `filtertoken` request parameter
    pub filter_token: Option<&'a str>,
    /// Raw `in_bbox` request parameter
    pub in_bbox: Option<&'a str>,
}

impl<'a> FilterContext<'a> {
    pub fn new(user: &'a UserContext, layer_id: &'a str) -> Self {
        Self {
            user,
            layer_id,
            filter_token: None,
            in_bbox: None,
        }
    }

    pub fn with_filter_token(mut self, token: &'a str) -> Self {
        self.filter_token = Some(token);
        self
    }

    pub fn with_bbox(mut self, bbox: &'a str) -> Self {
        self.in_bbox = Some(bbox);
        self
    }
}

/// A single step of request filtering
pub trait FilterBackend: Send + Sync + fmt::Debug {
    /// Return the state with this backend's restriction applied
    fn apply_filter(
        &self,
        ctx: &FilterContext<'_>,
        state: LayerQueryState,
    ) -> ConstraintResult<LayerQueryState>;

    /// Backend name for debugging
    fn name(&self) -> &'static str {
        "FilterBackend"
    }
}

/// Ordered chain of filter backends
#[derive(Debug, Default, Clone)]
pub struct FilterPipeline {
    backends: Vec<Arc<dyn FilterBackend>>,
}

impl FilterPipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the standard pipeline.
    ///
    /// Order: subset string constraints, expression constraints, session token
    /// filter, bbox filter. Backends disabled in `config` are left out.
    pub fn from_config(
        config: &ConstraintsConfig,
        engine: Arc<ConstraintFilterEngine>,
        sessions: Arc<dyn SessionTokenStore>,
    ) -> Self {
        let mut pipeline = Self::new();

        if config.subset_string_rules {
            pipeline = pipeline.add(SubsetStringConstraintFilter::new(engine.clone()));
        }
        if config.expression_rules {
            pipeline = pipeline.add(ExpressionConstraintFilter::new(engine));
        }
        if config.session_tokens {
            pipeline = pipeline.add(SessionTokenFilter::new(sessions));
        }
        if config.bbox_filter {
            pipeline = pipeline.add(BboxFilter);
        }

        pipeline
    }

    /// Append a backend
    pub fn add<B: FilterBackend + 'static>(mut self, backend: B) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    /// Run every backend in order
    pub fn run(
        &self,
        ctx: &FilterContext<'_>,
        state: LayerQueryState,
    ) -> ConstraintResult<LayerQueryState> {
        let mut current = state;
        for backend in &self.backends {
            current = backend.apply_filter(ctx, current)?;
        }

        tracing::debug!(
            layer = ctx.layer_id,
            backends = self.backends.len(),
            subset_string = ?current.subset_string,
            filter_expression = ?current.filter_expression,
            "Filter pipeline finished"
        );
        Ok(current)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Names of the backends, in run order
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }
}
