//! Session token filter backend

use super::{FilterBackend, FilterContext};
use crate::session::SessionTokenStore;
use crate::state::LayerQueryState;
use crate::types::RuleKind;
use crate::ConstraintResult;
use std::fmt;
use std::sync::Arc;

/// Applies the expression saved under the request's filter token
#[derive(Clone)]
pub struct SessionTokenFilter {
    store: Arc<dyn SessionTokenStore>,
}

impl SessionTokenFilter {
    pub fn new(store: Arc<dyn SessionTokenStore>) -> Self {
        Self { store }
    }
}

impl fmt::Debug for SessionTokenFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionTokenFilter").finish_non_exhaustive()
    }
}

impl FilterBackend for SessionTokenFilter {
    fn apply_filter(
        &self,
        ctx: &FilterContext<'_>,
        state: LayerQueryState,
    ) -> ConstraintResult<LayerQueryState> {
        let Some(token) = ctx.filter_token else {
            return Ok(state);
        };

        match self.store.expression_for(token, ctx.user, ctx.layer_id)? {
            Some(expression) => {
                tracing::debug!(layer = ctx.layer_id, "Applied session token filter");
                Ok(state.restricted(RuleKind::Expression, &expression))
            }
            None => Ok(state),
        }
    }

    fn name(&self) -> &'static str {
        "SessionTokenFilter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionTokenStore;
    use crate::types::UserContext;
    use crate::ConstraintError;

    #[test]
    fn test_token_expression_is_anded_onto_request() {
        let mut store = InMemorySessionTokenStore::new();
        let token = store.create_token("1");
        store
            .add_layer_filter(token, "countries", "NAME_IT = 'Albania'")
            .unwrap();
        let filter = SessionTokenFilter::new(Arc::new(store));

        let user = UserContext::new("1", "admin01");
        let token = token.to_string();
        let ctx = FilterContext::new(&user, "countries").with_filter_token(&token);

        let state = filter
            .apply_filter(&ctx, LayerQueryState::new().with_filter_expression("\"POP\" > 10"))
            .unwrap();
        assert_eq!(
            state.filter_expression.as_deref(),
            Some("(\"POP\" > 10) AND (NAME_IT = 'Albania')")
        );
    }

    #[test]
    fn test_without_token_passes_through() {
        let filter = SessionTokenFilter::new(Arc::new(InMemorySessionTokenStore::new()));
        let user = UserContext::new("1", "admin01");
        let state = LayerQueryState::new().with_subset_string("a = 1");

        let result = filter
            .apply_filter(&FilterContext::new(&user, "countries"), state.clone())
            .unwrap();
        assert_eq!(result, state);
    }

    #[test]
    fn test_unknown_token_is_an_error() {
        let filter = SessionTokenFilter::new(Arc::new(InMemorySessionTokenStore::new()));
        let user = UserContext::new("1", "admin01");
        let ctx = FilterContext::new(&user, "countries")
            .with_filter_token("5f0c6a3e-1d4b-4c1e-9a57-2b8e0f6d9c11");

        assert!(matches!(
            filter.apply_filter(&ctx, LayerQueryState::new()),
            Err(ConstraintError::UnknownSessionToken { .. })
        ));
    }
}
