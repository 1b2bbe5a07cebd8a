//! # layerguard-constraints
//!
//! Per-user, per-layer access constraints for published GIS layers.
//!
//! Administrators attach constraint rules to a layer. Each rule is a raw text
//! fragment in one of two dialects: a provider *subset string* (restricts the
//! rows a layer exposes) or a per-feature *filter expression* (possibly
//! spatial). At request time the [`ConstraintFilterEngine`] resolves the rules
//! that apply to the requesting user and ANDs them onto whatever restriction
//! the request already carries. Fragments are never parsed; each side of the
//! AND is parenthesized so precedence cannot leak across the boundary.
//!
//! ```rust
//! use layerguard_constraints::{
//!     ConstraintFilterEngine, ConstraintRule, InMemoryRuleStore, LayerQueryState, RuleKind,
//!     RuleSubject, SingleLayerConstraint, UserContext,
//! };
//! use std::sync::Arc;
//!
//! let mut store = InMemoryRuleStore::new();
//! store.add_constraint(SingleLayerConstraint::new(1, "countries"));
//! store
//!     .add_rule(ConstraintRule::new(
//!         1,
//!         1,
//!         RuleSubject::User("42".to_string()),
//!         RuleKind::SubsetString,
//!         "owner_id = 42",
//!     ))
//!     .unwrap();
//!
//! let engine = ConstraintFilterEngine::new(Arc::new(store));
//! let user = UserContext::new("42", "alice");
//! let state = LayerQueryState::new().with_subset_string("status = 'A'");
//!
//! let state = engine
//!     .apply(RuleKind::SubsetString, &user, "countries", &state)
//!     .unwrap();
//! assert_eq!(
//!     state.subset_string.as_deref(),
//!     Some("(status = 'A') AND (owner_id = 42)")
//! );
//! ```

pub mod engine;
pub mod error;
pub mod filters;
pub mod session;
pub mod state;
pub mod store;
pub mod types;

pub use engine::ConstraintFilterEngine;
pub use error::ConstraintError;
pub use filters::{
    bbox::{Bbox, BboxFilter},
    constraint::{ExpressionConstraintFilter, SubsetStringConstraintFilter},
    session::SessionTokenFilter,
    FilterBackend, FilterContext, FilterPipeline,
};
pub use session::{InMemorySessionTokenStore, SessionLayerFilter, SessionToken, SessionTokenStore};
pub use state::{compose, LayerQueryState};
pub use store::{InMemoryRuleStore, RuleFixture, RuleStore};
pub use types::{ConstraintRule, RuleKind, RuleSubject, SingleLayerConstraint, UserContext};

/// Constraint result type alias
pub type ConstraintResult<T> = Result<T, ConstraintError>;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
