//! Session token filters.
//!
//! A user can save per-layer filter expressions under an opaque token and pass
//! the token with later requests (e.g. plot or export calls) to have the saved
//! expression applied on top of any constraint rules.

use crate::types::UserContext;
use crate::{ConstraintError, ConstraintResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Saved expression for one layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLayerFilter {
    pub layer_id: String,
    pub expression: String,
}

/// A filter token and the per-layer expressions saved under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub token: Uuid,
    pub user_id: String,
    pub layers: Vec<SessionLayerFilter>,
}

impl SessionToken {
    /// Create a new token for a user
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            token: Uuid::new_v4(),
            user_id: user_id.into(),
            layers: vec![],
        }
    }

    /// Saved expression for a layer
    pub fn expression_for_layer(&self, layer_id: &str) -> Option<&str> {
        self.layers
            .iter()
            .find(|f| f.layer_id == layer_id)
            .map(|f| f.expression.as_str())
    }

    /// Set the expression for a layer, replacing any earlier one
    pub fn set_layer_filter(&mut self, layer_id: impl Into<String>, expression: impl Into<String>) {
        let layer_id = layer_id.into();
        let expression = expression.into();
        match self.layers.iter_mut().find(|f| f.layer_id == layer_id) {
            Some(existing) => existing.expression = expression,
            None => self.layers.push(SessionLayerFilter {
                layer_id,
                expression,
            }),
        }
    }
}

/// Lookup of saved session filter expressions
pub trait SessionTokenStore: Send + Sync {
    /// Expression saved under `token` for `layer_id`.
    ///
    /// Unknown tokens, and tokens belonging to a different user, are errors.
    /// A valid token without a filter for the layer yields `Ok(None)`.
    fn expression_for(
        &self,
        token: &str,
        user: &UserContext,
        layer_id: &str,
    ) -> ConstraintResult<Option<String>>;
}

/// In-memory session token store
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionTokenStore {
    tokens: HashMap<Uuid, SessionToken>,
}

impl InMemorySessionTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token for a user and return it
    pub fn create_token(&mut self, user_id: impl Into<String>) -> Uuid {
        let token = SessionToken::new(user_id);
        let id = token.token;
        self.tokens.insert(id, token);
        id
    }

    /// Save a layer expression under an existing token
    pub fn add_layer_filter(
        &mut self,
        token: Uuid,
        layer_id: impl Into<String>,
        expression: impl Into<String>,
    ) -> ConstraintResult<()> {
        let session = self
            .tokens
            .get_mut(&token)
            .ok_or_else(|| ConstraintError::unknown_session_token(token.to_string()))?;
        session.set_layer_filter(layer_id, expression);
        Ok(())
    }

    /// Drop a token
    pub fn remove_token(&mut self, token: Uuid) -> Option<SessionToken> {
        self.tokens.remove(&token)
    }

    /// Get a token
    pub fn get(&self, token: Uuid) -> Option<&SessionToken> {
        self.tokens.get(&token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl SessionTokenStore for InMemorySessionTokenStore {
    fn expression_for(
        &self,
        token: &str,
        user: &UserContext,
        layer_id: &str,
    ) -> ConstraintResult<Option<String>> {
        let session = Uuid::parse_str(token.trim())
            .ok()
            .and_then(|id| self.tokens.get(&id))
            .filter(|session| user.id.as_deref() == Some(session.user_id.as_str()))
            .ok_or_else(|| ConstraintError::unknown_session_token(token))?;

        Ok(session
            .expression_for_layer(layer_id)
            .filter(|expr| !expr.is_empty())
            .map(str::to_string))
    }
}
