//! Constraint filter error types

use layerguard_core::ConfigError;
use thiserror::Error;

/// Errors raised while resolving or composing constraint filters.
///
/// A missing rule is not an error: it is a pass-through and never shows up here.
#[derive(Debug, Error)]
pub enum ConstraintError {
    /// The rule store could not be read
    #[error("Rule store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// A stored rule cannot be used
    #[error("Malformed rule {rule_id}: {message}")]
    MalformedRule { rule_id: u64, message: String },

    /// A rule references a constraint that does not exist
    #[error("Unknown constraint: {constraint_id}")]
    UnknownConstraint { constraint_id: u64 },

    /// Session filter token is unknown or belongs to another user
    #[error("Unknown session filter token: {token}")]
    UnknownSessionToken { token: String },

    /// `in_bbox` parameter could not be parsed
    #[error("Invalid bbox '{value}': {reason}")]
    InvalidBbox { value: String, reason: String },

    /// Fixture declares the same constraint or rule id twice
    #[error("Duplicate {entity} id: {id}")]
    DuplicateId { entity: &'static str, id: u64 },

    /// Rule fixture could not be parsed
    #[error("Rule fixture error: {message}")]
    Fixture { message: String },

    /// Rule fixture could not be read
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration problem
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ConstraintError {
    /// Get the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            ConstraintError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            ConstraintError::MalformedRule { .. } => "MALFORMED_RULE",
            ConstraintError::UnknownConstraint { .. } => "UNKNOWN_CONSTRAINT",
            ConstraintError::UnknownSessionToken { .. } => "UNKNOWN_SESSION_TOKEN",
            ConstraintError::InvalidBbox { .. } => "INVALID_BBOX",
            ConstraintError::DuplicateId { .. } => "DUPLICATE_ID",
            ConstraintError::Fixture { .. } => "FIXTURE_ERROR",
            ConstraintError::Io { .. } => "IO_ERROR",
            ConstraintError::Config(_) => "CONFIGURATION_ERROR",
        }
    }

    /// Whether the failure comes from rule lookup rather than from request input
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            ConstraintError::StoreUnavailable { .. } | ConstraintError::MalformedRule { .. }
        )
    }

    /// Create a store unavailable error
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Create a malformed rule error
    pub fn malformed_rule(rule_id: u64, message: impl Into<String>) -> Self {
        Self::MalformedRule {
            rule_id,
            message: message.into(),
        }
    }

    /// Create an invalid bbox error
    pub fn invalid_bbox(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBbox {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown session token error
    pub fn unknown_session_token(token: impl Into<String>) -> Self {
        Self::UnknownSessionToken {
            token: token.into(),
        }
    }
}

impl From<std::io::Error> for ConstraintError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ConstraintError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Fixture {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ConstraintError {
    fn from(err: serde_json::Error) -> Self {
        Self::Fixture {
            message: err.to_string(),
        }
    }
}
