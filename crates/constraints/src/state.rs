//! Query restriction snapshots and the composition routine

use crate::types::RuleKind;
use serde::{Deserialize, Serialize};

/// Compose an extra restriction onto an existing one.
///
/// A present, non-empty `existing` yields `"(existing) AND (extra)"`; otherwise
/// `extra` is returned verbatim. Neither side is parsed.
pub fn compose(existing: Option<&str>, extra: &str) -> String {
    match existing {
        Some(current) if !current.is_empty() => format!("({}) AND ({})", current, extra),
        _ => extra.to_string(),
    }
}

/// Snapshot of the restrictions carried by a layer and its feature request.
///
/// Callers copy the fields onto their own layer/request handles; the engine
/// only ever returns new snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerQueryState {
    /// Layer subset string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset_string: Option<String>,

    /// Feature request filter expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
}

impl LayerQueryState {
    /// Unrestricted state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subset_string(mut self, subset_string: impl Into<String>) -> Self {
        self.subset_string = Some(subset_string.into());
        self
    }

    pub fn with_filter_expression(mut self, expression: impl Into<String>) -> Self {
        self.filter_expression = Some(expression.into());
        self
    }

    /// Current restriction for a rule kind
    pub fn restriction(&self, kind: RuleKind) -> Option<&str> {
        match kind {
            RuleKind::SubsetString => self.subset_string.as_deref(),
            RuleKind::Expression => self.filter_expression.as_deref(),
        }
    }

    /// Return a new snapshot with `extra` ANDed onto the field for `kind`
    pub fn restricted(&self, kind: RuleKind, extra: &str) -> Self {
        let composed = compose(self.restriction(kind), extra);
        let mut next = self.clone();
        match kind {
            RuleKind::SubsetString => next.subset_string = Some(composed),
            RuleKind::Expression => next.filter_expression = Some(composed),
        }
        next
    }

    /// No restriction of either kind is present
    pub fn is_unrestricted(&self) -> bool {
        RuleKind::ALL
            .iter()
            .all(|kind| self.restriction(*kind).map_or(true, str::is_empty))
    }
}
