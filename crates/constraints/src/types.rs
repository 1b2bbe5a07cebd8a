//! Constraint data model: users, constraints and rules

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two rule dialects a constraint can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Provider subset string, restricts which rows a layer exposes
    SubsetString,
    /// Per-feature filter expression, evaluated on the feature request
    Expression,
}

impl RuleKind {
    /// All rule kinds, in the order they are applied
    pub const ALL: [RuleKind; 2] = [RuleKind::SubsetString, RuleKind::Expression];

    /// Stable name used in fixtures and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::SubsetString => "subset_string",
            RuleKind::Expression => "expression",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a rule applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSubject {
    /// A single user, by user id
    User(String),
    /// Every member of a user group, by group name
    Group(String),
}

impl RuleSubject {
    /// Check whether this subject covers the given user
    pub fn matches(&self, user: &UserContext) -> bool {
        match self {
            RuleSubject::User(id) => user.id.as_deref() == Some(id.as_str()),
            RuleSubject::Group(name) => user.in_group(name),
        }
    }
}

/// The requesting principal
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserContext {
    /// User id, `None` for anonymous requests
    pub id: Option<String>,

    /// Username, for logs
    pub username: String,

    /// Groups the user belongs to
    #[serde(default)]
    pub groups: Vec<String>,
}

impl UserContext {
    /// Create an authenticated user context
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            username: username.into(),
            groups: vec![],
        }
    }

    /// Create an anonymous user context
    pub fn anonymous() -> Self {
        Self {
            id: None,
            username: "anonymous".to_string(),
            groups: vec![],
        }
    }

    /// Add a group membership
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        let group = group.into();
        if !self.groups.contains(&group) {
            self.groups.push(group);
        }
        self
    }

    /// Check group membership
    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    pub fn is_anonymous(&self) -> bool {
        self.id.is_none()
    }
}

/// A constraint attached to one layer; rules hang off it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleLayerConstraint {
    /// Unique constraint identifier
    pub id: u64,

    /// Layer the constraint restricts
    #[serde(rename = "layer")]
    pub layer_id: String,

    /// Rules of inactive constraints never apply
    #[serde(default = "default_active")]
    pub active: bool,

    /// Optional admin-facing description
    #[serde(default)]
    pub description: Option<String>,
}

fn default_active() -> bool {
    true
}

impl SingleLayerConstraint {
    /// Create a new active constraint
    pub fn new(id: u64, layer_id: impl Into<String>) -> Self {
        Self {
            id,
            layer_id: layer_id.into(),
            active: true,
            description: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the constraint inactive
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A single rule: a raw text fragment for one subject on one constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRule {
    /// Unique rule identifier, also the composition order
    pub id: u64,

    /// Owning constraint
    pub constraint_id: u64,

    pub subject: RuleSubject,

    pub kind: RuleKind,

    /// Raw predicate text, passed to the query engine untouched
    pub rule: String,
}

impl ConstraintRule {
    /// Create a new rule
    pub fn new(
        id: u64,
        constraint_id: u64,
        subject: RuleSubject,
        kind: RuleKind,
        rule: impl Into<String>,
    ) -> Self {
        Self {
            id,
            constraint_id,
            subject,
            kind,
            rule: rule.into(),
        }
    }

    /// Empty rules are treated as absent
    pub fn is_blank(&self) -> bool {
        self.rule.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_subject_matching() {
        let alice = UserContext::new("42", "alice");
        let bob = UserContext::new("7", "bob");

        let subject = RuleSubject::User("42".to_string());
        assert!(subject.matches(&alice));
        assert!(!subject.matches(&bob));
        assert!(!subject.matches(&UserContext::anonymous()));
    }

    #[test]
    fn test_group_subject_matching() {
        let editor = UserContext::new("42", "alice").with_group("editors");
        let viewer = UserContext::new("7", "bob").with_group("viewers");

        let subject = RuleSubject::Group("editors".to_string());
        assert!(subject.matches(&editor));
        assert!(!subject.matches(&viewer));
    }

    #[test]
    fn test_with_group_is_deduplicated() {
        let user = UserContext::new("1", "admin01")
            .with_group("editors")
            .with_group("editors");
        assert_eq!(user.groups, vec!["editors".to_string()]);
    }

    #[test]
    fn test_blank_rule() {
        let subject = RuleSubject::User("1".to_string());
        assert!(ConstraintRule::new(1, 1, subject.clone(), RuleKind::Expression, "").is_blank());
        assert!(!ConstraintRule::new(2, 1, subject, RuleKind::Expression, "a = 1").is_blank());
    }

    #[test]
    fn test_rule_kind_names() {
        assert_eq!(RuleKind::SubsetString.to_string(), "subset_string");
        assert_eq!(
            serde_json::to_string(&RuleKind::Expression).unwrap(),
            "\"expression\""
        );
    }
}
