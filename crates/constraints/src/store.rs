//! Rule storage: the lookup side of constraint filtering

use crate::types::{ConstraintRule, RuleKind, RuleSubject, SingleLayerConstraint, UserContext};
use crate::{ConstraintError, ConstraintResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Read-side access to constraint rules.
///
/// Implementations return `Ok(None)` when no rule applies and an error only
/// when the store itself cannot answer.
pub trait RuleStore: Send + Sync {
    /// Resolve the effective rule text of `kind` for `user` on `layer_id`
    fn get_rule_definition_for_user(
        &self,
        user: &UserContext,
        layer_id: &str,
        kind: RuleKind,
    ) -> ConstraintResult<Option<String>>;
}

/// In-memory rule store, loadable from YAML/JSON fixtures
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleStore {
    constraints: BTreeMap<u64, SingleLayerConstraint>,
    rules: BTreeMap<u64, ConstraintRule>,
}

impl InMemoryRuleStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a constraint
    pub fn add_constraint(&mut self, constraint: SingleLayerConstraint) {
        self.constraints.insert(constraint.id, constraint);
    }

    /// Remove a constraint together with its rules
    pub fn remove_constraint(&mut self, constraint_id: u64) -> Option<SingleLayerConstraint> {
        let removed = self.constraints.remove(&constraint_id)?;
        self.rules.retain(|_, rule| rule.constraint_id != constraint_id);
        Some(removed)
    }

    /// Toggle a constraint on or off
    pub fn set_constraint_active(&mut self, constraint_id: u64, active: bool) -> ConstraintResult<()> {
        let constraint = self
            .constraints
            .get_mut(&constraint_id)
            .ok_or(ConstraintError::UnknownConstraint { constraint_id })?;
        constraint.active = active;
        Ok(())
    }

    /// Add or replace a rule. The owning constraint must already exist.
    pub fn add_rule(&mut self, rule: ConstraintRule) -> ConstraintResult<()> {
        if !self.constraints.contains_key(&rule.constraint_id) {
            return Err(ConstraintError::UnknownConstraint {
                constraint_id: rule.constraint_id,
            });
        }
        self.rules.insert(rule.id, rule);
        Ok(())
    }

    /// Remove a rule
    pub fn remove_rule(&mut self, rule_id: u64) -> Option<ConstraintRule> {
        self.rules.remove(&rule_id)
    }

    /// Get a constraint by id
    pub fn constraint(&self, constraint_id: u64) -> Option<&SingleLayerConstraint> {
        self.constraints.get(&constraint_id)
    }

    /// All constraints on a layer, active or not
    pub fn constraints_for_layer(&self, layer_id: &str) -> Vec<&SingleLayerConstraint> {
        self.constraints
            .values()
            .filter(|c| c.layer_id == layer_id)
            .collect()
    }

    /// All rules of a constraint, in id order
    pub fn rules_for_constraint(&self, constraint_id: u64) -> Vec<&ConstraintRule> {
        self.rules
            .values()
            .filter(|r| r.constraint_id == constraint_id)
            .collect()
    }

    /// Layers that carry at least one constraint
    pub fn layers(&self) -> BTreeSet<&str> {
        self.constraints.values().map(|c| c.layer_id.as_str()).collect()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Rules of `kind` that apply to `user` on `layer_id`, in id order.
    ///
    /// Only rules of active constraints count, and blank rules are skipped.
    pub fn active_rules_for_user(
        &self,
        user: &UserContext,
        layer_id: &str,
        kind: RuleKind,
    ) -> Vec<&ConstraintRule> {
        self.rules
            .values()
            .filter(|rule| rule.kind == kind && !rule.is_blank() && rule.subject.matches(user))
            .filter(|rule| {
                self.constraints
                    .get(&rule.constraint_id)
                    .is_some_and(|c| c.active && c.layer_id == layer_id)
            })
            .collect()
    }

    /// Build a store from a parsed fixture.
    ///
    /// Ids must be unique within a fixture; a repeated constraint or rule id is
    /// rejected instead of replacing the earlier entry.
    pub fn from_fixture(fixture: RuleFixture) -> ConstraintResult<Self> {
        let mut store = Self::new();
        for constraint in fixture.constraints {
            if store.constraints.contains_key(&constraint.id) {
                return Err(ConstraintError::DuplicateId {
                    entity: "constraint",
                    id: constraint.id,
                });
            }
            store.add_constraint(constraint);
        }
        for entry in fixture.rules {
            if store.rules.contains_key(&entry.id) {
                return Err(ConstraintError::DuplicateId {
                    entity: "rule",
                    id: entry.id,
                });
            }
            store.add_rule(entry.into_rule()?)?;
        }
        Ok(store)
    }

    /// Parse a YAML fixture
    pub fn from_yaml_str(content: &str) -> ConstraintResult<Self> {
        Self::from_fixture(serde_yaml::from_str(content)?)
    }

    /// Parse a JSON fixture
    pub fn from_json_str(content: &str) -> ConstraintResult<Self> {
        Self::from_fixture(serde_json::from_str(content)?)
    }

    /// Load a fixture file; `.json` files are parsed as JSON, anything else as YAML
    pub fn load_file(path: impl AsRef<Path>) -> ConstraintResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let store = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_yaml_str(&content)?,
        };

        tracing::debug!(
            path = %path.display(),
            constraints = store.constraint_count(),
            rules = store.rule_count(),
            "Loaded constraint rules"
        );
        Ok(store)
    }
}

impl RuleStore for InMemoryRuleStore {
    fn get_rule_definition_for_user(
        &self,
        user: &UserContext,
        layer_id: &str,
        kind: RuleKind,
    ) -> ConstraintResult<Option<String>> {
        let rules = self.active_rules_for_user(user, layer_id, kind);
        let definition = match rules.as_slice() {
            [] => None,
            [single] => Some(single.rule.clone()),
            many => Some(
                many.iter()
                    .map(|rule| format!("({})", rule.rule))
                    .collect::<Vec<_>>()
                    .join(" AND "),
            ),
        };
        Ok(definition)
    }
}

/// On-disk fixture layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFixture {
    #[serde(default)]
    pub constraints: Vec<SingleLayerConstraint>,

    #[serde(default)]
    pub rules: Vec<RuleFixtureEntry>,
}

/// A rule as written in a fixture: exactly one of `user` or `group`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFixtureEntry {
    pub id: u64,
    pub constraint: u64,
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<FixtureId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub rule: String,
}

/// User ids may be written as numbers or strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for FixtureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixtureId::Number(n) => write!(f, "{}", n),
            FixtureId::Text(s) => f.write_str(s),
        }
    }
}

impl RuleFixtureEntry {
    fn into_rule(self) -> ConstraintResult<ConstraintRule> {
        let subject = match (self.user, self.group) {
            (Some(user), None) => RuleSubject::User(user.to_string()),
            (None, Some(group)) => RuleSubject::Group(group),
            (Some(_), Some(_)) => {
                return Err(ConstraintError::malformed_rule(
                    self.id,
                    "rule has both `user` and `group`",
                ))
            }
            (None, None) => {
                return Err(ConstraintError::malformed_rule(
                    self.id,
                    "rule needs a `user` or a `group`",
                ))
            }
        };
        Ok(ConstraintRule::new(
            self.id,
            self.constraint,
            subject,
            self.kind,
            self.rule,
        ))
    }
}
