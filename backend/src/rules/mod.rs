//! Declarative rules.
//!
//! Rules describe expectations on a field ("email must contain @") together
//! with what a reviewer should do about violations. They are inert: nothing
//! in the engine executes them against data. They exist to be listed,
//! toggled, deleted and exported as a manifest.
//!
//! - [`extract`] - build rule drafts from a natural-language phrase
//! - [`book`] - in-memory rule store and manifest import/export

pub mod book;
pub mod extract;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub use book::{RuleBook, RulesManifest};
pub use extract::extract_rules;

// =============================================================================
// Operator
// =============================================================================

/// Condition a rule expresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

impl RuleOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleOperator::Equals => "equals",
            RuleOperator::NotEquals => "not_equals",
            RuleOperator::Contains => "contains",
            RuleOperator::NotContains => "not_contains",
            RuleOperator::StartsWith => "starts_with",
            RuleOperator::EndsWith => "ends_with",
            RuleOperator::GreaterThan => "greater_than",
            RuleOperator::LessThan => "less_than",
            RuleOperator::IsEmpty => "is_empty",
            RuleOperator::IsNotEmpty => "is_not_empty",
        }
    }

    /// Human wording used in generated rule names.
    pub fn label(&self) -> &'static str {
        match self {
            RuleOperator::Equals => "equals",
            RuleOperator::NotEquals => "does not equal",
            RuleOperator::Contains => "contains",
            RuleOperator::NotContains => "does not contain",
            RuleOperator::StartsWith => "starts with",
            RuleOperator::EndsWith => "ends with",
            RuleOperator::GreaterThan => "greater than",
            RuleOperator::LessThan => "less than",
            RuleOperator::IsEmpty => "is empty",
            RuleOperator::IsNotEmpty => "is not empty",
        }
    }
}

impl fmt::Display for RuleOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Action
// =============================================================================

/// What a reviewer should do with rows violating the rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    #[default]
    Flag,
    AutoCorrect,
    Reject,
    Highlight,
    Transform,
}

impl RuleAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleAction::Flag => "flag",
            RuleAction::AutoCorrect => "auto_correct",
            RuleAction::Reject => "reject",
            RuleAction::Highlight => "highlight",
            RuleAction::Transform => "transform",
        }
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Rule
// =============================================================================

fn default_priority() -> i64 {
    1
}

fn default_active() -> bool {
    true
}

/// A rule before it is stored (no id, always active on insert).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub field: String,
    pub operator: RuleOperator,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub action: RuleAction,
    #[serde(default = "default_priority")]
    pub priority: i64,
}

impl RuleDraft {
    /// Store-ready rule with a fresh id.
    pub fn into_rule(self) -> Rule {
        Rule {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            description: self.description,
            field: self.field,
            operator: self.operator,
            value: self.value,
            action: self.action,
            priority: self.priority,
            is_active: true,
        }
    }
}

/// A stored, user-toggleable rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub field: String,
    pub operator: RuleOperator,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub action: RuleAction,
    /// User-assigned ordering tiebreak; lower sorts first
    #[serde(default = "default_priority")]
    pub priority: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_wire_names() {
        let rule = RuleDraft {
            name: "Email contains".into(),
            description: String::new(),
            field: "email".into(),
            operator: RuleOperator::NotContains,
            value: " ".into(),
            action: RuleAction::AutoCorrect,
            priority: 2,
        }
        .into_rule();
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["operator"], "not_contains");
        assert_eq!(json["action"], "auto_correct");
        assert_eq!(json["isActive"], true);
        assert!(!rule.id.is_empty());
    }

    #[test]
    fn test_rule_defaults_on_deserialize() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "name": "n",
            "field": "f",
            "operator": "is_empty"
        }))
        .unwrap();
        assert_eq!(rule.action, RuleAction::Flag);
        assert_eq!(rule.priority, 1);
        assert!(rule.is_active);
        assert!(rule.id.is_empty());
    }
}
