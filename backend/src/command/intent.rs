//! Structured results of command parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a command does to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Set a field on selected rows
    Update,
    /// Remove selected rows
    Delete,
    /// Append one row
    Add,
    /// Substring replacement inside a field
    Replace,
    /// Run a named transform on a field
    Transform,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Add => "add",
            Operation::Replace => "replace",
            Operation::Transform => "transform",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison used by a `where` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClauseOperator {
    #[serde(rename = "=")]
    Equals,
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "starts")]
    StartsWith,
    #[serde(rename = "ends")]
    EndsWith,
}

impl ClauseOperator {
    /// Parse the operator token of a `where` fragment.
    ///
    /// Accepts `=`, `>`, `<`, `contains`, `starts with` and `ends with`
    /// (any inner whitespace, any case).
    pub fn from_token(token: &str) -> Option<Self> {
        let words: Vec<String> = token
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        let words: Vec<&str> = words.iter().map(String::as_str).collect();
        match words.as_slice() {
            ["="] => Some(Self::Equals),
            [">"] => Some(Self::GreaterThan),
            ["<"] => Some(Self::LessThan),
            ["contains"] => Some(Self::Contains),
            ["starts", "with"] | ["starts"] => Some(Self::StartsWith),
            ["ends", "with"] | ["ends"] => Some(Self::EndsWith),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::Contains => "contains",
            Self::StartsWith => "starts",
            Self::EndsWith => "ends",
        }
    }
}

impl fmt::Display for ClauseOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single `where <field> <op> <value>` condition.
///
/// `field` is the token exactly as written in the phrase; it is matched
/// case-insensitively against row keys at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub field: String,
    pub operator: ClauseOperator,
    pub literal: String,
}

impl Clause {
    pub fn new(field: impl Into<String>, operator: ClauseOperator, literal: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator,
            literal: literal.into(),
        }
    }
}

/// Parsed form of a command phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    pub operation: Operation,
    /// Resolved column name, always a member of the table's field set
    pub field: String,
    #[serde(default)]
    pub condition: Option<Clause>,
    /// New value, transform name or replacement text
    #[serde(default)]
    pub literal: String,
    /// Explicit 1-based row numbers
    #[serde(default)]
    pub target_rows: Vec<usize>,
}

impl Intent {
    pub fn new(operation: Operation, field: impl Into<String>) -> Self {
        Self {
            operation,
            field: field.into(),
            condition: None,
            literal: String::new(),
            target_rows: Vec::new(),
        }
    }

    pub fn with_condition(mut self, clause: Clause) -> Self {
        self.condition = Some(clause);
        self
    }

    pub fn with_literal(mut self, literal: impl Into<String>) -> Self {
        self.literal = literal.into();
        self
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = usize>) -> Self {
        self.target_rows.extend(rows);
        self
    }

    /// One-line human description, used in logs and CLI output.
    pub fn describe(&self) -> String {
        let mut out = format!("{} '{}'", self.operation, self.field);
        if !self.literal.is_empty() {
            out.push_str(&format!(" with \"{}\"", self.literal));
        }
        if let Some(ref c) = self.condition {
            out.push_str(&format!(" where {} {} \"{}\"", c.field, c.operator, c.literal));
        }
        if !self.target_rows.is_empty() {
            let rows: Vec<String> = self.target_rows.iter().map(|r| r.to_string()).collect();
            out.push_str(&format!(" on rows {}", rows.join(", ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_tokens() {
        assert_eq!(ClauseOperator::from_token("="), Some(ClauseOperator::Equals));
        assert_eq!(ClauseOperator::from_token("Starts  With"), Some(ClauseOperator::StartsWith));
        assert_eq!(ClauseOperator::from_token("ends with"), Some(ClauseOperator::EndsWith));
        assert_eq!(ClauseOperator::from_token("like"), None);
    }

    #[test]
    fn test_intent_serializes_camel_case() {
        let intent = Intent::new(Operation::Delete, "name").with_rows([2]);
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["operation"], "delete");
        assert_eq!(json["targetRows"][0], 2);
    }

    #[test]
    fn test_describe() {
        let intent = Intent::new(Operation::Update, "status")
            .with_literal("done")
            .with_condition(Clause::new("name", ClauseOperator::Contains, "john"));
        assert_eq!(
            intent.describe(),
            "update 'status' with \"done\" where name contains \"john\""
        );
    }
}
