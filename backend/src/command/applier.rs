//! Modification applier
//!
//! Executes an [`Intent`] against a table snapshot and returns a new snapshot.
//! [`apply`] never fails outward: internal failures are captured on the
//! returned [`ApplyOutcome`] and the input table is handed back unchanged.

use regex::{NoExpand, RegexBuilder};
use serde_json::Value;

use super::condition::evaluate;
use super::intent::{Intent, Operation};
use super::transforms::apply_named;
use crate::error::ApplyError;
use crate::models::{value_to_text, Row, Table};

/// Compiled size cap for replace search patterns, which come from user text.
const REPLACE_SIZE_LIMIT: usize = 1 << 20;

/// Result of applying an intent
#[derive(Debug, Clone)]
pub struct ApplyOutcome {
    /// Resulting table (the input table when nothing changed or on failure)
    pub table: Table,
    /// 1-based row numbers touched, relative to the input table
    pub affected_rows: Vec<usize>,
    /// Captured failure, if any
    pub error: Option<ApplyError>,
}

impl ApplyOutcome {
    /// Check if the intent applied without errors
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        match self.error {
            Some(ref e) => format!("Failed: {}", e),
            None => format!(
                "Applied: {} rows affected, {} rows in table",
                self.affected_rows.len(),
                self.table.len()
            ),
        }
    }
}

/// Row numbers selected by an intent's addressing.
///
/// A row is selected when its number is in `target_rows` or it satisfies the
/// condition. With neither, nothing is selected.
pub fn select_rows(table: &Table, intent: &Intent) -> Vec<usize> {
    table
        .rows()
        .iter()
        .enumerate()
        .filter(|(idx, row)| {
            let number = idx + 1;
            intent.target_rows.contains(&number)
                || intent
                    .condition
                    .as_ref()
                    .is_some_and(|clause| evaluate(row, clause))
        })
        .map(|(idx, _)| idx + 1)
        .collect()
}

/// Dry run: the row numbers [`apply`] would affect.
///
/// For `add` this is the number the new row would receive.
pub fn preview(table: &Table, intent: &Intent) -> Vec<usize> {
    match intent.operation {
        Operation::Add => vec![table.len() + 1],
        Operation::Replace if replace_pattern(intent).is_none() => Vec::new(),
        _ => select_rows(table, intent),
    }
}

/// Apply an intent to a table snapshot.
pub fn apply(table: &Table, intent: &Intent) -> ApplyOutcome {
    match try_apply(table, intent) {
        Ok((rows, affected_rows)) => ApplyOutcome {
            table: table.with_rows(rows),
            affected_rows,
            error: None,
        },
        Err(error) => ApplyOutcome {
            table: table.clone(),
            affected_rows: Vec::new(),
            error: Some(error),
        },
    }
}

fn try_apply(table: &Table, intent: &Intent) -> Result<(Vec<Row>, Vec<usize>), ApplyError> {
    let mut rows = table.rows().to_vec();

    match intent.operation {
        Operation::Add => {
            let mut row = Row::new();
            for field in table.fields() {
                row.set(field.clone(), Value::String(String::new()));
            }
            row.set(intent.field.clone(), Value::String(intent.literal.clone()));
            rows.push(row);
            Ok((rows, vec![table.len() + 1]))
        }

        Operation::Delete => {
            let selected = select_rows(table, intent);
            let kept = rows
                .into_iter()
                .enumerate()
                .filter(|(idx, _)| !selected.contains(&(idx + 1)))
                .map(|(_, row)| row)
                .collect();
            Ok((kept, selected))
        }

        Operation::Update => {
            let selected = select_rows(table, intent);
            for &number in &selected {
                rows[number - 1].set(intent.field.clone(), Value::String(intent.literal.clone()));
            }
            Ok((rows, selected))
        }

        Operation::Replace => {
            let Some(search) = replace_pattern(intent) else {
                // No condition means no search text: nothing to replace.
                return Ok((rows, Vec::new()));
            };
            let re = RegexBuilder::new(&regex::escape(search))
                .case_insensitive(true)
                .size_limit(REPLACE_SIZE_LIMIT)
                .build()
                .map_err(|e| ApplyError::InvalidPattern {
                    pattern: search.to_string(),
                    message: e.to_string(),
                })?;

            let selected = select_rows(table, intent);
            for &number in &selected {
                let row = &mut rows[number - 1];
                let current = row.get(&intent.field).map(value_to_text).unwrap_or_default();
                let replaced = re.replace_all(&current, NoExpand(&intent.literal)).into_owned();
                row.set(intent.field.clone(), Value::String(replaced));
            }
            Ok((rows, selected))
        }

        Operation::Transform => {
            let selected = select_rows(table, intent);
            for &number in &selected {
                let row = &mut rows[number - 1];
                let present = row.get(&intent.field).is_some();
                let current = row.get(&intent.field).cloned().unwrap_or(Value::Null);
                let next = apply_named(&intent.literal, &current);
                if present || !next.is_null() {
                    row.set(intent.field.clone(), next);
                }
            }
            Ok((rows, selected))
        }
    }
}

/// Search text for `replace`: the condition's literal, when there is one.
fn replace_pattern(intent: &Intent) -> Option<&str> {
    intent
        .condition
        .as_ref()
        .map(|c| c.literal.as_str())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::intent::{Clause, ClauseOperator};
    use serde_json::json;

    fn people() -> Table {
        Table::from_rows(vec![
            Row::from_pairs([("name", json!("John Doe")), ("email", json!("j@x.com"))]),
            Row::from_pairs([("name", json!("Jane")), ("email", json!("a@x.com"))]),
            Row::from_pairs([("name", json!("Johnny")), ("email", json!("jj@x.com"))]),
        ])
    }

    #[test]
    fn test_transform_selected_by_condition() {
        let intent = Intent::new(Operation::Transform, "email")
            .with_literal("uppercase")
            .with_condition(Clause::new("name", ClauseOperator::Equals, "john doe"));
        let out = apply(&people(), &intent);
        assert!(out.is_ok());
        assert_eq!(out.affected_rows, vec![1]);
        assert_eq!(out.table.rows()[0].get("email"), Some(&json!("J@X.COM")));
        assert_eq!(out.table.rows()[1].get("email"), Some(&json!("a@x.com")));
    }

    #[test]
    fn test_selection_is_union_of_rows_and_condition() {
        let intent = Intent::new(Operation::Update, "email")
            .with_literal("hidden")
            .with_rows([2])
            .with_condition(Clause::new("name", ClauseOperator::StartsWith, "johnn"));
        assert_eq!(select_rows(&people(), &intent), vec![2, 3]);
    }

    #[test]
    fn test_no_addressing_is_noop() {
        let table = people();
        let intent = Intent::new(Operation::Update, "email").with_literal("x");
        let out = apply(&table, &intent);
        assert!(out.affected_rows.is_empty());
        assert_eq!(out.table, table);

        let intent = Intent::new(Operation::Delete, "email");
        assert_eq!(apply(&table, &intent).table.len(), table.len());
    }

    #[test]
    fn test_delete_keeps_order() {
        let intent = Intent::new(Operation::Delete, "name").with_rows([2, 2]);
        let out = apply(&people(), &intent);
        assert_eq!(out.table.len(), 2);
        assert_eq!(out.table.rows()[0].text("name"), "John Doe");
        assert_eq!(out.table.rows()[1].text("name"), "Johnny");
        assert_eq!(out.affected_rows, vec![2]);
    }

    #[test]
    fn test_add_appends_blank_row_with_value() {
        let table = people();
        let intent = Intent::new(Operation::Add, "name").with_literal("Zed");
        let out = apply(&table, &intent);
        assert_eq!(out.table.len(), table.len() + 1);
        let added = &out.table.rows()[3];
        assert_eq!(added.get("name"), Some(&json!("Zed")));
        assert_eq!(added.get("email"), Some(&json!("")));
        assert_eq!(out.affected_rows, vec![4]);
        assert_eq!(preview(&table, &intent), vec![4]);
    }

    #[test]
    fn test_replace_is_case_insensitive_and_literal() {
        let intent = Intent::new(Operation::Replace, "email")
            .with_literal("$0-y")
            .with_condition(Clause::new("email", ClauseOperator::Contains, "X.COM"));
        let out = apply(&people(), &intent);
        assert!(out.is_ok());
        assert_eq!(out.table.rows()[0].text("email"), "j@$0-y");
        assert_eq!(out.affected_rows, vec![1, 2, 3]);
    }

    #[test]
    fn test_replace_without_condition_is_noop() {
        let table = people();
        let intent = Intent::new(Operation::Replace, "name").with_literal("X").with_rows([1]);
        let out = apply(&table, &intent);
        assert_eq!(out.table, table);
        assert!(out.affected_rows.is_empty());
        assert!(preview(&table, &intent).is_empty());
    }

    #[test]
    fn test_failure_returns_input_unchanged() {
        let table = people();
        let oversized = "a".repeat(REPLACE_SIZE_LIMIT);
        let intent = Intent::new(Operation::Replace, "name")
            .with_literal("X")
            .with_condition(Clause::new("name", ClauseOperator::Contains, oversized));
        let out = apply(&table, &intent);
        assert!(!out.is_ok());
        assert!(matches!(out.error, Some(ApplyError::InvalidPattern { .. })));
        assert_eq!(out.table, table);
        assert!(out.affected_rows.is_empty());
    }

    #[test]
    fn test_replace_stringifies_numbers() {
        let table = Table::from_rows(vec![Row::from_pairs([("code", json!(1200))])]);
        let intent = Intent::new(Operation::Replace, "code")
            .with_literal("9")
            .with_condition(Clause::new("code", ClauseOperator::Contains, "12"));
        let out = apply(&table, &intent);
        assert_eq!(out.table.rows()[0].get("code"), Some(&json!("900")));
    }

    #[test]
    fn test_transform_changes_value_type() {
        let table = Table::from_rows(vec![Row::from_pairs([("name", json!("John Middle Doe"))])]);
        let intent = Intent::new(Operation::Transform, "name")
            .with_literal("wordcount")
            .with_rows([1]);
        let out = apply(&table, &intent);
        assert_eq!(out.table.rows()[0].get("name"), Some(&json!(3)));
    }

    #[test]
    fn test_out_of_range_rows_are_ignored() {
        let intent = Intent::new(Operation::Delete, "name").with_rows([0, 9]);
        let out = apply(&people(), &intent);
        assert_eq!(out.table.len(), 3);
        assert!(out.affected_rows.is_empty());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let table = people();
        let snapshot = table.clone();
        let intent = Intent::new(Operation::Update, "name").with_literal("X").with_rows([1]);
        let _ = apply(&table, &intent);
        assert_eq!(table, snapshot);
    }
}
