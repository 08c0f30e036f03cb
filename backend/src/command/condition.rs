//! Row-level condition evaluation.

use serde_json::Value;

use super::intent::{Clause, ClauseOperator};
use crate::models::{value_to_text, Row};

/// Look up a clause field, exact key first, then case-insensitively.
fn clause_value<'a>(row: &'a Row, field: &str) -> Option<&'a Value> {
    row.get(field).or_else(|| {
        row.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(field))
            .map(|(_, value)| value)
    })
}

/// Parse a comparison operand; anything non-numeric becomes NaN.
fn to_number(text: &str) -> f64 {
    text.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Evaluate one clause against a row.
///
/// Both sides are compared as lowercased text. `>` and `<` compare as
/// floating-point numbers, and a non-numeric side makes the comparison false.
pub fn evaluate(row: &Row, clause: &Clause) -> bool {
    let value = clause_value(row, &clause.field)
        .map(value_to_text)
        .unwrap_or_default()
        .to_lowercase();
    let literal = clause.literal.to_lowercase();

    match clause.operator {
        ClauseOperator::Equals => value == literal,
        ClauseOperator::GreaterThan => to_number(&value) > to_number(&literal),
        ClauseOperator::LessThan => to_number(&value) < to_number(&literal),
        ClauseOperator::Contains => value.contains(&literal),
        ClauseOperator::StartsWith => value.starts_with(&literal),
        ClauseOperator::EndsWith => value.ends_with(&literal),
    }
}
