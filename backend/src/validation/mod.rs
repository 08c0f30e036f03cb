//! Validation engine.
//!
//! A schema is inferred from one sample row: each field gets a single format
//! rule chosen from its name first, then from its sample value. Every row of a
//! table is then checked against that schema.
//!
//! # Inference priority
//!
//! | Field name / sample      | Rule        |
//! |--------------------------|-------------|
//! | name contains `email`    | `email`     |
//! | name contains `phone` or `mobile` | `phone` |
//! | name contains `date`     | `date`      |
//! | sample value is numeric  | `numeric`   |
//! | anything else            | `non_empty` |
//!
//! All rules are optional: an absent, null or `""` value never produces an
//! issue. Findings are data, never errors.
//!
//! [`json_schema`] holds the draft-7 helper used for manifest documents.

pub mod json_schema;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

use crate::models::{value_to_text, Row, Table};

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex"));

static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?\d{1,16}$").expect("Invalid phone regex"));

/// Date-only layouts accepted by the `date` rule.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Date-time layouts accepted by the `date` rule.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

// =============================================================================
// Schema
// =============================================================================

/// Format rule attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRule {
    Email,
    Phone,
    Date,
    Numeric,
    NonEmpty,
}

impl FieldRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRule::Email => "email",
            FieldRule::Phone => "phone",
            FieldRule::Date => "date",
            FieldRule::Numeric => "numeric",
            FieldRule::NonEmpty => "non_empty",
        }
    }

    /// Issue message for a value failing this rule.
    pub fn message(&self) -> &'static str {
        match self {
            FieldRule::Email => "Invalid email format",
            FieldRule::Phone => "Invalid phone number",
            FieldRule::Date => "Invalid date",
            FieldRule::Numeric => "Must be a number",
            FieldRule::NonEmpty => "Must not be blank",
        }
    }

    /// Whether a present, non-empty value satisfies the rule.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldRule::Email => EMAIL_REGEX.is_match(&value_to_text(value)),
            FieldRule::Phone => PHONE_REGEX.is_match(&value_to_text(value)),
            FieldRule::Date => is_date(&value_to_text(value)),
            FieldRule::Numeric => is_numeric(value),
            FieldRule::NonEmpty => !value_to_text(value).trim().is_empty(),
        }
    }
}

impl fmt::Display for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub field: String,
    pub rule: FieldRule,
}

/// Inferred per-field schema, in sample-row field order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldSchema>,
}

impl Schema {
    pub fn rule_for(&self, field: &str) -> Option<FieldRule> {
        self.fields.iter().find(|f| f.field == field).map(|f| f.rule)
    }
}

/// Number or numeric string (finite).
pub fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok_and(f64::is_finite),
        _ => false,
    }
}

/// Whether text parses as a date in one of the accepted layouts.
pub fn is_date(text: &str) -> bool {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text).is_ok()
        || DateTime::parse_from_rfc2822(text).is_ok()
        || DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(text, fmt).is_ok())
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(text, fmt).is_ok())
}

/// Pick the rule for one field from its name and sample value.
pub fn infer_rule(field: &str, sample: &Value) -> FieldRule {
    let name = field.to_lowercase();
    if name.contains("email") {
        FieldRule::Email
    } else if name.contains("phone") || name.contains("mobile") {
        FieldRule::Phone
    } else if name.contains("date") {
        FieldRule::Date
    } else if is_numeric(sample) {
        FieldRule::Numeric
    } else {
        FieldRule::NonEmpty
    }
}

/// Infer a schema from a sample row.
pub fn infer_schema(sample: &Row) -> Schema {
    Schema {
        fields: sample
            .iter()
            .map(|(field, value)| FieldSchema {
                field: field.clone(),
                rule: infer_rule(field, value),
            })
            .collect(),
    }
}

/// Infer a schema from the first row of a table (empty for an empty table).
pub fn infer_table_schema(table: &Table) -> Schema {
    table.row(1).map(infer_schema).unwrap_or_default()
}

// =============================================================================
// Report
// =============================================================================

/// One failing field in one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub offending_value: Value,
    pub row_number: usize,
}

/// Aggregate counts for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub total_rows: usize,
    pub rows_with_issues: usize,
    pub fields_with_issues: usize,
    pub total_issues: usize,
}

/// Result of validating a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub stats: ValidationStats,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} issues in {} of {} rows ({} fields)",
            self.stats.total_issues,
            self.stats.rows_with_issues,
            self.stats.total_rows,
            self.stats.fields_with_issues
        )
    }
}

/// Present values the rules skip: null and the empty string.
fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Check every row against the schema.
pub fn validate(table: &Table, schema: &Schema) -> ValidationReport {
    let mut issues = Vec::new();
    let mut rows_with_issues = 0;
    let mut failing_fields = BTreeSet::new();

    for (idx, row) in table.rows().iter().enumerate() {
        let before = issues.len();

        for spec in &schema.fields {
            let Some(value) = row.get(&spec.field).filter(|v| !is_unset(v)) else {
                continue;
            };

            if !spec.rule.accepts(value) {
                failing_fields.insert(spec.field.as_str());
                issues.push(ValidationIssue {
                    field: spec.field.clone(),
                    message: spec.rule.message().to_string(),
                    offending_value: value.clone(),
                    row_number: idx + 1,
                });
            }
        }

        if issues.len() > before {
            rows_with_issues += 1;
        }
    }

    let stats = ValidationStats {
        total_rows: table.len(),
        rows_with_issues,
        fields_with_issues: failing_fields.len(),
        total_issues: issues.len(),
    };
    ValidationReport { issues, stats }
}
