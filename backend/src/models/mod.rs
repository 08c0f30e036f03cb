//! Domain models shared by every part of the engine.
//!
//! - [`Row`] - one record, a field-name to scalar-value mapping
//! - [`Table`] - ordered rows plus the working field set
//!
//! Rows are loosely typed: values are `serde_json::Value` scalars (string,
//! number, boolean, null). A field that is *not present* in a row is reported
//! as `None` by [`Row::get`], which keeps "missing" distinct from "blank".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Row
// =============================================================================

/// A single record.
///
/// Key order follows insertion order, but nothing in the engine depends on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: Map<String, Value>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing JSON object.
    pub fn from_object(cells: Map<String, Value>) -> Self {
        Self { cells }
    }

    /// Build a row from `(field, value)` pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of a field, or `None` when the field is not present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.cells.get(field)
    }

    /// Set a field, inserting it if absent.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.cells.insert(field.into(), value);
    }

    /// Text form of a field. Absent and null fields read as `""`.
    pub fn text(&self, field: &str) -> String {
        self.get(field).map(value_to_text).unwrap_or_default()
    }

    /// Whether the field is absent, null or an empty/whitespace string.
    pub fn is_blank(&self, field: &str) -> bool {
        match self.get(field) {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => false,
        }
    }

    /// Field names present in this row.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.cells.keys()
    }

    /// Iterate `(field, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.cells.iter()
    }

    /// Number of fields present.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Convert back into a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.cells.clone())
    }
}

/// Stringify a scalar the way it is displayed and compared.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

// =============================================================================
// Table
// =============================================================================

/// An ordered row sequence.
///
/// The field set is taken from the first row; later rows may miss fields or
/// carry extra ones. Row numbers are 1-based positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    fields: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Build a table whose field set comes from the first row.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let fields = rows
            .first()
            .map(|r| r.keys().cloned().collect())
            .unwrap_or_default();
        Self { fields, rows }
    }

    /// Build a table with an explicit field set.
    pub fn with_fields(fields: Vec<String>, rows: Vec<Row>) -> Self {
        Self { fields, rows }
    }

    /// Same field set, different rows.
    pub fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self {
            fields: self.fields.clone(),
            rows,
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at a 1-based position.
    pub fn row(&self, number: usize) -> Option<&Row> {
        number.checked_sub(1).and_then(|i| self.rows.get(i))
    }

    /// Whether `field` belongs to the working field set.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Rows as plain JSON objects.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows.iter().map(Row::to_value).collect()
    }
}
