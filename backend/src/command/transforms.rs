//! Transform library
//!
//! Named single-argument value functions that a `... to <name>` command can
//! run on a field.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// All available transforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    /// Convert to uppercase
    Uppercase,

    /// Convert to lowercase
    Lowercase,

    /// First character uppercase, the rest lowercase
    Capitalize,

    /// Remove leading and trailing whitespace
    Trim,

    /// Reverse by code point
    Reverse,

    /// Character count (number)
    Length,

    /// Count of whitespace-separated words (number)
    Wordcount,
}

impl Transform {
    pub const ALL: [Transform; 7] = [
        Transform::Uppercase,
        Transform::Lowercase,
        Transform::Capitalize,
        Transform::Trim,
        Transform::Reverse,
        Transform::Length,
        Transform::Wordcount,
    ];

    /// Look up a transform by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Transform::Uppercase => "uppercase",
            Transform::Lowercase => "lowercase",
            Transform::Capitalize => "capitalize",
            Transform::Trim => "trim",
            Transform::Reverse => "reverse",
            Transform::Length => "length",
            Transform::Wordcount => "wordcount",
        }
    }

    /// Apply this transform to a value
    pub fn apply(&self, value: &Value) -> Value {
        match self {
            Transform::Uppercase => map_string(value, |s| s.to_uppercase()),
            Transform::Lowercase => map_string(value, |s| s.to_lowercase()),
            Transform::Capitalize => map_string(value, capitalize),
            Transform::Trim => map_string(value, |s| s.trim().to_string()),
            Transform::Reverse => map_string(value, |s| s.chars().rev().collect()),
            Transform::Length => count(value, |s| s.chars().count()),
            Transform::Wordcount => count(value, |s| s.split_whitespace().count()),
        }
    }
}

/// Apply the transform called `name`; unknown names leave the value unchanged.
pub fn apply_named(name: &str, value: &Value) -> Value {
    match Transform::from_name(name) {
        Some(t) => t.apply(value),
        None => value.clone(),
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn map_string(value: &Value, f: impl Fn(&str) -> String) -> Value {
    as_string(value)
        .map(|s| Value::String(f(&s)))
        .unwrap_or_else(|| value.clone())
}

fn count(value: &Value, f: impl Fn(&str) -> usize) -> Value {
    let n = as_string(value).map(|s| f(&s)).unwrap_or(0);
    Value::Number(n.into())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Description of all transforms, for `--help`-style listings
pub fn transforms_description() -> String {
    r#"Available transforms (use "... to <name>"):

| Transform  | Description                                   |
|------------|-----------------------------------------------|
| uppercase  | Convert to uppercase                          |
| lowercase  | Convert to lowercase                          |
| capitalize | First character uppercase, the rest lowercase |
| trim       | Remove leading/trailing whitespace            |
| reverse    | Reverse the characters                        |
| length     | Replace with the character count (number)     |
| wordcount  | Replace with the word count (number)          |

Example commands:
  Update email field to lowercase where name contains John
  Transform name field to wordcount
  Convert city to capitalize in row 3"#
        .to_string()
}
