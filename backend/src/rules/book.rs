//! Rule Book - in-memory rule store
//!
//! Keeps rules in insertion order, lists them by priority and round-trips
//! them through a JSON manifest validated against an embedded schema.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use uuid::Uuid;

use super::{Rule, RuleDraft};
use crate::error::{RuleError, RuleResult};
use crate::validation::json_schema;

/// Manifest format version written on export
pub const MANIFEST_VERSION: &str = "1.0";

static MANIFEST_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/rules-manifest.json"))
        .expect("Invalid embedded schema")
});

/// Serialized rule list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesManifest {
    pub version: String,
    pub rules: Vec<Rule>,
}

/// Store for declarative rules
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: Vec<Rule>,
}

impl RuleBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a draft as an active rule, returning the stored rule
    pub fn add(&mut self, draft: RuleDraft) -> &Rule {
        self.rules.push(draft.into_rule());
        let last = self.rules.len() - 1;
        &self.rules[last]
    }

    /// Store several drafts, returning the stored copies
    pub fn add_all(&mut self, drafts: Vec<RuleDraft>) -> Vec<Rule> {
        drafts.into_iter().map(|d| self.add(d).clone()).collect()
    }

    /// Get a rule by ID
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// All rules, lowest priority first; equal priorities keep insertion order
    pub fn list(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.iter().collect();
        rules.sort_by_key(|r| r.priority);
        rules
    }

    /// Active rules, in [`RuleBook::list`] order
    pub fn active(&self) -> Vec<&Rule> {
        self.list().into_iter().filter(|r| r.is_active).collect()
    }

    /// Flip `is_active` on a rule
    pub fn toggle(&mut self, id: &str) -> RuleResult<&Rule> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RuleError::NotFound(id.to_string()))?;
        rule.is_active = !rule.is_active;
        Ok(rule)
    }

    /// Remove a rule, returning it
    pub fn delete(&mut self, id: &str) -> RuleResult<Rule> {
        let pos = self
            .rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RuleError::NotFound(id.to_string()))?;
        Ok(self.rules.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Snapshot of every rule as a manifest
    pub fn manifest(&self) -> RulesManifest {
        RulesManifest {
            version: MANIFEST_VERSION.to_string(),
            rules: self.list().into_iter().cloned().collect(),
        }
    }

    /// Pretty JSON manifest
    pub fn export_json(&self) -> RuleResult<String> {
        Ok(serde_json::to_string_pretty(&self.manifest())?)
    }

    /// Write the manifest to a file
    pub fn export_file(&self, path: &Path) -> RuleResult<()> {
        fs::write(path, self.export_json()?)?;
        Ok(())
    }

    /// Import a manifest value; every imported rule gets a fresh ID.
    ///
    /// Nothing is added unless the whole manifest validates.
    pub fn import_value(&mut self, manifest: &Value) -> RuleResult<Vec<Rule>> {
        json_schema::validate(&MANIFEST_SCHEMA, manifest)
            .map_err(|errors| RuleError::InvalidManifest { errors })?;

        let parsed: RulesManifest = serde_json::from_value(manifest.clone())?;
        let imported: Vec<Rule> = parsed
            .rules
            .into_iter()
            .map(|rule| Rule {
                id: Uuid::new_v4().to_string(),
                ..rule
            })
            .collect();
        self.rules.extend(imported.iter().cloned());
        Ok(imported)
    }

    /// Import a manifest from JSON text
    pub fn import_json(&mut self, content: &str) -> RuleResult<Vec<Rule>> {
        let value: Value = serde_json::from_str(content)?;
        self.import_value(&value)
    }

    /// Import a manifest from a file
    pub fn import_file(&mut self, path: &Path) -> RuleResult<Vec<Rule>> {
        let content = fs::read_to_string(path)?;
        self.import_json(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{RuleAction, RuleOperator};
    use serde_json::json;
    use tempfile::tempdir;

    fn draft(field: &str, priority: i64) -> RuleDraft {
        RuleDraft {
            name: format!("{} is not empty", field),
            description: String::new(),
            field: field.to_string(),
            operator: RuleOperator::IsNotEmpty,
            value: String::new(),
            action: RuleAction::Flag,
            priority,
        }
    }

    #[test]
    fn test_list_sorted_by_priority_stable() {
        let mut book = RuleBook::new();
        book.add(draft("a", 2));
        book.add(draft("b", 1));
        book.add(draft("c", 2));
        let fields: Vec<_> = book.list().iter().map(|r| r.field.as_str()).collect();
        assert_eq!(fields, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_toggle_and_delete() {
        let mut book = RuleBook::new();
        let id = book.add(draft("a", 1)).id.clone();
        assert!(!book.toggle(&id).unwrap().is_active);
        assert!(book.active().is_empty());
        assert!(book.toggle(&id).unwrap().is_active);

        let removed = book.delete(&id).unwrap();
        assert_eq!(removed.field, "a");
        assert!(book.is_empty());
        assert!(matches!(book.delete(&id), Err(RuleError::NotFound(_))));
        assert!(matches!(book.toggle(&id), Err(RuleError::NotFound(_))));
    }

    #[test]
    fn test_import_assigns_fresh_ids() {
        let mut source = RuleBook::new();
        let original = source.add(draft("email", 1)).id.clone();
        let json = source.export_json().unwrap();

        let mut target = RuleBook::new();
        let imported = target.import_json(&json).unwrap();
        assert_eq!(imported.len(), 1);
        assert_ne!(imported[0].id, original);
        assert_eq!(imported[0].field, "email");
    }

    #[test]
    fn test_import_rejects_invalid_manifest() {
        let mut book = RuleBook::new();
        let bad = json!({
            "version": "1.0",
            "rules": [{ "name": "x", "field": "f", "operator": "resembles", "action": "flag" }]
        });
        let err = book.import_value(&bad).unwrap_err();
        assert!(matches!(err, RuleError::InvalidManifest { .. }));
        assert!(book.is_empty());

        let missing = json!({ "rules": [] });
        assert!(book.import_value(&missing).is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");

        let mut book = RuleBook::new();
        book.add(draft("phone", 3));
        book.export_file(&path).unwrap();

        let mut other = RuleBook::new();
        let imported = other.import_file(&path).unwrap();
        assert_eq!(imported[0].priority, 3);
        assert_eq!(other.manifest().version, MANIFEST_VERSION);
    }
}
