//! Host session: the active table, its modification history and rule book.
//!
//! The engine itself keeps no state. A `Session` is the explicit container a
//! host (CLI or HTTP server) threads through its calls, sequencing
//! parse → preview → apply and logging each step.

use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::command::{self, CommandParser, History, ModificationRecord, ModificationStatus};
use crate::config::Config;
use crate::error::{RuleError, SessionError, SessionResult};
use crate::models::Table;
use crate::rules::{extract_rules, Rule, RuleBook, RuleDraft};
use crate::search::{search, SearchResult};
use crate::validation::{infer_table_schema, validate, ValidationReport};

/// Mutable host state around an immutable-snapshot engine.
pub struct Session {
    table: Table,
    history: History,
    rules: RuleBook,
    parser: CommandParser,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Empty session with an unbounded history.
    pub fn new() -> Self {
        Self {
            table: Table::default(),
            history: History::new(),
            rules: RuleBook::new(),
            parser: CommandParser::new(),
        }
    }

    /// Empty session capping settled history at `config.history_limit` records.
    pub fn from_config(config: &Config) -> Self {
        Self {
            history: History::with_limit(config.history_limit),
            ..Self::new()
        }
    }

    // =========================================================================
    // Table
    // =========================================================================

    /// Replace the active table. History and rules are kept.
    pub fn load(&mut self, table: Table) -> &Table {
        log_info(format!(
            "Loaded table: {} rows, fields [{}]",
            table.len(),
            table.fields().join(", ")
        ));
        self.table = table;
        &self.table
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Parse a phrase and record it as a pending modification.
    pub fn submit(&mut self, phrase: &str) -> SessionResult<ModificationRecord> {
        let intent = match self.parser.parse(phrase, self.table.fields()) {
            Ok(intent) => intent,
            Err(e) => {
                log_warning(format!("Could not parse '{}': {}", phrase.trim(), e));
                return Err(e.into());
            }
        };

        let rows = command::preview(&self.table, &intent);
        log_info(format!("Parsed '{}'", phrase.trim()));
        log_info_indent(format!("{} ({} rows)", intent.describe(), rows.len()), 1);

        let record = ModificationRecord::pending(phrase.trim(), intent, rows);
        Ok(self.history.push(record).clone())
    }

    /// Rows a pending (or settled) record would touch on the current table.
    pub fn preview(&self, id: &str) -> SessionResult<Vec<usize>> {
        let record = self
            .history
            .get(id)
            .ok_or_else(|| SessionError::RecordNotFound(id.to_string()))?;
        Ok(command::preview(&self.table, &record.intent))
    }

    /// Apply a pending record, settling it to applied or failed.
    ///
    /// On success the active table is replaced by the new snapshot; on failure
    /// it is left unchanged and the record carries the error.
    pub fn apply(&mut self, id: &str) -> SessionResult<ModificationRecord> {
        let record = self
            .history
            .get_mut(id)
            .ok_or_else(|| SessionError::RecordNotFound(id.to_string()))?;

        let outcome = command::apply(&self.table, &record.intent);
        let status = record.settle(&outcome).map_err(|status| SessionError::AlreadySettled {
            id: id.to_string(),
            status: status.to_string(),
        })?;

        match status {
            ModificationStatus::Applied => {
                log_success(format!("Applied '{}': {}", record.command, outcome.summary()));
                self.table = outcome.table;
            }
            _ => log_warning(format!("Failed '{}': {}", record.command, outcome.summary())),
        }
        Ok(record.clone())
    }

    /// Parse and apply in one step.
    pub fn run(&mut self, phrase: &str) -> SessionResult<ModificationRecord> {
        let id = self.submit(phrase)?.id;
        self.apply(&id)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // =========================================================================
    // Rules
    // =========================================================================

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleBook {
        &mut self.rules
    }

    /// Extract rules from a phrase and store them.
    pub fn extract_rules(&mut self, phrase: &str) -> SessionResult<Vec<Rule>> {
        let drafts = extract_rules(phrase, self.table.fields()).inspect_err(|e| {
            log_warning(format!("No rule extracted from '{}': {}", phrase.trim(), e));
        })?;
        let rules = self.rules.add_all(drafts);
        log_success(format!("Added {} rule(s)", rules.len()));
        for rule in &rules {
            log_info_indent(format!("{} [{}]", rule.name, rule.action), 1);
        }
        Ok(rules)
    }

    /// Store a manually submitted rule.
    pub fn add_rule(&mut self, draft: RuleDraft) -> SessionResult<Rule> {
        if draft.name.trim().is_empty() {
            return Err(RuleError::InvalidRule("name is required".to_string()).into());
        }
        if draft.field.trim().is_empty() {
            return Err(RuleError::InvalidRule("field is required".to_string()).into());
        }
        let rule = self.rules.add(draft).clone();
        log_success(format!("Added rule '{}'", rule.name));
        Ok(rule)
    }

    pub fn toggle_rule(&mut self, id: &str) -> SessionResult<Rule> {
        let rule = self.rules.toggle(id)?.clone();
        log_info(format!(
            "Rule '{}' {}",
            rule.name,
            if rule.is_active { "enabled" } else { "disabled" }
        ));
        Ok(rule)
    }

    pub fn delete_rule(&mut self, id: &str) -> SessionResult<Rule> {
        let rule = self.rules.delete(id)?;
        log_info(format!("Deleted rule '{}'", rule.name));
        Ok(rule)
    }

    /// Import a rules manifest value.
    pub fn import_rules(&mut self, manifest: &serde_json::Value) -> SessionResult<Vec<Rule>> {
        let rules = self.rules.import_value(manifest).inspect_err(|e| {
            log_warning(format!("Rules import rejected: {}", e));
        })?;
        log_success(format!("Imported {} rule(s)", rules.len()));
        Ok(rules)
    }

    // =========================================================================
    // Read-only analysis
    // =========================================================================

    /// Infer a schema from the first row and validate the active table.
    pub fn validate(&self) -> ValidationReport {
        let report = validate(&self.table, &infer_table_schema(&self.table));
        if report.is_valid() {
            log_success(format!("Validation: {} rows, no issues", report.stats.total_rows));
        } else {
            log_warning(format!("Validation: {}", report.summary()));
        }
        report
    }

    /// Rank the active table against a query.
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let results = search(&self.table, query);
        log_info(format!("Search '{}': {} match(es)", query.trim(), results.len()));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use crate::models::Row;
    use serde_json::json;

    fn session_table() -> Table {
        Table::from_rows(vec![
            Row::from_pairs([("name", json!("John Doe")), ("email", json!("j@x.com"))]),
            Row::from_pairs([("name", json!("Jane")), ("email", json!("a@x.com"))]),
        ])
    }

    fn session() -> Session {
        let mut session = Session::new();
        session.load(session_table());
        session
    }

    #[test]
    fn test_submit_does_not_apply() {
        let mut session = session();
        let record = session.submit("Delete row 2").unwrap();
        assert_eq!(record.status, ModificationStatus::Pending);
        assert_eq!(record.affected_rows, vec![2]);
        assert_eq!(session.table().len(), 2);
        assert_eq!(session.preview(&record.id).unwrap(), vec![2]);
    }

    #[test]
    fn test_apply_settles_once() {
        let mut session = session();
        let id = session.submit("Delete row 2").unwrap().id;
        let applied = session.apply(&id).unwrap();
        assert_eq!(applied.status, ModificationStatus::Applied);
        assert_eq!(session.table().len(), 1);

        let err = session.apply(&id).unwrap_err();
        assert!(matches!(err, SessionError::AlreadySettled { .. }));
        assert_eq!(session.table().len(), 1);
    }

    #[test]
    fn test_history_limit_keeps_pending_records_applicable() {
        let config = Config {
            history_limit: 1,
            ..Config::default()
        };
        let mut session = Session::from_config(&config);
        session.load(session_table());

        let first = session.submit("Delete row 1").unwrap().id;
        let second = session.submit("Update name to x in row 2").unwrap().id;

        let applied = session.apply(&first).unwrap();
        assert_eq!(applied.status, ModificationStatus::Applied);
        assert_eq!(session.table().len(), 1);
        assert!(session.preview(&second).is_ok());
    }

    #[test]
    fn test_unknown_record() {
        let mut session = session();
        assert!(matches!(session.apply("nope"), Err(SessionError::RecordNotFound(_))));
        assert!(matches!(session.preview("nope"), Err(SessionError::RecordNotFound(_))));
    }

    #[test]
    fn test_parse_failure_leaves_no_record() {
        let mut session = session();
        let err = session.submit("Update salary to 5 in row 1").unwrap_err();
        assert!(matches!(err, SessionError::Parse(ParseError::FieldNotFound { .. })));
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_run_applies_update() {
        let mut session = session();
        let record = session.run("Update email to \"hidden\" in row 1").unwrap();
        assert_eq!(record.affected_rows, vec![1]);
        assert_eq!(session.table().rows()[0].text("email"), "hidden");
        assert_eq!(session.history().status_counts(), (0, 1, 0));
    }

    #[test]
    fn test_rules_lifecycle() {
        let mut session = session();
        let rules = session.extract_rules("Email field must contain \"@\"").unwrap();
        assert_eq!(rules.len(), 1);

        let toggled = session.toggle_rule(&rules[0].id).unwrap();
        assert!(!toggled.is_active);
        session.delete_rule(&rules[0].id).unwrap();
        assert!(session.rules().is_empty());
        assert!(matches!(
            session.delete_rule(&rules[0].id),
            Err(SessionError::Rule(RuleError::NotFound(_)))
        ));
    }

    #[test]
    fn test_add_rule_requires_field() {
        let mut session = session();
        let draft: RuleDraft = serde_json::from_value(json!({
            "name": "x", "field": " ", "operator": "equals"
        }))
        .unwrap();
        assert!(matches!(
            session.add_rule(draft),
            Err(SessionError::Rule(RuleError::InvalidRule(_)))
        ));
    }

    #[test]
    fn test_validate_and_search() {
        let mut session = session();
        session.run("Update email to broken in row 2").unwrap();
        let report = session.validate();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].row_number, 2);

        let hits = session.search("jane");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].row_number, 2);
    }
}
