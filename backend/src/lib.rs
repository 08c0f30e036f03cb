//! # TableTalk - text commands, rules, validation and search over loose tables
//!
//! TableTalk manipulates tables of loosely-typed records through short
//! phrases instead of a query language.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV/JSON   │────▶│   Loader    │────▶│   Session   │────▶│  New Table  │
//! │ (ISO/UTF8)  │     │ (auto-enc)  │     │ parse/apply │     │  snapshot   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                           │ rules │ validation │ search
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tabletalk::{Row, Session, Table};
//!
//! let mut session = Session::new();
//! session.load(Table::from_rows(vec![
//!     Row::from_pairs([("name", json!("Ann")), ("city", json!("oslo"))]),
//! ]));
//!
//! let record = session.submit("Transform city to uppercase in row 1").unwrap();
//! session.apply(&record.id).unwrap();
//! assert_eq!(session.table().rows()[0].text("city"), "OSLO");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Row and Table
//! - [`command`] - Field resolution, command parsing, conditions, transforms, applier, history
//! - [`rules`] - Rule extraction and the rule book
//! - [`validation`] - Schema inference and row validation
//! - [`search`] - Free-text row scoring
//! - [`loader`] - CSV/JSON ingestion with auto-detection
//! - [`session`] - Host state container
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod error;
pub mod models;

// Engine
pub mod command;
pub mod rules;
pub mod search;
pub mod validation;

// Host
pub mod config;
pub mod loader;
pub mod session;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ApplyError, ConfigError, LoadError, ParseError, RuleError, ServerError, SessionError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{value_to_text, Row, Table};

// =============================================================================
// Re-exports - Commands
// =============================================================================

pub use command::{
    apply, evaluate, parse_command, preview, resolve_field, transforms_description,
    ApplyOutcome, Clause, ClauseOperator, History, Intent, ModificationRecord,
    ModificationStatus, Operation, Transform,
};

// =============================================================================
// Re-exports - Rules
// =============================================================================

pub use rules::{extract_rules, Rule, RuleAction, RuleBook, RuleDraft, RuleOperator, RulesManifest};

// =============================================================================
// Re-exports - Validation & Search
// =============================================================================

pub use search::{search, SearchQuery, SearchResult};
pub use validation::{
    infer_schema, infer_table_schema, validate, FieldRule, Schema, ValidationIssue,
    ValidationReport, ValidationStats,
};

// =============================================================================
// Re-exports - Host
// =============================================================================

pub use config::Config;
pub use loader::{load_csv_bytes, load_json, load_path, LoadedTable};
pub use session::Session;

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
