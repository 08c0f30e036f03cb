//! Text commands over a table.
//!
//! - `resolver`: map phrase text onto a known field
//! - `matchers`: independent grammar fragment recognizers
//! - `parser`: compose matchers into an [`Intent`]
//! - `condition`: evaluate a `where` clause on a row
//! - `transforms`: named value functions
//! - `applier`: execute an intent on a table snapshot
//! - `history`: modification records and their log
//!
//! ## Usage Flow
//!
//! ```text
//! phrase + fields → parse_command → Intent → preview (dry run) → apply → new Table
//! ```
//!
//! ## Example
//!
//! ```rust
//! use serde_json::json;
//! use tabletalk::{apply, parse_command, Row, Table};
//!
//! let table = Table::from_rows(vec![
//!     Row::from_pairs([("name", json!("John Doe")), ("email", json!("j@x.com"))]),
//!     Row::from_pairs([("name", json!("Jane")), ("email", json!("a@x.com"))]),
//! ]);
//!
//! let intent = parse_command(
//!     "Update email field to uppercase where name contains John",
//!     table.fields(),
//! ).unwrap();
//! let outcome = apply(&table, &intent);
//!
//! assert_eq!(outcome.table.rows()[0].text("email"), "J@X.COM");
//! ```

pub mod applier;
pub mod condition;
pub mod history;
pub mod intent;
pub mod matchers;
pub mod parser;
pub mod resolver;
pub mod transforms;

// Re-exports for convenience
pub use applier::{apply, preview, select_rows, ApplyOutcome};
pub use condition::evaluate;
pub use history::{History, ModificationRecord, ModificationStatus};
pub use intent::{Clause, ClauseOperator, Intent, Operation};
pub use matchers::{Fragment, PhraseMatcher};
pub use parser::{parse_command, CommandParser};
pub use resolver::{find_field, normalize, resolve_field};
pub use transforms::{apply_named, transforms_description, Transform};
