//! Error types for the TableTalk engine and its hosts.
//!
//! - [`ParseError`] - command phrase could not be interpreted
//! - [`ApplyError`] - a row transformation failed while applying an intent
//! - [`RuleError`] - rule book and rules manifest errors
//! - [`LoadError`] - CSV/JSON table ingestion errors
//! - [`ConfigError`] - invalid environment configuration
//! - [`SessionError`] - host-side sequencing errors (unknown record, double apply)
//! - [`ServerError`] - HTTP server errors
//!
//! `From` implementations let `?` cross these boundaries.

use thiserror::Error;

// =============================================================================
// Parse Errors
// =============================================================================

/// Errors raised while turning a phrase into an intent.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    /// No known field occurs in the phrase.
    #[error("Field not found. Available fields: {}", available.join(", "))]
    FieldNotFound { available: Vec<String> },

    /// The phrase is empty or whitespace.
    #[error("Command is empty")]
    EmptyCommand,
}

// =============================================================================
// Apply Errors
// =============================================================================

/// Errors raised inside the modification applier.
///
/// These never escape [`crate::command::apply`]; they are captured on the
/// outcome and on the owning modification record.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApplyError {
    /// Search pattern could not be compiled.
    #[error("Invalid replace pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

// =============================================================================
// Rule Errors
// =============================================================================

/// Errors from the rule book.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Rule not found.
    #[error("Rule not found: {0}")]
    NotFound(String),

    /// Manifest failed schema validation.
    #[error("Invalid rules manifest: {}", errors.join("; "))]
    InvalidManifest { errors: Vec<String> },

    /// A manual rule submission is missing data.
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// JSON error.
    #[error("Rules JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error.
    #[error("Rules IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while loading a table from CSV or JSON.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Input has no content.
    #[error("Input is empty")]
    EmptyFile,

    /// Invalid CSV format.
    #[error("Invalid CSV at line {line}: {message}")]
    Csv { line: u64, message: String },

    /// JSON input is not an array of objects.
    #[error("Invalid JSON table: {0}")]
    Json(String),
}

impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        LoadError::Csv {
            line,
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Json(err.to_string())
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Session Errors
// =============================================================================

/// Errors from the host session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The phrase could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Rule book error.
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Table loading error.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Unknown modification record.
    #[error("Modification not found: {0}")]
    RecordNotFound(String),

    /// Record was already applied or failed.
    #[error("Modification {id} is already {status}")]
    AlreadySettled { id: String, status: String },
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Session error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Could not bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for rule operations.
pub type RuleResult<T> = Result<T, RuleError>;

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_not_found_lists_fields() {
        let err = ParseError::FieldNotFound {
            available: vec!["name".into(), "email".into()],
        };
        assert_eq!(
            err.to_string(),
            "Field not found. Available fields: name, email"
        );
    }

    #[test]
    fn test_error_conversion_chain() {
        let parse_err = ParseError::EmptyCommand;
        let session_err: SessionError = parse_err.into();
        let server_err: ServerError = session_err.into();
        assert!(server_err.to_string().contains("empty"));

        let rule_err = RuleError::NotFound("r-1".into());
        let session_err: SessionError = rule_err.into();
        assert!(session_err.to_string().contains("r-1"));
    }

    #[test]
    fn test_manifest_error_format() {
        let err = RuleError::InvalidManifest {
            errors: vec!["missing rules".into(), "bad version".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("missing rules"));
        assert!(msg.contains("bad version"));
    }
}
