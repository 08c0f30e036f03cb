//! Command parser
//!
//! Turns a short phrase such as
//! `Update email field to uppercase where name contains John` into an
//! [`Intent`]. Parsing is pure and case-insensitive.
//!
//! ## Grammar
//!
//! ```text
//! operation  : "to <transform>" | delete/remove | add/insert | replace/swap
//!              | transform/convert ... "to <word>" | (default) update
//! field      : first known field whose normalized name occurs in the phrase
//! condition  : where <field> (= | > | < | contains | starts with | ends with) <value>
//! literal    : to <value> | with <value> | set <value>   (quotes optional)
//! rows       : row <N>   (any number of times)
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use super::intent::{Intent, Operation};
use super::matchers::{
    literal_matchers, operation_matchers, Fragment, PhraseMatcher, QuotedLiteral, RowNumbers,
    WhereClause,
};
use super::resolver::{find_field, resolve_field};
use crate::error::{ParseError, ParseResult};

static WHERE_KEYWORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bwhere\b").expect("Invalid where regex"));

/// Ordered matcher set used by [`parse_command`].
pub struct CommandParser {
    operations: Vec<Box<dyn PhraseMatcher>>,
    literals: Vec<Box<dyn PhraseMatcher>>,
}

impl CommandParser {
    pub fn new() -> Self {
        Self {
            operations: operation_matchers(),
            literals: literal_matchers(),
        }
    }

    /// Parse `phrase` against the table's current field set.
    pub fn parse(&self, phrase: &str, fields: &[String]) -> ParseResult<Intent> {
        let phrase = phrase.trim();
        if phrase.is_empty() {
            return Err(ParseError::EmptyCommand);
        }

        let (operation, implied_literal) = self.detect_operation(phrase);

        let condition = match WhereClause.try_extract(phrase) {
            Some(Fragment::Clause(clause)) => Some(clause),
            _ => None,
        };

        let target_rows = match RowNumbers.try_extract(phrase) {
            Some(Fragment::Rows(rows)) => rows,
            _ => Vec::new(),
        };

        let field = resolve_target_field(phrase, fields).or_else(|err| {
            // Deleting addressed rows does not need a field; anchor on the first one.
            let addressed = !target_rows.is_empty() || condition.is_some();
            match fields.first() {
                Some(first) if operation == Operation::Delete && addressed => Ok(first.clone()),
                _ => Err(err),
            }
        })?;

        let literal = match operation {
            Operation::Transform => implied_literal.unwrap_or_default(),
            Operation::Update | Operation::Replace => self.extract_literal(phrase).unwrap_or_default(),
            Operation::Add => extract_with(&QuotedLiteral, phrase)
                .or_else(|| self.extract_literal(phrase))
                .unwrap_or_default(),
            Operation::Delete => String::new(),
        };

        Ok(Intent {
            operation,
            field,
            condition,
            literal,
            target_rows,
        })
    }

    fn detect_operation(&self, phrase: &str) -> (Operation, Option<String>) {
        self.operations
            .iter()
            .find_map(|m| match m.try_extract(phrase) {
                Some(Fragment::Operation { operation, literal }) => Some((operation, literal)),
                _ => None,
            })
            .unwrap_or((Operation::Update, None))
    }

    fn extract_literal(&self, phrase: &str) -> Option<String> {
        self.literals
            .iter()
            .find_map(|m| extract_with(m.as_ref(), phrase))
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_with(matcher: &dyn PhraseMatcher, phrase: &str) -> Option<String> {
    match matcher.try_extract(phrase) {
        Some(Fragment::Literal(s)) => Some(s),
        _ => None,
    }
}

/// Resolve the command's target field.
///
/// The part before `where` is searched first so that the condition's own
/// field does not shadow the target; the whole phrase is the fallback.
fn resolve_target_field(phrase: &str, fields: &[String]) -> ParseResult<String> {
    if let Some(m) = WHERE_KEYWORD.find(phrase) {
        if let Some(field) = find_field(fields, &phrase[..m.start()]) {
            return Ok(field.to_string());
        }
    }
    resolve_field(fields, phrase)
}

/// Parse a command phrase with the default matcher set.
pub fn parse_command(phrase: &str, fields: &[String]) -> ParseResult<Intent> {
    CommandParser::new().parse(phrase, fields)
}
