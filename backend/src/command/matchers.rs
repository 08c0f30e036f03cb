//! Phrase matchers.
//!
//! Each matcher recognizes one fragment of the command grammar and knows
//! nothing about the others. The parser composes them in a fixed priority
//! order; see [`operation_matchers`] and [`literal_matchers`].

use once_cell::sync::Lazy;
use regex::Regex;

use super::intent::{Clause, ClauseOperator, Operation};
use super::transforms::Transform;

/// A piece of structure pulled out of a phrase.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Detected operation, with the literal it implies (transform name)
    Operation {
        operation: Operation,
        literal: Option<String>,
    },
    /// A `where` condition
    Clause(Clause),
    /// A new value / replacement text
    Literal(String),
    /// Explicit row numbers, in order of appearance
    Rows(Vec<usize>),
}

/// Something that can recognize one fragment of a phrase.
pub trait PhraseMatcher: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Return the fragment if this matcher recognizes the phrase.
    fn try_extract(&self, phrase: &str) -> Option<Fragment>;
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid matcher pattern {pattern}: {e}"))
}

/// Trailing part that ends an unquoted value: a `where` clause (optionally joined
/// by `and`/`or`) or a row reference.
const VALUE_TAIL: &str = r"(?:(?:\s+(?:and|or))?\s+where\b.*|\s+(?:in\s+|on\s+|for\s+|at\s+)?rows?\s+\d+.*)?\s*$";

// =============================================================================
// Operation matchers
// =============================================================================

/// `to <transform-name>` anywhere in the phrase.
pub struct TransformSuffix;

static TRANSFORM_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    let names: Vec<&str> = Transform::ALL.iter().map(|t| t.name()).collect();
    compile(&format!(r"(?i)\bto\s+({})\b", names.join("|")))
});

impl PhraseMatcher for TransformSuffix {
    fn name(&self) -> &'static str {
        "transform_suffix"
    }

    fn try_extract(&self, phrase: &str) -> Option<Fragment> {
        TRANSFORM_SUFFIX.captures(phrase).map(|caps| Fragment::Operation {
            operation: Operation::Transform,
            literal: Some(caps[1].to_lowercase()),
        })
    }
}

/// Whole-word keywords that select an operation.
pub struct KeywordOperation {
    name: &'static str,
    pattern: Regex,
    operation: Operation,
}

impl KeywordOperation {
    pub fn new(name: &'static str, keywords: &[&str], operation: Operation) -> Self {
        Self {
            name,
            pattern: compile(&format!(r"(?i)\b(?:{})\b", keywords.join("|"))),
            operation,
        }
    }
}

impl PhraseMatcher for KeywordOperation {
    fn name(&self) -> &'static str {
        self.name
    }

    fn try_extract(&self, phrase: &str) -> Option<Fragment> {
        self.pattern.is_match(phrase).then_some(Fragment::Operation {
            operation: self.operation,
            literal: None,
        })
    }
}

/// `transform`/`convert` together with `to <word>`.
pub struct ConvertTo;

static CONVERT_KEYWORD: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b(?:transform|convert)\b"));
static CONVERT_TARGET: Lazy<Regex> = Lazy::new(|| compile(r#"(?i)\bto\s+"?(\w+)"?"#));

impl PhraseMatcher for ConvertTo {
    fn name(&self) -> &'static str {
        "convert_to"
    }

    fn try_extract(&self, phrase: &str) -> Option<Fragment> {
        if !CONVERT_KEYWORD.is_match(phrase) {
            return None;
        }
        CONVERT_TARGET.captures(phrase).map(|caps| Fragment::Operation {
            operation: Operation::Transform,
            literal: Some(caps[1].to_lowercase()),
        })
    }
}

/// Operation matchers in detection priority.
pub fn operation_matchers() -> Vec<Box<dyn PhraseMatcher>> {
    vec![
        Box::new(TransformSuffix),
        Box::new(KeywordOperation::new("delete", &["delete", "remove"], Operation::Delete)),
        Box::new(KeywordOperation::new("add", &["add", "insert"], Operation::Add)),
        Box::new(KeywordOperation::new("replace", &["replace", "swap"], Operation::Replace)),
        Box::new(ConvertTo),
    ]
}

// =============================================================================
// Condition matcher
// =============================================================================

/// First `where <field> <op> <value>` fragment.
pub struct WhereClause;

const WHERE_HEAD: &str =
    r"(?i)\bwhere\s+(\w+)\s*(=|>|<|\bcontains\b|\bstarts\s+with\b|\bends\s+with\b)\s*";

static WHERE: Lazy<Regex> = Lazy::new(|| compile(WHERE_HEAD));
static QUOTED_VALUE: Lazy<Regex> = Lazy::new(|| compile(r#"^"([^"]*)""#));
static BARE_VALUE: Lazy<Regex> = Lazy::new(|| compile(&format!(r"(?i)^(.+?){VALUE_TAIL}")));

impl PhraseMatcher for WhereClause {
    fn name(&self) -> &'static str {
        "where_clause"
    }

    fn try_extract(&self, phrase: &str) -> Option<Fragment> {
        let head = WHERE.captures(phrase)?;
        let operator = ClauseOperator::from_token(&head[2])?;
        let rest = &phrase[head.get(0)?.end()..];
        let literal = match QUOTED_VALUE.captures(rest) {
            Some(caps) => caps[1].to_string(),
            None => BARE_VALUE.captures(rest)?[1].trim().to_string(),
        };
        Some(Fragment::Clause(Clause::new(&head[1], operator, literal)))
    }
}

// =============================================================================
// Literal matchers
// =============================================================================

/// `<keyword> "<x>"` or `<keyword> x`, quotes optional.
pub struct LiteralAfter {
    keyword: &'static str,
    quoted: Regex,
    bare: Regex,
}

impl LiteralAfter {
    pub fn new(keyword: &'static str) -> Self {
        Self {
            keyword,
            quoted: compile(&format!(r#"(?i)\b{keyword}\s+"([^"]*)""#)),
            bare: compile(&format!(r"(?i)\b{keyword}\s+(.+?){VALUE_TAIL}")),
        }
    }
}

impl PhraseMatcher for LiteralAfter {
    fn name(&self) -> &'static str {
        self.keyword
    }

    fn try_extract(&self, phrase: &str) -> Option<Fragment> {
        if let Some(caps) = self.quoted.captures(phrase) {
            return Some(Fragment::Literal(caps[1].to_string()));
        }
        self.bare
            .captures(phrase)
            .map(|caps| Fragment::Literal(caps[1].trim().to_string()))
    }
}

/// The first double-quoted string anywhere in the phrase.
pub struct QuotedLiteral;

static QUOTED: Lazy<Regex> = Lazy::new(|| compile(r#""([^"]*)""#));

impl PhraseMatcher for QuotedLiteral {
    fn name(&self) -> &'static str {
        "quoted"
    }

    fn try_extract(&self, phrase: &str) -> Option<Fragment> {
        QUOTED
            .captures(phrase)
            .map(|caps| Fragment::Literal(caps[1].to_string()))
    }
}

/// Literal matchers for update/replace, in priority order.
pub fn literal_matchers() -> Vec<Box<dyn PhraseMatcher>> {
    vec![
        Box::new(LiteralAfter::new("to")),
        Box::new(LiteralAfter::new("with")),
        Box::new(LiteralAfter::new("set")),
    ]
}

// =============================================================================
// Row numbers
// =============================================================================

/// Every `row <N>` occurrence.
pub struct RowNumbers;

static ROW_NUMBER: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\brows?\s+#?(\d+)\b"));

impl PhraseMatcher for RowNumbers {
    fn name(&self) -> &'static str {
        "row_numbers"
    }

    fn try_extract(&self, phrase: &str) -> Option<Fragment> {
        let rows: Vec<usize> = ROW_NUMBER
            .captures_iter(phrase)
            .filter_map(|caps| caps[1].parse().ok())
            .collect();
        (!rows.is_empty()).then_some(Fragment::Rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(m: &dyn PhraseMatcher, phrase: &str) -> Option<String> {
        match m.try_extract(phrase) {
            Some(Fragment::Literal(s)) => Some(s),
            _ => None,
        }
    }

    #[test]
    fn test_transform_suffix() {
        let frag = TransformSuffix.try_extract("Update email field to UPPERCASE where x = 1");
        assert_eq!(
            frag,
            Some(Fragment::Operation {
                operation: Operation::Transform,
                literal: Some("uppercase".to_string())
            })
        );
        assert!(TransformSuffix.try_extract("set name to upper").is_none());
    }

    #[test]
    fn test_keywords_are_whole_words() {
        let m = KeywordOperation::new("add", &["add", "insert"], Operation::Add);
        assert!(m.try_extract("Add a row with name Bob").is_some());
        assert!(m.try_extract("update address to Main St").is_none());
    }

    #[test]
    fn test_convert_requires_target() {
        assert!(ConvertTo.try_extract("convert name").is_none());
        assert_eq!(
            ConvertTo.try_extract("convert name to slug"),
            Some(Fragment::Operation {
                operation: Operation::Transform,
                literal: Some("slug".to_string())
            })
        );
    }

    #[test]
    fn test_where_bare_value() {
        let frag = WhereClause.try_extract("Update email field to uppercase where name contains John");
        assert_eq!(
            frag,
            Some(Fragment::Clause(Clause::new("name", ClauseOperator::Contains, "John")))
        );
    }

    #[test]
    fn test_where_quoted_value_and_multiword_operator() {
        let frag = WhereClause.try_extract(r#"delete where city starts with "New York" now"#);
        assert_eq!(
            frag,
            Some(Fragment::Clause(Clause::new("city", ClauseOperator::StartsWith, "New York")))
        );
    }

    #[test]
    fn test_where_value_stops_at_row_reference() {
        let frag = WhereClause.try_extract("set status to x where age > 30 in row 4");
        assert_eq!(
            frag,
            Some(Fragment::Clause(Clause::new("age", ClauseOperator::GreaterThan, "30")))
        );
    }

    #[test]
    fn test_where_first_occurrence_wins() {
        let frag = WhereClause.try_extract(r#"Update status to done where name = bob or where city = "Oslo""#);
        assert_eq!(
            frag,
            Some(Fragment::Clause(Clause::new("name", ClauseOperator::Equals, "bob")))
        );

        let frag = WhereClause.try_extract(r#"Update status to done where city = "Oslo" where name = bob"#);
        assert_eq!(
            frag,
            Some(Fragment::Clause(Clause::new("city", ClauseOperator::Equals, "Oslo")))
        );
    }

    #[test]
    fn test_where_unknown_operator() {
        assert!(WhereClause.try_extract("update x where name like bob").is_none());
    }

    #[test]
    fn test_literal_quoted_and_bare() {
        let to = LiteralAfter::new("to");
        assert_eq!(literal(&to, r#"set status to "In Review" where id = 3"#), Some("In Review".into()));
        assert_eq!(literal(&to, "update status to done where id = 3"), Some("done".into()));
        assert_eq!(literal(&to, "update name to John Smith in row 2"), Some("John Smith".into()));
        assert_eq!(literal(&to, "update name"), None);
    }

    #[test]
    fn test_literal_priority_order() {
        let phrase = r#"replace name with "Janet" where name contains Jane"#;
        let found = literal_matchers().iter().find_map(|m| literal(m.as_ref(), phrase));
        assert_eq!(found, Some("Janet".into()));
    }

    #[test]
    fn test_row_numbers_accumulate() {
        assert_eq!(
            RowNumbers.try_extract("update name in row 2 and row 5 and row 2"),
            Some(Fragment::Rows(vec![2, 5, 2]))
        );
        assert!(RowNumbers.try_extract("update everything").is_none());
    }
}
