//! Rule extraction from phrases like `Email field must contain "@"`.
//!
//! The payload is the first double-quoted string; the operator comes from a
//! fixed phrase table (longest phrase wins, default `equals`). One draft is
//! produced for every known field named in the phrase.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{RuleAction, RuleDraft, RuleOperator};
use crate::error::{ParseError, ParseResult};

static QUOTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]*)""#).expect("Invalid quoted regex"));

/// Word-bounded pattern over a squashed phrase.
fn word_pattern(words: &str) -> Regex {
    Regex::new(&format!(r"\b{}\b", regex::escape(words)))
        .unwrap_or_else(|e| panic!("invalid rule phrase {words}: {e}"))
}

/// Phrase → operator table, longest phrases first.
static OPERATOR_PHRASES: Lazy<Vec<(Regex, RuleOperator)>> = Lazy::new(|| {
    let mut table = vec![
        ("must be", RuleOperator::Equals),
        ("should be", RuleOperator::Equals),
        ("cannot be", RuleOperator::NotEquals),
        ("must contain", RuleOperator::Contains),
        ("cannot contain", RuleOperator::NotContains),
        ("must start with", RuleOperator::StartsWith),
        ("must end with", RuleOperator::EndsWith),
        ("must be greater than", RuleOperator::GreaterThan),
        ("must be less than", RuleOperator::LessThan),
        ("cannot be empty", RuleOperator::IsNotEmpty),
        ("must be empty", RuleOperator::IsEmpty),
    ];
    table.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    table
        .into_iter()
        .map(|(words, op)| (word_pattern(words), op))
        .collect()
});

/// Keyword → action table, checked in order.
static ACTION_WORDS: Lazy<Vec<(Regex, RuleAction)>> = Lazy::new(|| {
    [
        ("reject", RuleAction::Reject),
        ("highlight", RuleAction::Highlight),
        ("auto-correct", RuleAction::AutoCorrect),
        ("auto correct", RuleAction::AutoCorrect),
        ("correct", RuleAction::AutoCorrect),
        ("fix", RuleAction::AutoCorrect),
        ("transform", RuleAction::Transform),
        ("convert", RuleAction::Transform),
        ("flag", RuleAction::Flag),
    ]
    .into_iter()
    .map(|(word, action)| (word_pattern(word), action))
    .collect()
});

/// Collapse whitespace and lowercase, so phrase lookups ignore spacing.
fn squash(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Operator named by the phrase, `equals` when none is.
pub fn detect_operator(phrase: &str) -> RuleOperator {
    let text = squash(phrase);
    OPERATOR_PHRASES
        .iter()
        .find(|(pattern, _)| pattern.is_match(&text))
        .map(|(_, op)| *op)
        .unwrap_or(RuleOperator::Equals)
}

/// Action named by the phrase, `flag` when none is.
pub fn detect_action(phrase: &str) -> RuleAction {
    let text = squash(phrase);
    ACTION_WORDS
        .iter()
        .find(|(pattern, _)| pattern.is_match(&text))
        .map(|(_, action)| *action)
        .unwrap_or_default()
}

/// Fields whose names occur in the phrase, in field-set order.
///
/// Quoted payloads are ignored so a value cannot name a field.
pub fn mentioned_fields(phrase: &str, fields: &[String]) -> Vec<String> {
    let text = squash(&QUOTED.replace_all(phrase, " "));
    fields
        .iter()
        .filter(|field| {
            let name = squash(field);
            !name.is_empty() && (text.contains(&name) || text.contains(&name.replace('_', " ")))
        })
        .cloned()
        .collect()
}

fn title_case(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build one rule draft per field mentioned in `phrase`.
///
/// Fails with the available field list when the phrase names no known field.
pub fn extract_rules(phrase: &str, fields: &[String]) -> ParseResult<Vec<RuleDraft>> {
    let phrase = phrase.trim();
    if phrase.is_empty() {
        return Err(ParseError::EmptyCommand);
    }

    let targets = mentioned_fields(phrase, fields);
    if targets.is_empty() {
        return Err(ParseError::FieldNotFound {
            available: fields.to_vec(),
        });
    }

    let operator = detect_operator(phrase);
    let action = detect_action(phrase);
    let value = QUOTED
        .captures(phrase)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();

    Ok(targets
        .into_iter()
        .map(|field| RuleDraft {
            name: format!("{} {}", title_case(&field), operator.label()),
            description: phrase.to_string(),
            field,
            operator,
            value: value.clone(),
            action,
            priority: 1,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_field_contains() {
        let drafts = extract_rules(r#"Email field must contain "@""#, &fields(&["name", "email"])).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].field, "email");
        assert_eq!(drafts[0].operator, RuleOperator::Contains);
        assert_eq!(drafts[0].value, "@");
        assert_eq!(drafts[0].action, RuleAction::Flag);
        assert_eq!(drafts[0].name, "Email contains");
    }

    #[test]
    fn test_longest_phrase_wins() {
        assert_eq!(detect_operator("age must be greater than \"18\""), RuleOperator::GreaterThan);
        assert_eq!(detect_operator("age must be less than 5"), RuleOperator::LessThan);
        assert_eq!(detect_operator("notes cannot be empty"), RuleOperator::IsNotEmpty);
        assert_eq!(detect_operator("notes must be empty"), RuleOperator::IsEmpty);
        assert_eq!(detect_operator("status cannot be \"x\""), RuleOperator::NotEquals);
        assert_eq!(detect_operator("code must   start with \"A\""), RuleOperator::StartsWith);
        assert_eq!(detect_operator("zip must end with \"0\""), RuleOperator::EndsWith);
        assert_eq!(detect_operator("tier should be \"gold\""), RuleOperator::Equals);
        assert_eq!(detect_operator("country must be \"FR\""), RuleOperator::Equals);
        assert_eq!(detect_operator("country is \"FR\""), RuleOperator::Equals);
    }

    #[test]
    fn test_one_draft_per_mentioned_field() {
        let drafts = extract_rules(
            r##"first name and city cannot contain "#""##,
            &fields(&["first_name", "city", "zip"]),
        )
        .unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].field, "first_name");
        assert_eq!(drafts[1].field, "city");
        assert!(drafts.iter().all(|d| d.operator == RuleOperator::NotContains && d.value == "#"));
        assert_eq!(drafts[0].description, drafts[1].description);
    }

    #[test]
    fn test_quoted_value_does_not_name_a_field() {
        let drafts = extract_rules(r#"status must be "city""#, &fields(&["status", "city"])).unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].field, "status");
    }

    #[test]
    fn test_action_detection() {
        assert_eq!(detect_action("reject rows where email cannot be empty"), RuleAction::Reject);
        assert_eq!(detect_action("highlight when score must be less than 3"), RuleAction::Highlight);
        assert_eq!(detect_action("auto-correct: name must start with \"A\""), RuleAction::AutoCorrect);
        assert_eq!(detect_action("email must contain \"@\""), RuleAction::Flag);
    }

    #[test]
    fn test_no_field_is_parse_failure() {
        let err = extract_rules("must be \"x\"", &fields(&["a_b"])).unwrap_err();
        assert!(matches!(err, ParseError::FieldNotFound { .. }));
    }
}
