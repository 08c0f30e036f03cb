//! Field resolution: map free text onto a known column name.
//!
//! Both sides are normalized (whitespace and underscores removed, lowercased)
//! and a field matches when the normalized text contains the normalized name.
//! The first matching field in field-set order wins.

use crate::error::{ParseError, ParseResult};

/// Normalize a field name or a phrase for matching.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Find the first field whose normalized name occurs in `text`.
pub fn find_field<'a>(fields: &'a [String], text: &str) -> Option<&'a str> {
    let haystack = normalize(text);
    fields
        .iter()
        .find(|field| {
            let needle = normalize(field);
            !needle.is_empty() && haystack.contains(&needle)
        })
        .map(String::as_str)
}

/// Resolve `text` to a field, failing with the list of available fields.
pub fn resolve_field(fields: &[String], text: &str) -> ParseResult<String> {
    find_field(fields, text)
        .map(str::to_string)
        .ok_or_else(|| ParseError::FieldNotFound {
            available: fields.to_vec(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("First_Name  Field"), "firstnamefield");
    }

    #[test]
    fn test_underscore_and_spaces_match() {
        let f = fields(&["id", "first_name"]);
        assert_eq!(resolve_field(&f, "update First Name to Bob").unwrap(), "first_name");
    }

    #[test]
    fn test_first_match_wins() {
        // "name" is declared before "username"; both occur in the phrase
        let f = fields(&["name", "username"]);
        assert_eq!(resolve_field(&f, "set username to x").unwrap(), "name");

        let f = fields(&["username", "name"]);
        assert_eq!(resolve_field(&f, "set username to x").unwrap(), "username");
    }

    #[test]
    fn test_not_found_lists_fields() {
        let f = fields(&["name", "email"]);
        let err = resolve_field(&f, "delete everything").unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldNotFound {
                available: f.clone()
            }
        );
    }

    #[test]
    fn test_empty_field_name_never_matches() {
        let f = fields(&["", "_", "city"]);
        assert_eq!(find_field(&f, "move city"), Some("city"));
    }

    #[test]
    fn test_deterministic() {
        let f = fields(&["a_b", "ab", "status"]);
        let first = resolve_field(&f, "Status of AB");
        for _ in 0..5 {
            assert_eq!(resolve_field(&f, "Status of AB"), first);
        }
    }
}
