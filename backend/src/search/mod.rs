//! Free-text row search.
//!
//! A query is split into `field:value` filters (when `field` names a known
//! field) and plain keywords. Rows are scored:
//!
//! | Match                                        | Points |
//! |----------------------------------------------|--------|
//! | filter value occurs in its field             | +10    |
//! | keyword occurs in a field (per field)        | +5     |
//! | field value equals the whole trimmed query   | +20    |
//!
//! All comparisons are case-insensitive. Rows scoring zero are dropped and the
//! rest are ranked by descending score, ties keeping table order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::command::resolver::normalize;
use crate::models::{Row, Table};

const FILTER_SCORE: u32 = 10;
const KEYWORD_SCORE: u32 = 5;
const EXACT_SCORE: u32 = 20;

/// Keywords shorter than this are ignored
const MIN_KEYWORD_LEN: usize = 3;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W+").expect("Invalid word regex"));

/// `field:value` restriction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub field: String,
    /// Lowercased
    pub value: String,
}

/// Parsed query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Trimmed, lowercased full query
    pub raw: String,
    pub filters: Vec<SearchFilter>,
    /// Lowercased, punctuation-free
    pub keywords: Vec<String>,
}

impl SearchQuery {
    /// Split a query against the table's field set.
    pub fn parse(query: &str, fields: &[String]) -> Self {
        let raw = query.trim().to_lowercase();
        let mut filters = Vec::new();
        let mut keywords = Vec::new();

        for token in query.split_whitespace() {
            if let Some(filter) = parse_filter(token, fields) {
                filters.push(filter);
                continue;
            }
            let word = NON_WORD.replace_all(token, "").to_lowercase();
            if word.chars().count() >= MIN_KEYWORD_LEN {
                keywords.push(word);
            }
        }

        Self {
            raw,
            filters,
            keywords,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

fn parse_filter(token: &str, fields: &[String]) -> Option<SearchFilter> {
    let (name, value) = token.split_once(':')?;
    if name.is_empty() || value.is_empty() {
        return None;
    }
    let wanted = normalize(name);
    let field = fields
        .iter()
        .find(|f| f.eq_ignore_ascii_case(name))
        .or_else(|| fields.iter().find(|f| normalize(f) == wanted))?;
    Some(SearchFilter {
        field: field.clone(),
        value: value.to_lowercase(),
    })
}

/// One ranked row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub row_number: usize,
    pub row: Row,
    pub score: u32,
    pub matched_fields: Vec<String>,
    pub highlight_text: String,
}

/// Score one row; returns the score and the contributing fields.
fn score_row(row: &Row, fields: &[String], query: &SearchQuery) -> (u32, Vec<String>) {
    let mut score = 0;
    let mut matched = Vec::new();

    for field in fields {
        let text = row.text(field).to_lowercase();
        let mut hit = false;

        for filter in query.filters.iter().filter(|f| &f.field == field) {
            if text.contains(&filter.value) {
                score += FILTER_SCORE;
                hit = true;
            }
        }
        for keyword in &query.keywords {
            if text.contains(keyword.as_str()) {
                score += KEYWORD_SCORE;
                hit = true;
            }
        }
        if !query.raw.is_empty() && text.trim() == query.raw {
            score += EXACT_SCORE;
            hit = true;
        }

        if hit {
            matched.push(field.clone());
        }
    }

    (score, matched)
}

/// Fields scored: the table's field set plus any extra keys of the row.
fn row_fields(table: &Table, row: &Row) -> Vec<String> {
    let mut fields = table.fields().to_vec();
    for key in row.keys() {
        if !fields.contains(key) {
            fields.push(key.clone());
        }
    }
    fields
}

/// Rank the rows of `table` against a free-text query.
pub fn search(table: &Table, query: &str) -> Vec<SearchResult> {
    let query = SearchQuery::parse(query, table.fields());
    if query.is_empty() {
        return Vec::new();
    }

    let mut results: Vec<SearchResult> = table
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| {
            let (score, matched_fields) = score_row(row, &row_fields(table, row), &query);
            if score == 0 {
                return None;
            }
            let highlight_text = matched_fields
                .iter()
                .map(|f| format!("{}: {}", f, row.text(f)))
                .collect::<Vec<_>>()
                .join(" | ");
            Some(SearchResult {
                row_number: idx + 1,
                row: row.clone(),
                score,
                matched_fields,
                highlight_text,
            })
        })
        .collect();

    // sort_by is stable: equal scores keep table order
    results.sort_by(|a, b| b.score.cmp(&a.score));
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> Table {
        Table::from_rows(vec![
            Row::from_pairs([("name", json!("John Smith")), ("notes", json!("urgent review"))]),
            Row::from_pairs([("name", json!("Ann Lee")), ("notes", json!("call back"))]),
            Row::from_pairs([("name", json!("Johnny")), ("notes", json!("urgent"))]),
        ])
    }

    #[test]
    fn test_query_parsing() {
        let fields = vec!["first_name".to_string(), "notes".to_string()];
        let q = SearchQuery::parse("First Name:Jo  zip:123 hi urgent! re-view", &fields);
        assert!(q.filters.is_empty());

        let q = SearchQuery::parse("FIRST_NAME:Jo zip:123 hi urgent! re-view", &fields);
        assert_eq!(
            q.filters,
            vec![SearchFilter {
                field: "first_name".into(),
                value: "jo".into()
            }]
        );
        assert_eq!(q.keywords, vec!["zip123", "urgent", "review"]);
    }

    #[test]
    fn test_filter_and_keyword_score() {
        let results = search(&table(), "name:john urgent");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].row_number, 1);
        assert!(results[0].score >= 15);
        assert_eq!(results[0].matched_fields, vec!["name", "notes"]);
        assert_eq!(results[0].highlight_text, "name: John Smith | notes: urgent review");
    }

    #[test]
    fn test_exact_match_bonus() {
        let results = search(&table(), "  Ann Lee ");
        assert_eq!(results[0].row_number, 2);
        // "ann" +5, "lee" +5, exact +20
        assert_eq!(results[0].score, 30);
    }

    #[test]
    fn test_ties_keep_table_order() {
        let results = search(&table(), "john");
        let rows: Vec<_> = results.iter().map(|r| r.row_number).collect();
        assert_eq!(rows, vec![1, 3]);

        // exact match on row 3 outranks the keyword-only row 1
        let results = search(&table(), "urgent");
        let rows: Vec<_> = results.iter().map(|r| r.row_number).collect();
        assert_eq!(rows, vec![3, 1]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_no_match_is_empty() {
        assert!(search(&table(), "zebra").is_empty());
        assert!(search(&table(), "   ").is_empty());
        assert!(search(&Table::default(), "john").is_empty());
    }
}
