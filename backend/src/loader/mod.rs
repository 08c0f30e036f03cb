//! Table loader with encoding and delimiter auto-detection.
//!
//! Turns CSV bytes or a JSON array of objects into a [`Table`]. CSV values
//! are kept as trimmed strings; JSON scalars keep their type.

use serde_json::Value;
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::models::{Row, Table};

/// Candidate CSV separators, in tie-break order
const SEPARATORS: [char; 4] = [';', ',', '\t', '|'];

/// A loaded table with ingestion metadata
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: Table,
    /// Detected encoding (`utf-8` for JSON input)
    pub encoding: String,
    /// Detected delimiter (`None` for JSON input)
    pub delimiter: Option<char>,
    /// Column headers, or the first row's keys for JSON
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes with the given encoding; unknown encodings decode as lossy UTF-8
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = SEPARATORS[0];
    let mut best_count = 0;
    for sep in SEPARATORS {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }
    best_sep
}

/// Parse decoded CSV text with an explicit delimiter.
///
/// Short records are padded with `""`; cells past the header are dropped.
pub fn parse_csv_str(content: &str, delimiter: char) -> LoadResult<(Vec<String>, Table)> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(Row::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), Value::String(record.get(i).unwrap_or("").to_string()))),
        ));
    }

    let table = Table::with_fields(headers.clone(), rows);
    Ok((headers, table))
}

/// Load CSV bytes with auto-detection of encoding and delimiter.
pub fn load_csv_bytes(bytes: &[u8]) -> LoadResult<LoadedTable> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(LoadError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = detect_delimiter(content);
    let (headers, table) = parse_csv_str(content, delimiter)?;

    Ok(LoadedTable {
        table,
        encoding,
        delimiter: Some(delimiter),
        headers,
    })
}

/// Load a JSON array of objects.
///
/// The field set is taken from the first object.
pub fn load_json(content: &str) -> LoadResult<LoadedTable> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let value: Value = serde_json::from_str(content)?;
    let table = table_from_value(value)?;
    let headers = table.fields().to_vec();

    Ok(LoadedTable {
        table,
        encoding: "utf-8".to_string(),
        delimiter: None,
        headers,
    })
}

/// Build a table from a JSON array of objects.
pub fn table_from_value(value: Value) -> LoadResult<Table> {
    let Value::Array(items) = value else {
        return Err(LoadError::Json("expected an array of objects".to_string()));
    };

    let rows = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(cells) => Ok(Row::from_object(cells)),
            other => Err(LoadError::Json(format!(
                "item {} is not an object: {}",
                i + 1,
                other
            ))),
        })
        .collect::<LoadResult<Vec<Row>>>()?;

    Ok(Table::from_rows(rows))
}

/// Load any supported file: `.json` as a JSON array, everything else as CSV.
pub fn load_path<P: AsRef<Path>>(path: P) -> LoadResult<LoadedTable> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;

    let is_json = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        load_json(&String::from_utf8_lossy(&bytes))
    } else {
        load_csv_bytes(&bytes)
    }
}

/// Load uploaded bytes, picking the format from the file name or the content.
pub fn load_upload(bytes: &[u8], file_name: Option<&str>) -> LoadResult<LoadedTable> {
    let named_json = file_name.is_some_and(|n| n.to_lowercase().ends_with(".json"));
    let looks_json = bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'[');

    if named_json || (file_name.is_none() && looks_json) {
        load_json(&String::from_utf8_lossy(bytes))
    } else {
        load_csv_bytes(bytes)
    }
}
