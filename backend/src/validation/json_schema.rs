//! JSON Schema (draft 7) checks for JSON documents exchanged with the engine.

use serde_json::Value;

/// Validate a JSON document against a JSON schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
///
/// # Example
/// ```
/// use serde_json::json;
/// use tabletalk::validation::json_schema::validate;
///
/// let schema = json!({
///     "type": "object",
///     "required": ["name"],
///     "properties": {
///         "name": { "type": "string" }
///     }
/// });
///
/// assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
/// assert!(validate(&schema, &json!({ "age": 42 })).is_err());
/// ```
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator
        .iter_errors(data)
        .map(|e| e.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Quick yes/no variant of [`validate`].
pub fn is_valid(schema: &Value, data: &Value) -> bool {
    jsonschema::draft7::is_valid(schema, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reports_every_violation() {
        let schema = json!({
            "type": "object",
            "required": ["version", "rules"],
            "properties": { "version": { "type": "string" } }
        });
        let errors = validate(&schema, &json!({ "version": 1 })).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(!is_valid(&schema, &json!({})));
        assert!(is_valid(&schema, &json!({ "version": "1.0", "rules": [] })));
    }

    #[test]
    fn test_invalid_schema_is_an_error() {
        let schema = json!({ "type": 12 });
        let errors = validate(&schema, &json!({})).unwrap_err();
        assert!(errors[0].starts_with("Invalid schema"));
    }
}
