//! REST API request/response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{LoadError, RuleError, ServerError, SessionError};
use crate::loader::LoadedTable;
use crate::models::{Row, Table};

/// Body of `POST /api/commands` and `POST /api/rules/extract`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseRequest {
    pub phrase: String,
}

/// Query of `GET /api/search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// Table snapshot sent to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResponse {
    pub fields: Vec<String>,
    pub row_count: usize,
    pub rows: Vec<Row>,
}

impl From<&Table> for TableResponse {
    fn from(table: &Table) -> Self {
        Self {
            fields: table.fields().to_vec(),
            row_count: table.len(),
            rows: table.rows().to_vec(),
        }
    }
}

/// Response to a table upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadResponse {
    pub encoding: String,
    pub delimiter: Option<String>,
    pub fields: Vec<String>,
    pub row_count: usize,
}

impl From<&LoadedTable> for LoadResponse {
    fn from(loaded: &LoadedTable) -> Self {
        Self {
            encoding: loaded.encoding.clone(),
            delimiter: loaded.delimiter.map(|d| match d {
                '\t' => "\\t".to_string(),
                c => c.to_string(),
            }),
            fields: loaded.table.fields().to_vec(),
            row_count: loaded.table.len(),
        }
    }
}

/// Response to `GET /api/commands/{id}/preview`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub id: String,
    pub affected_rows: Vec<usize>,
}

/// Create an error response body
pub fn error_response(error: &str) -> Value {
    json!({
        "status": "error",
        "error": error,
    })
}

impl ServerError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Internal(_) | ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Session(e) => match e {
                SessionError::Parse(_) => StatusCode::BAD_REQUEST,
                SessionError::RecordNotFound(_) => StatusCode::NOT_FOUND,
                SessionError::AlreadySettled { .. } => StatusCode::CONFLICT,
                SessionError::Rule(RuleError::NotFound(_)) => StatusCode::NOT_FOUND,
                SessionError::Rule(RuleError::IoError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
                SessionError::Rule(_) => StatusCode::BAD_REQUEST,
                SessionError::Load(LoadError::IoError(_)) => StatusCode::INTERNAL_SERVER_ERROR,
                SessionError::Load(_) => StatusCode::BAD_REQUEST,
            },
        }
    }
}

impl From<LoadError> for ServerError {
    fn from(err: LoadError) -> Self {
        ServerError::Session(err.into())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status(), Json(error_response(&self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServerError::from(SessionError::Parse(ParseError::EmptyCommand)), 400),
            (SessionError::RecordNotFound("x".into()).into(), 404),
            (
                SessionError::AlreadySettled {
                    id: "x".into(),
                    status: "applied".into(),
                }
                .into(),
                409,
            ),
            (SessionError::Rule(RuleError::NotFound("r".into())).into(), 404),
            (SessionError::Rule(RuleError::InvalidManifest { errors: vec![] }).into(), 400),
            (LoadError::EmptyFile.into(), 400),
            (ServerError::Internal("boom".into()), 500),
        ];
        for (err, code) in cases {
            assert_eq!(err.status().as_u16(), code, "{}", err);
        }
    }

    #[test]
    fn test_error_body() {
        let body = error_response("nope");
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "nope");
    }
}
