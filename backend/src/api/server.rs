//! HTTP Server for the TableTalk API.
//!
//! One [`Session`] is shared by every request behind a mutex, so applies are
//! serialized.
//!
//! # API Endpoints
//!
//! | Method | Path                          | Description                         |
//! |--------|-------------------------------|-------------------------------------|
//! | GET    | `/health`                     | Health check                        |
//! | POST   | `/api/table`                  | Upload CSV/JSON (multipart `file`)  |
//! | PUT    | `/api/table`                  | Load table from a JSON array        |
//! | GET    | `/api/table`                  | Current table snapshot              |
//! | POST   | `/api/commands`               | Parse phrase → pending record       |
//! | GET    | `/api/commands`               | Modification history                |
//! | GET    | `/api/commands/{id}/preview`  | Dry-run row selection               |
//! | POST   | `/api/commands/{id}/apply`    | Apply a pending record              |
//! | POST   | `/api/rules`                  | Add a rule                          |
//! | GET    | `/api/rules`                  | List rules                          |
//! | POST   | `/api/rules/extract`          | Extract rules from a phrase         |
//! | POST   | `/api/rules/{id}/toggle`      | Enable/disable a rule               |
//! | DELETE | `/api/rules/{id}`             | Delete a rule                       |
//! | GET    | `/api/rules/export`           | Rules manifest                      |
//! | POST   | `/api/rules/import`           | Import a rules manifest             |
//! | GET    | `/api/validation`             | Infer schema and validate           |
//! | GET    | `/api/search?q=`              | Ranked search                       |
//! | GET    | `/api/logs`                   | SSE stream for real-time logs       |

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, Method},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, log_success, LOG_BROADCASTER};
use super::types::{LoadResponse, PhraseRequest, PreviewResponse, SearchParams, TableResponse};
use crate::command::ModificationRecord;
use crate::config::Config;
use crate::error::{ServerError, ServerResult};
use crate::loader::{load_upload, table_from_value};
use crate::rules::{Rule, RuleDraft, RulesManifest};
use crate::search::SearchResult;
use crate::session::Session;
use crate::validation::ValidationReport;

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::from_config(config))),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::<AppState>::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/table", get(get_table).put(put_table).post(upload_table))
        .route("/api/commands", get(list_commands).post(submit_command))
        .route("/api/commands/{id}/preview", get(preview_command))
        .route("/api/commands/{id}/apply", post(apply_command))
        .route("/api/rules", get(list_rules).post(add_rule))
        .route("/api/rules/extract", post(extract_rules))
        .route("/api/rules/export", get(export_rules))
        .route("/api/rules/import", post(import_rules))
        .route("/api/rules/{id}", axum::routing::delete(delete_rule))
        .route("/api/rules/{id}/toggle", post(toggle_rule))
        .route("/api/validation", get(validation))
        .route("/api/search", get(search))
        .route("/api/logs", get(sse_logs))
        .layer(body_limit)
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> ServerResult<()> {
    let addr = config.addr();
    let app = router(AppState::new(&config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    log_success(format!("TableTalk server running on http://{}", addr));
    log_info("   POST /api/table    - Upload CSV/JSON table");
    log_info("   POST /api/commands - Submit a text command");
    log_info("   GET  /api/logs     - SSE log stream");
    log_info("   GET  /health       - Health check");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tabletalk",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// =============================================================================
// Table
// =============================================================================

async fn upload_table(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ServerResult<Json<LoadResponse>> {
    let mut file: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("file") {
            let name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
            file = Some((name, bytes.to_vec()));
        }
    }

    let (name, bytes) = file.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    log_info(format!(
        "Upload: {} ({} bytes)",
        name.as_deref().unwrap_or("unnamed"),
        bytes.len()
    ));

    let loaded = load_upload(&bytes, name.as_deref())?;
    let response = LoadResponse::from(&loaded);
    state.session.lock().await.load(loaded.table);
    Ok(Json(response))
}

async fn put_table(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ServerResult<Json<TableResponse>> {
    let table = table_from_value(body)?;
    let mut session = state.session.lock().await;
    Ok(Json(TableResponse::from(session.load(table))))
}

async fn get_table(State(state): State<AppState>) -> Json<TableResponse> {
    let session = state.session.lock().await;
    Json(TableResponse::from(session.table()))
}

// =============================================================================
// Commands
// =============================================================================

async fn submit_command(
    State(state): State<AppState>,
    Json(req): Json<PhraseRequest>,
) -> ServerResult<Json<ModificationRecord>> {
    let record = state.session.lock().await.submit(&req.phrase)?;
    Ok(Json(record))
}

async fn list_commands(State(state): State<AppState>) -> Json<Vec<ModificationRecord>> {
    let session = state.session.lock().await;
    Json(session.history().records().to_vec())
}

async fn preview_command(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<PreviewResponse>> {
    let affected_rows = state.session.lock().await.preview(&id)?;
    Ok(Json(PreviewResponse { id, affected_rows }))
}

async fn apply_command(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<ModificationRecord>> {
    let record = state.session.lock().await.apply(&id)?;
    Ok(Json(record))
}

// =============================================================================
// Rules
// =============================================================================

async fn add_rule(
    State(state): State<AppState>,
    Json(draft): Json<RuleDraft>,
) -> ServerResult<Json<Rule>> {
    let rule = state.session.lock().await.add_rule(draft)?;
    Ok(Json(rule))
}

async fn extract_rules(
    State(state): State<AppState>,
    Json(req): Json<PhraseRequest>,
) -> ServerResult<Json<Vec<Rule>>> {
    let rules = state.session.lock().await.extract_rules(&req.phrase)?;
    Ok(Json(rules))
}

async fn list_rules(State(state): State<AppState>) -> Json<Vec<Rule>> {
    let session = state.session.lock().await;
    Json(session.rules().list().into_iter().cloned().collect())
}

async fn toggle_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Rule>> {
    let rule = state.session.lock().await.toggle_rule(&id)?;
    Ok(Json(rule))
}

async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<Rule>> {
    let rule = state.session.lock().await.delete_rule(&id)?;
    Ok(Json(rule))
}

async fn export_rules(State(state): State<AppState>) -> Json<RulesManifest> {
    let session = state.session.lock().await;
    Json(session.rules().manifest())
}

async fn import_rules(
    State(state): State<AppState>,
    Json(manifest): Json<Value>,
) -> ServerResult<Json<Vec<Rule>>> {
    let rules = state.session.lock().await.import_rules(&manifest)?;
    Ok(Json(rules))
}

// =============================================================================
// Analysis
// =============================================================================

async fn validation(State(state): State<AppState>) -> Json<ValidationReport> {
    let session = state.session.lock().await;
    Json(session.validate())
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchResult>> {
    let mut results = state.session.lock().await.search(&params.q);
    if let Some(limit) = params.limit {
        results.truncate(limit);
    }
    Json(results)
}
