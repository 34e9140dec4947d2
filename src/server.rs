//! HTTP surface.
//!
//! | Route | Body | Answer |
//! |-------|------|--------|
//! | `GET /` | | welcome text |
//! | `GET /health` | | `{"status":"ok"}` |
//! | `POST /upload-and-analyze` | JSON `{"chatText"}`, `text/plain` or multipart `file` | [`AnalysisReport`] |
//! | `POST /analyze` | JSON `{"messages": [...]}` | [`AnalysisReport`] |
//! | `POST /upload` | JSON `{"chatText"}` or `text/plain` | `{"message", "stored"}` |
//!
//! The analyze routes accept `?sessions=true|false` to override session
//! grouping for one request. Missing or malformed input answers `400` with
//! `{"error": ...}`; anything else answers `500` with a generic message.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::Message;
use crate::classifier::{Classifier, build_classifier};
use crate::config::Settings;
use crate::core::{Aggregator, AnalysisReport};
use crate::error::{AnalyzerError, Result};
use crate::parser::TranscriptParser;
use crate::session::group_sessions;
use crate::store::{MessageStore, persist_best_effort};

const WELCOME: &str = "Welcome to the Message Analyzer API!";
const ANALYZE_FAILED: &str = "Failed to process and analyze chat.";
const UPLOAD_FAILED: &str = "Failed to upload chat history.";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    parser: TranscriptParser,
    aggregator: Arc<Aggregator>,
    classifier: Arc<dyn Classifier>,
    store: Option<Arc<dyn MessageStore>>,
}

impl AppState {
    pub fn new(
        parser: TranscriptParser,
        aggregator: Aggregator,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            parser,
            aggregator: Arc::new(aggregator),
            classifier,
            store: None,
        }
    }

    /// Persists parsed messages to `store`.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn MessageStore>) -> Self {
        self.store = Some(store);
        self
    }

    async fn analyze(&self, messages: &[Message], sessions: Option<bool>) -> AnalysisReport {
        let grouped = sessions.unwrap_or(self.aggregator.config().group_sessions);
        info!(messages = messages.len(), grouped, "analyzing chat");

        if grouped {
            let sessions = group_sessions(messages, self.aggregator.config().session_gap());
            self.aggregator
                .aggregate_sessions(&sessions, self.classifier.clone())
                .await
        } else {
            self.aggregator
                .aggregate_messages(messages, self.classifier.clone())
                .await
        }
    }
}

/// Builds the router. `max_body_bytes` caps every request body.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(|| async { WELCOME }))
        .route("/health", get(health))
        .route("/upload-and-analyze", post(upload_and_analyze))
        .route("/analyze", post(analyze))
        .route("/upload", post(upload))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Loads the lexicon, classifier and store described by `settings` and
/// serves until Ctrl-C.
pub async fn serve(settings: Settings) -> Result<()> {
    let lexicon = Arc::new(settings.load_lexicon()?);
    let classifier = build_classifier(&settings.classifier, lexicon.clone())?;
    let aggregator = Aggregator::with_config(lexicon, settings.analysis.clone());
    let parser = TranscriptParser::with_config(settings.parser.clone());

    let mut state = AppState::new(parser, aggregator, classifier);
    if let Some(store) = open_store(settings.server.database_url.as_deref()).await {
        state = state.with_store(store);
    }

    let app = router(state, settings.server.max_body_bytes);
    let listener = tokio::net::TcpListener::bind(settings.server.bind_address()).await?;
    info!(address = %listener.local_addr()?, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

#[cfg(feature = "sqlite")]
async fn open_store(url: Option<&str>) -> Option<Arc<dyn MessageStore>> {
    let url = url?;
    match crate::store::SqliteStore::connect(url).await {
        Ok(store) => {
            info!(url, "message store ready");
            Some(Arc::new(store))
        }
        Err(err) => {
            warn!(error = %err, "message store unavailable, continuing without persistence");
            None
        }
    }
}

#[cfg(not(feature = "sqlite"))]
async fn open_store(url: Option<&str>) -> Option<Arc<dyn MessageStore>> {
    if url.is_some() {
        warn!("DATABASE_URL is set but the 'sqlite' feature is disabled");
    }
    None
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct AnalyzeQuery {
    sessions: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatTextBody {
    chat_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesBody {
    messages: Option<Vec<Message>>,
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn upload_and_analyze(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    request: Request,
) -> std::result::Result<Json<AnalysisReport>, ApiError> {
    let text = read_chat_text(request)
        .await
        .map_err(|e| ApiError::new(e, ANALYZE_FAILED))?;

    let messages = state.parser.parse(&text);
    persist_best_effort(state.store.as_deref(), &messages).await;

    Ok(Json(state.analyze(&messages, query.sessions).await))
}

async fn analyze(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
    request: Request,
) -> std::result::Result<Json<AnalysisReport>, ApiError> {
    let invalid = || AnalyzerError::invalid_input("messages", "expected {\"messages\": [...]}");
    let Json(body) = Json::<MessagesBody>::from_request(request, &())
        .await
        .map_err(|_| ApiError::new(invalid(), ANALYZE_FAILED))?;
    let messages = body
        .messages
        .ok_or_else(|| ApiError::new(invalid(), ANALYZE_FAILED))?;

    Ok(Json(state.analyze(&messages, query.sessions).await))
}

async fn upload(
    State(state): State<AppState>,
    request: Request,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let text = read_chat_text(request)
        .await
        .map_err(|e| ApiError::new(e, UPLOAD_FAILED))?;
    let messages = state.parser.parse(&text);

    let stored = match &state.store {
        Some(store) => store
            .save_messages(&messages)
            .await
            .map_err(|e| ApiError::new(e, UPLOAD_FAILED))?,
        None => 0,
    };

    Ok(Json(json!({
        "message": "Chat history uploaded successfully!",
        "parsed": messages.len(),
        "stored": stored,
    })))
}

/// Pulls the transcript out of a JSON, multipart or plain-text body.
async fn read_chat_text(request: Request) -> Result<String> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    let text = if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AnalyzerError::invalid_input("multipart body", e.body_text()))?;
        let mut file = None;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AnalyzerError::invalid_input("multipart body", e.body_text()))?
        {
            if field.name() == Some("file") {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AnalyzerError::invalid_input("uploaded file", e.body_text()))?;
                file = Some(text);
                break;
            }
        }
        file.ok_or(AnalyzerError::missing_input("File"))?
    } else if content_type.starts_with("application/json") {
        let Json(body) = Json::<ChatTextBody>::from_request(request, &())
            .await
            .map_err(|e| AnalyzerError::invalid_input("request body", e.body_text()))?;
        body.chat_text.unwrap_or_default()
    } else {
        String::from_request(request, &())
            .await
            .map_err(|e| AnalyzerError::invalid_input("request body", e.body_text()))?
    };

    if text.trim().is_empty() {
        return Err(AnalyzerError::missing_input("Chat text"));
    }
    Ok(text)
}

// ============================================================================
// Errors
// ============================================================================

/// Maps [`AnalyzerError`] to an HTTP answer.
#[derive(Debug)]
pub struct ApiError {
    error: AnalyzerError,
    fallback: &'static str,
}

impl ApiError {
    fn new(error: AnalyzerError, fallback: &'static str) -> Self {
        Self { error, fallback }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.error.is_client_error() {
            warn!(error = %self.error, "rejected request");
            let body = Json(json!({ "error": self.error.to_string() }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        error!(error = %self.error, "request failed");
        let body = Json(json!({ "error": self.fallback }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
