//! REST API endpoint handlers.
//!
//! Each handler forwards to the session worker and maps channel loss to
//! 503: the worker disappearing means the process is shutting down, and
//! there is nothing a browser can do about it but retry later.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use banter_rs::monitor::{MemorySnapshot, status_report};
use banter_rs::prelude::{ChatTurn, GenerationOptions, SessionHandle};

/// Shared application state passed to all handlers via axum's `State`
/// extractor.
#[derive(Clone)]
pub struct AppState {
    pub handle: SessionHandle,
}

/// Request body for POST /api/chat. Sampling knobs are optional; whatever is
/// omitted falls back to the defaults, and everything is clamped server-side
/// regardless.
#[derive(Deserialize, Debug)]
pub struct ChatRequest {
    pub message: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

impl ChatRequest {
    fn options(&self) -> GenerationOptions {
        let defaults = GenerationOptions::default();
        GenerationOptions {
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            top_p: self.top_p.unwrap_or(defaults.top_p),
        }
    }
}

/// Response body for POST /api/chat: the reply plus the conversation as it
/// stands after the append, ready to render.
#[derive(Serialize, Debug)]
pub struct ChatResponse {
    pub response: String,
    pub history: Vec<ChatTurn>,
}

/// POST /api/chat — Send a user message and wait for the reply.
///
/// Returns 400 for an empty or whitespace-only message (no turn is
/// consumed), 503 if the worker is gone.
pub async fn post_chat(
    State(app): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    if body.message.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    debug!("chat request: {} chars", body.message.len());

    let options = body.options();
    let reply = app
        .handle
        .generate(body.message, options)
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(ChatResponse {
        response: reply.response,
        history: reply.history,
    }))
}

/// POST /api/reset — Clear the conversation and reset the session.
///
/// Returns 204 on success.
pub async fn post_reset(State(app): State<AppState>) -> StatusCode {
    match app.handle.reset().await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Response body for GET /api/memory.
#[derive(Serialize, Debug)]
pub struct MemoryStatus {
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<MemorySnapshot>,
    /// Preformatted status block, ready to display as-is.
    pub status: String,
}

/// GET /api/memory — Device memory stats.
///
/// `available` is false when no accelerator is present; the status text
/// says so instead of erroring.
pub async fn get_memory(State(app): State<AppState>) -> Result<Json<MemoryStatus>, StatusCode> {
    let snapshot = app
        .handle
        .memory()
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(MemoryStatus {
        available: snapshot.is_some(),
        status: status_report(snapshot.as_ref()),
        snapshot,
    }))
}

/// Response body for GET /api/history.
#[derive(Serialize, Debug)]
pub struct HistoryResponse {
    pub turns: usize,
    pub history: Vec<ChatTurn>,
}

/// GET /api/history — The conversation as it stands.
pub async fn get_history(State(app): State<AppState>) -> Result<Json<HistoryResponse>, StatusCode> {
    let history = app
        .handle
        .history()
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(HistoryResponse {
        turns: history.len(),
        history,
    }))
}
