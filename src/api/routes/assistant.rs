//! Assistant Routes
//!
//! Stateless replies and chat session lifecycle.
//!
//! - POST /api/v1/assistant/respond - Reply to one message
//! - POST /api/v1/assistant/sessions - Create a chat session
//! - GET /api/v1/assistant/sessions/:id - Session snapshot
//! - POST /api/v1/assistant/sessions/:id/messages - Send a message
//! - POST /api/v1/assistant/sessions/:id/state - Open, minimize, restore or close
//! - DELETE /api/v1/assistant/sessions/:id - End a session

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{
    CreateSessionResponse, PanelActionRequest, PanelStateResponse, RespondRequest,
    RespondResponse, SendMessageRequest, SendMessageResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::assistant::{PanelState, ReplySource, SessionSnapshot};

/// POST /api/v1/assistant/respond
///
/// Select a reply without touching any session.
pub async fn respond(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RespondRequest>,
) -> ApiResult<Json<RespondResponse>> {
    if req.text.trim().is_empty() {
        return Err(ApiError::Validation("text is required".to_string()));
    }

    let reply = state.hub.responder().select(&req.text, &req.path);

    Ok(Json(RespondResponse {
        text: reply.text,
        source: source_label(&reply.source),
    }))
}

/// POST /api/v1/assistant/sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(StatusCode, Json<CreateSessionResponse>)> {
    let id = state.hub.create().await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            id,
            state: PanelState::Closed,
        }),
    ))
}

/// GET /api/v1/assistant/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionSnapshot>> {
    Ok(Json(state.hub.snapshot(&id).await?))
}

/// POST /api/v1/assistant/sessions/:id/messages
///
/// Append the user's message and the bot's reply.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let (user, reply) = state.hub.send(&id, &req.text, &req.path).await?;
    Ok(Json(SendMessageResponse { user, reply }))
}

/// POST /api/v1/assistant/sessions/:id/state
pub async fn change_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PanelActionRequest>,
) -> ApiResult<Json<PanelStateResponse>> {
    let panel = state.hub.apply(&id, req.action).await?;
    Ok(Json(PanelStateResponse { id, state: panel }))
}

/// DELETE /api/v1/assistant/sessions/:id
pub async fn end_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.hub.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn source_label(source: &ReplySource) -> String {
    match source {
        ReplySource::Topic(id) => format!("topic:{}", id),
        ReplySource::Search(_) => "search".to_string(),
        ReplySource::PathFallback(path) => format!("path:{}", path),
        ReplySource::Menu => "menu".to_string(),
    }
}
