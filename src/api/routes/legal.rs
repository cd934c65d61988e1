//! Legal Routes
//!
//! - POST /api/v1/legal/export - Render an agreement as PDF or plain text

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::api::dto::LegalExportRequest;
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::legal;

/// POST /api/v1/legal/export
///
/// Returns the rendered file as an attachment download.
pub async fn export_agreement(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LegalExportRequest>,
) -> ApiResult<Response> {
    let layout = Arc::clone(&state.layout);
    let document = tokio::task::spawn_blocking(move || {
        legal::export(req.agreement, &req.signers, req.format, &layout)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Render task failed: {}", e)))??;

    tracing::info!(
        file = %document.file_name,
        pages = document.page_count,
        "Exported agreement"
    );

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        document.file_name
    ))
    .map_err(|e| ApiError::Internal(format!("Invalid file name header: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(document.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.bytes,
    )
        .into_response())
}
