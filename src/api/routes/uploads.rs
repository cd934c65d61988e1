//! Upload Routes
//!
//! File and recording uploads, attachment listing and signed access.
//!
//! - POST /api/v1/uploads - Upload one base64 file
//! - POST /api/v1/recordings - Upload recorded chunks as one file
//! - GET /api/v1/uploads/status/:key - Lifecycle state of a control's last request
//! - GET /api/v1/owners/:owner/attachments - List attachments
//! - GET /api/v1/owners/:owner/attachments/:id/signed-url - Time-limited link
//! - DELETE /api/v1/owners/:owner/attachments/:id - Remove object and record
//! - GET /api/v1/signed/:token - Download through a signed link
//! - GET /objects/*path - Download through an attachment's public URL

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::Arc;

use crate::api::dto::{
    AttachmentListParams, AttachmentListResponse, RecordingUploadRequest, RequestStatusResponse,
    UploadFileRequest,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::{Download, RecordingBuffer, SignedUrl, StoredAttachment, UploadRequest};

/// POST /api/v1/uploads
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadFileRequest>,
) -> ApiResult<(StatusCode, Json<StoredAttachment>)> {
    let bytes = decode("data_base64", &req.data_base64)?;

    let stored = state
        .attachments
        .upload(UploadRequest {
            owner_id: req.owner_id,
            control_key: req.control_key,
            file_name: req.file_name,
            content_type: req.content_type,
            category: req.category,
            tier: req.tier,
            bytes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(stored)))
}

/// POST /api/v1/recordings
pub async fn upload_recording(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecordingUploadRequest>,
) -> ApiResult<(StatusCode, Json<StoredAttachment>)> {
    let mut recording = RecordingBuffer::new(req.content_type);
    for (i, chunk) in req.chunks_base64.iter().enumerate() {
        recording.push(decode(&format!("chunks_base64[{}]", i), chunk)?);
    }

    let stored = state
        .attachments
        .upload_recording(
            &req.owner_id,
            &req.control_key,
            &req.file_name,
            req.tier,
            recording,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(stored)))
}

/// GET /api/v1/uploads/status/:key
pub async fn request_status(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<RequestStatusResponse>> {
    let status = state.attachments.request_state(&key)?;
    Ok(Json(RequestStatusResponse {
        control_key: key,
        status,
    }))
}

/// GET /api/v1/owners/:owner/attachments
pub async fn list_attachments(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
    Query(params): Query<AttachmentListParams>,
) -> ApiResult<Json<AttachmentListResponse>> {
    let attachments = state.attachments.list(&owner, params.category)?;

    Ok(Json(AttachmentListResponse {
        total: attachments.len(),
        attachments,
    }))
}

/// GET /api/v1/owners/:owner/attachments/:id/signed-url
pub async fn signed_url(
    State(state): State<Arc<AppState>>,
    Path((owner, id)): Path<(String, String)>,
) -> ApiResult<Json<SignedUrl>> {
    Ok(Json(state.attachments.signed_url(&owner, &id).await?))
}

/// DELETE /api/v1/owners/:owner/attachments/:id
pub async fn delete_attachment(
    State(state): State<Arc<AppState>>,
    Path((owner, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.attachments.delete(&owner, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/signed/:token
pub async fn download_signed(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> ApiResult<Response> {
    let download = state.attachments.download_signed(&token).await?;
    inline_file(download)
}

/// GET /objects/*path
///
/// Target of the `public_url` returned for every attachment.
pub async fn download_public(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
) -> ApiResult<Response> {
    let download = state.attachments.download_public(&path).await?;
    inline_file(download)
}

fn inline_file(download: Download) -> ApiResult<Response> {
    let content_type = HeaderValue::from_str(&download.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "inline; filename=\"{}\"",
        crate::storage::sanitize_file_name(&download.file_name)
    ))
    .map_err(|e| ApiError::Internal(format!("Invalid file name header: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response())
}

fn decode(field: &str, data: &str) -> ApiResult<Vec<u8>> {
    STANDARD
        .decode(data.trim())
        .map_err(|e| ApiError::Validation(format!("{} is not valid base64: {}", field, e)))
}
