//! Contributor Routes
//!
//! - POST /api/v1/owners/:owner/contributors - Invite a contributor
//! - GET /api/v1/owners/:owner/contributors - List contributors
//! - DELETE /api/v1/owners/:owner/contributors/:id - Remove a contributor

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::api::dto::{ContributorListResponse, InviteContributorRequest};
use crate::api::error::{ApiError, ApiResult, ALREADY_INVITED};
use crate::api::state::AppState;
use crate::storage::{Contributor, NewContributor, StorageError};

/// POST /api/v1/owners/:owner/contributors
pub async fn invite_contributor(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
    Json(req): Json<InviteContributorRequest>,
) -> ApiResult<(StatusCode, Json<Contributor>)> {
    let contributor = NewContributor {
        email: req.email,
        name: req.name,
        role: req.role,
    }
    .into_contributor(&owner)?;

    match state.attachments.records().insert_contributor(&contributor) {
        Ok(()) => {}
        Err(StorageError::Duplicate(_)) => {
            return Err(ApiError::Duplicate(ALREADY_INVITED.to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(
        owner = %owner,
        id = %contributor.id,
        role = contributor.role.as_str(),
        "Invited contributor"
    );

    Ok((StatusCode::CREATED, Json(contributor)))
}

/// GET /api/v1/owners/:owner/contributors
pub async fn list_contributors(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
) -> ApiResult<Json<ContributorListResponse>> {
    let contributors = state.attachments.records().list_contributors(&owner)?;

    Ok(Json(ContributorListResponse {
        total: contributors.len(),
        contributors,
    }))
}

/// DELETE /api/v1/owners/:owner/contributors/:id
pub async fn remove_contributor(
    State(state): State<Arc<AppState>>,
    Path((owner, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    if !state.attachments.records().delete_contributor(&owner, &id)? {
        return Err(ApiError::NotFound(format!("Contributor {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
