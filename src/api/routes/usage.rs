//! Usage Routes
//!
//! - GET /api/v1/owners/:owner/usage?tier= - Storage used against the plan quota

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use super::features::parse_tier;
use crate::api::dto::UsageParams;
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::storage::UsageReport;

/// GET /api/v1/owners/:owner/usage
pub async fn owner_usage(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
    Query(params): Query<UsageParams>,
) -> ApiResult<Json<UsageReport>> {
    let tier = parse_tier(params.tier.as_deref())?;
    Ok(Json(state.attachments.usage(&owner, tier)?))
}
