//! Feature Routes
//!
//! - GET /api/v1/features - Feature catalog and plans
//! - POST /api/v1/features/check - Access decision for one feature

use axum::Json;

use crate::api::dto::{FeatureCheckRequest, FeatureCheckResponse, FeatureListResponse, TierInfo};
use crate::api::error::{ApiError, ApiResult};
use crate::gating::{check_access, FeatureKey, SubscriptionContext, SubscriptionTier};

/// GET /api/v1/features
pub async fn list_features() -> Json<FeatureListResponse> {
    Json(FeatureListResponse {
        features: FeatureKey::all().iter().map(|k| k.descriptor()).collect(),
        tiers: SubscriptionTier::all()
            .iter()
            .map(|&tier| TierInfo {
                tier,
                name: tier.display_name().to_string(),
                monthly_price_cents: tier.monthly_price_cents(),
            })
            .collect(),
    })
}

/// POST /api/v1/features/check
pub async fn check_feature(
    Json(req): Json<FeatureCheckRequest>,
) -> ApiResult<Json<FeatureCheckResponse>> {
    let feature: FeatureKey = req.feature.parse().map_err(ApiError::Validation)?;
    let tier = parse_tier(req.tier.as_deref())?;

    let decision = check_access(feature, &SubscriptionContext::new(tier, req.is_in_trial));
    let prompt = (!decision.has_access).then(|| {
        format!(
            "{} requires the {} plan or higher.",
            decision.feature.name,
            decision.feature.required_tier.display_name()
        )
    });

    Ok(Json(FeatureCheckResponse { decision, prompt }))
}

/// Parse an optional tier name; blank means not subscribed
pub(crate) fn parse_tier(tier: Option<&str>) -> ApiResult<Option<SubscriptionTier>> {
    match tier.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name.parse().map(Some).map_err(ApiError::Validation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tier() {
        assert_eq!(parse_tier(None).unwrap(), None);
        assert_eq!(parse_tier(Some(" ")).unwrap(), None);
        assert_eq!(
            parse_tier(Some("homeowner")).unwrap(),
            Some(SubscriptionTier::Standard)
        );
        assert!(parse_tier(Some("gold")).is_err());
    }

    #[tokio::test]
    async fn test_check_denied_has_prompt() {
        let Json(resp) = check_feature(Json(FeatureCheckRequest {
            feature: "legal_documents".to_string(),
            tier: Some("basic".to_string()),
            is_in_trial: false,
        }))
        .await
        .unwrap();

        assert!(!resp.decision.has_access);
        assert!(resp.prompt.is_some());
    }
}
