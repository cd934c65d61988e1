//! Feature Gating
//!
//! Decides whether a subscriber may use a feature. The check is a pure
//! predicate over `(feature, tier, is_in_trial)`:
//!
//! - accounts in their free trial can use every feature
//! - otherwise the subscriber's tier must be at least the feature's required tier
//!
//! Denied decisions carry the pricing path so the caller can render an
//! upgrade prompt.

mod tier;

pub use tier::{SubscriptionContext, SubscriptionTier};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Where upgrade prompts send the user
pub const UPGRADE_PATH: &str = "/pricing";

/// Gated product features
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    PhotoUpload,
    DocumentVault,
    ReceiptScanning,
    VideoUpload,
    VoiceNotes,
    PaintCodes,
    MultipleProperties,
    InsuranceReports,
    LegacyLocker,
    Contributors,
    FinancialLoans,
    LegalDocuments,
}

impl FeatureKey {
    pub fn all() -> &'static [FeatureKey] {
        &[
            FeatureKey::PhotoUpload,
            FeatureKey::DocumentVault,
            FeatureKey::ReceiptScanning,
            FeatureKey::VideoUpload,
            FeatureKey::VoiceNotes,
            FeatureKey::PaintCodes,
            FeatureKey::MultipleProperties,
            FeatureKey::InsuranceReports,
            FeatureKey::LegacyLocker,
            FeatureKey::Contributors,
            FeatureKey::FinancialLoans,
            FeatureKey::LegalDocuments,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureKey::PhotoUpload => "photo_upload",
            FeatureKey::DocumentVault => "document_vault",
            FeatureKey::ReceiptScanning => "receipt_scanning",
            FeatureKey::VideoUpload => "video_upload",
            FeatureKey::VoiceNotes => "voice_notes",
            FeatureKey::PaintCodes => "paint_codes",
            FeatureKey::MultipleProperties => "multiple_properties",
            FeatureKey::InsuranceReports => "insurance_reports",
            FeatureKey::LegacyLocker => "legacy_locker",
            FeatureKey::Contributors => "contributors",
            FeatureKey::FinancialLoans => "financial_loans",
            FeatureKey::LegalDocuments => "legal_documents",
        }
    }

    /// Static description of this feature
    pub fn descriptor(&self) -> FeatureDescriptor {
        let (name, description, required_tier) = match self {
            FeatureKey::PhotoUpload => (
                "Photo Upload",
                "Photograph rooms and items",
                SubscriptionTier::Basic,
            ),
            FeatureKey::DocumentVault => (
                "Document Vault",
                "Store manuals, warranties and appraisals",
                SubscriptionTier::Basic,
            ),
            FeatureKey::ReceiptScanning => (
                "Receipt Scanning",
                "Attach purchase receipts to items",
                SubscriptionTier::Basic,
            ),
            FeatureKey::VideoUpload => (
                "Video Upload",
                "Record walkthrough videos of each room",
                SubscriptionTier::Standard,
            ),
            FeatureKey::VoiceNotes => (
                "Voice Notes",
                "Describe items with recorded audio",
                SubscriptionTier::Standard,
            ),
            FeatureKey::PaintCodes => (
                "Paint Codes",
                "Save paint brands, colours and finishes per room",
                SubscriptionTier::Standard,
            ),
            FeatureKey::MultipleProperties => (
                "Multiple Properties",
                "Document more than one home or location",
                SubscriptionTier::Standard,
            ),
            FeatureKey::InsuranceReports => (
                "Insurance Reports",
                "Export claim-ready inventory reports",
                SubscriptionTier::Standard,
            ),
            FeatureKey::LegacyLocker => (
                "Legacy Locker",
                "Estate-planning documents and beneficiary notes",
                SubscriptionTier::Premium,
            ),
            FeatureKey::Contributors => (
                "Contributors",
                "Invite family members and advisors",
                SubscriptionTier::Premium,
            ),
            FeatureKey::FinancialLoans => (
                "Financial Records",
                "Track loans and liens on assets",
                SubscriptionTier::Premium,
            ),
            FeatureKey::LegalDocuments => (
                "Legal Documents",
                "Generate NDAs, contractor packs and equity grants",
                SubscriptionTier::Premium,
            ),
        };

        FeatureDescriptor {
            key: *self,
            name: name.to_string(),
            description: description.to_string(),
            required_tier,
        }
    }
}

impl std::fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        FeatureKey::all()
            .iter()
            .find(|k| k.as_str() == wanted)
            .copied()
            .ok_or_else(|| format!("Unknown feature: {}", s))
    }
}

/// Display information for a feature
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeatureDescriptor {
    pub key: FeatureKey,
    pub name: String,
    pub description: String,
    pub required_tier: SubscriptionTier,
}

/// Result of a gate check
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AccessDecision {
    pub has_access: bool,
    pub feature: FeatureDescriptor,
    /// Pricing page to link from the upgrade prompt when access is denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_path: Option<String>,
}

/// Decide whether `context` grants `feature`
pub fn check_access(feature: FeatureKey, context: &SubscriptionContext) -> AccessDecision {
    let descriptor = feature.descriptor();

    let has_access = context.is_in_trial
        || context
            .tier
            .map(|tier| tier >= descriptor.required_tier)
            .unwrap_or(false);

    AccessDecision {
        has_access,
        upgrade_path: (!has_access).then(|| UPGRADE_PATH.to_string()),
        feature: descriptor,
    }
}

/// Features available to a context
pub fn available_features(context: &SubscriptionContext) -> Vec<FeatureKey> {
    FeatureKey::all()
        .iter()
        .copied()
        .filter(|&key| check_access(key, context).has_access)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_meets_requirement() {
        let ctx = SubscriptionContext::subscribed(SubscriptionTier::Standard);
        assert!(check_access(FeatureKey::PhotoUpload, &ctx).has_access);
        assert!(check_access(FeatureKey::VoiceNotes, &ctx).has_access);
        assert!(!check_access(FeatureKey::LegacyLocker, &ctx).has_access);
    }

    #[test]
    fn test_trial_grants_everything() {
        let ctx = SubscriptionContext::trial();
        for key in FeatureKey::all() {
            assert!(check_access(*key, &ctx).has_access, "{} denied in trial", key);
        }
    }

    #[test]
    fn test_no_subscription_denied() {
        let ctx = SubscriptionContext::default();
        let decision = check_access(FeatureKey::PhotoUpload, &ctx);
        assert!(!decision.has_access);
        assert_eq!(decision.upgrade_path.as_deref(), Some(UPGRADE_PATH));
        assert_eq!(decision.feature.required_tier, SubscriptionTier::Basic);
    }

    #[test]
    fn test_granted_has_no_upgrade_path() {
        let ctx = SubscriptionContext::subscribed(SubscriptionTier::Premium);
        let decision = check_access(FeatureKey::LegalDocuments, &ctx);
        assert!(decision.has_access);
        assert!(decision.upgrade_path.is_none());
    }

    #[test]
    fn test_available_features_grow_with_tier() {
        let basic = available_features(&SubscriptionContext::subscribed(SubscriptionTier::Basic));
        let standard =
            available_features(&SubscriptionContext::subscribed(SubscriptionTier::Standard));
        let premium =
            available_features(&SubscriptionContext::subscribed(SubscriptionTier::Premium));

        assert!(basic.len() < standard.len());
        assert!(standard.len() < premium.len());
        assert_eq!(premium.len(), FeatureKey::all().len());
    }

    #[test]
    fn test_feature_key_parse() {
        assert_eq!("legacy-locker".parse(), Ok(FeatureKey::LegacyLocker));
        assert_eq!("Voice_Notes".parse(), Ok(FeatureKey::VoiceNotes));
        assert!("teleport".parse::<FeatureKey>().is_err());
    }
}
