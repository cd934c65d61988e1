//! Subscription tiers and the context a gate is evaluated against

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Paid subscription tiers, ordered from least to most capable
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Basic,
    Standard,
    Premium,
}

impl SubscriptionTier {
    pub fn all() -> &'static [SubscriptionTier] {
        &[
            SubscriptionTier::Basic,
            SubscriptionTier::Standard,
            SubscriptionTier::Premium,
        ]
    }

    /// Marketing name shown in upgrade prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            SubscriptionTier::Basic => "Basic",
            SubscriptionTier::Standard => "Standard (Homeowner)",
            SubscriptionTier::Premium => "Premium (Business)",
        }
    }

    /// Monthly price in US cents
    pub fn monthly_price_cents(&self) -> u32 {
        match self {
            SubscriptionTier::Basic => 699,
            SubscriptionTier::Standard => 1299,
            SubscriptionTier::Premium => 1899,
        }
    }
}

impl std::fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionTier::Basic => write!(f, "basic"),
            SubscriptionTier::Standard => write!(f, "standard"),
            SubscriptionTier::Premium => write!(f, "premium"),
        }
    }
}

impl FromStr for SubscriptionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Ok(SubscriptionTier::Basic),
            "standard" | "homeowner" => Ok(SubscriptionTier::Standard),
            "premium" | "business" => Ok(SubscriptionTier::Premium),
            other => Err(format!("Unknown subscription tier: {}", other)),
        }
    }
}

/// The subscriber's current plan as seen by a feature gate
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubscriptionContext {
    /// Active paid tier, `None` when not subscribed
    #[serde(default)]
    pub tier: Option<SubscriptionTier>,
    /// Whether the account is in its free trial
    #[serde(default)]
    pub is_in_trial: bool,
}

impl SubscriptionContext {
    pub fn new(tier: Option<SubscriptionTier>, is_in_trial: bool) -> Self {
        Self { tier, is_in_trial }
    }

    pub fn subscribed(tier: SubscriptionTier) -> Self {
        Self::new(Some(tier), false)
    }

    pub fn trial() -> Self {
        Self::new(None, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(SubscriptionTier::Basic < SubscriptionTier::Standard);
        assert!(SubscriptionTier::Standard < SubscriptionTier::Premium);
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("Homeowner".parse(), Ok(SubscriptionTier::Standard));
        assert_eq!("premium".parse(), Ok(SubscriptionTier::Premium));
        assert!("gold".parse::<SubscriptionTier>().is_err());
    }

    #[test]
    fn test_context_deserialize_defaults() {
        let ctx: SubscriptionContext = serde_json::from_str("{}").unwrap();
        assert_eq!(ctx, SubscriptionContext::default());

        let ctx: SubscriptionContext =
            serde_json::from_str(r#"{"tier": "standard", "is_in_trial": false}"#).unwrap();
        assert_eq!(ctx.tier, Some(SubscriptionTier::Standard));
    }
}
