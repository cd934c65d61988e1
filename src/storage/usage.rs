//! Storage quotas and usage reports

use serde::Serialize;
use std::collections::BTreeMap;

use super::error::{StorageError, StorageResult};
use super::records::CategoryTotals;
use super::types::AttachmentCategory;
use crate::gating::SubscriptionTier;

const GIB: u64 = 1024 * 1024 * 1024;

/// Storage allowance for a plan; unsubscribed owners get 1 GiB
pub fn quota_for(tier: Option<SubscriptionTier>) -> u64 {
    match tier {
        None => GIB,
        Some(SubscriptionTier::Basic) => 5 * GIB,
        Some(SubscriptionTier::Standard) => 25 * GIB,
        Some(SubscriptionTier::Premium) => 100 * GIB,
    }
}

/// Fail with `QuotaExceeded` if `incoming` more bytes would not fit
pub fn check_quota(used: u64, incoming: u64, quota: u64) -> StorageResult<()> {
    if used.saturating_add(incoming) > quota {
        return Err(StorageError::QuotaExceeded {
            used,
            incoming,
            quota,
        });
    }
    Ok(())
}

/// Usage within one category
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategoryUsage {
    pub category: AttachmentCategory,
    pub count: u64,
    pub bytes: u64,
}

/// Storage used by one owner against their plan's quota
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageReport {
    pub owner_id: String,
    pub tier: Option<SubscriptionTier>,
    pub quota_bytes: u64,
    pub used_bytes: u64,
    pub remaining_bytes: u64,
    pub percent_used: f64,
    /// Every category, including empty ones
    pub categories: Vec<CategoryUsage>,
}

impl UsageReport {
    pub fn build(
        owner_id: impl Into<String>,
        tier: Option<SubscriptionTier>,
        totals: &BTreeMap<AttachmentCategory, CategoryTotals>,
    ) -> Self {
        let quota_bytes = quota_for(tier);
        let used_bytes: u64 = totals.values().map(|t| t.bytes).sum();

        let categories = AttachmentCategory::all()
            .iter()
            .map(|&category| {
                let t = totals.get(&category).copied().unwrap_or_default();
                CategoryUsage {
                    category,
                    count: t.count,
                    bytes: t.bytes,
                }
            })
            .collect();

        Self {
            owner_id: owner_id.into(),
            tier,
            quota_bytes,
            used_bytes,
            remaining_bytes: quota_bytes.saturating_sub(used_bytes),
            percent_used: (used_bytes as f64 / quota_bytes as f64 * 10_000.0).round() / 100.0,
            categories,
        }
    }
}

/// Human-readable byte count ("1.5 GB")
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
