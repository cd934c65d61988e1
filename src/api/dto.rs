//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::assistant::{Message, PanelAction, PanelState, SessionId};
use crate::gating::{AccessDecision, FeatureDescriptor, SubscriptionTier};
use crate::legal::{AgreementType, ExportFormat, SignerMap};
use crate::storage::{
    AttachmentCategory, Contributor, ContributorRole, RequestState, StoredAttachment,
};

// ============================================
// ASSISTANT DTOs
// ============================================

/// Stateless reply request
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    /// User input
    pub text: String,
    /// Page the user is on, used by the path fallbacks
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_string()
}

/// Stateless reply response
#[derive(Debug, Serialize, Deserialize)]
pub struct RespondResponse {
    pub text: String,
    /// Stage of the selection chain that produced the reply
    pub source: String,
}

/// Newly created chat session
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub id: SessionId,
    pub state: PanelState,
}

/// Message sent into a session
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
    #[serde(default = "default_path")]
    pub path: String,
}

/// The user's message and the bot's reply
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageResponse {
    pub user: Message,
    pub reply: Message,
}

/// Panel transition request
#[derive(Debug, Deserialize)]
pub struct PanelActionRequest {
    pub action: PanelAction,
}

/// Panel state after a transition
#[derive(Debug, Serialize, Deserialize)]
pub struct PanelStateResponse {
    pub id: SessionId,
    pub state: PanelState,
}

// ============================================
// LEGAL DTOs
// ============================================

/// Agreement export request
#[derive(Debug, Deserialize)]
pub struct LegalExportRequest {
    pub agreement: AgreementType,
    #[serde(default)]
    pub format: ExportFormat,
    /// Supplied signer values; anything missing renders as a blank line
    #[serde(default)]
    pub signers: SignerMap,
}

// ============================================
// FEATURE DTOs
// ============================================

/// Gate check request
#[derive(Debug, Deserialize)]
pub struct FeatureCheckRequest {
    pub feature: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub is_in_trial: bool,
}

/// Gate check response
#[derive(Debug, Serialize)]
pub struct FeatureCheckResponse {
    #[serde(flatten)]
    pub decision: AccessDecision,
    /// Upgrade prompt shown when access is denied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// A plan as listed in the catalog
#[derive(Debug, Serialize)]
pub struct TierInfo {
    pub tier: SubscriptionTier,
    pub name: String,
    pub monthly_price_cents: u32,
}

/// Feature catalog
#[derive(Debug, Serialize)]
pub struct FeatureListResponse {
    pub features: Vec<FeatureDescriptor>,
    pub tiers: Vec<TierInfo>,
}

// ============================================
// UPLOAD DTOs
// ============================================

/// Single file upload
#[derive(Debug, Deserialize)]
pub struct UploadFileRequest {
    pub owner_id: String,
    /// UI control that started the upload
    pub control_key: String,
    pub file_name: String,
    pub content_type: String,
    #[serde(default)]
    pub category: Option<AttachmentCategory>,
    #[serde(default)]
    pub tier: Option<SubscriptionTier>,
    /// File contents, standard base64
    pub data_base64: String,
}

/// Finished recording upload
#[derive(Debug, Deserialize)]
pub struct RecordingUploadRequest {
    pub owner_id: String,
    pub control_key: String,
    pub file_name: String,
    pub content_type: String,
    #[serde(default)]
    pub tier: Option<SubscriptionTier>,
    /// Recorded chunks in order, standard base64
    pub chunks_base64: Vec<String>,
}

/// Lifecycle state of the last request for a control
#[derive(Debug, Serialize)]
pub struct RequestStatusResponse {
    pub control_key: String,
    pub status: RequestState,
}

/// Attachment list query parameters
#[derive(Debug, Deserialize)]
pub struct AttachmentListParams {
    #[serde(default)]
    pub category: Option<AttachmentCategory>,
}

/// Attachment list
#[derive(Debug, Serialize)]
pub struct AttachmentListResponse {
    pub attachments: Vec<StoredAttachment>,
    pub total: usize,
}

/// Usage query parameters
#[derive(Debug, Deserialize)]
pub struct UsageParams {
    #[serde(default)]
    pub tier: Option<String>,
}

// ============================================
// CONTRIBUTOR DTOs
// ============================================

/// Invitation request
#[derive(Debug, Deserialize)]
pub struct InviteContributorRequest {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: ContributorRole,
}

/// Contributor list
#[derive(Debug, Serialize)]
pub struct ContributorListResponse {
    pub contributors: Vec<Contributor>,
    pub total: usize,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded, unhealthy
    pub status: String,
    /// Record database status
    pub database: String,
    /// Live chat sessions
    pub chat_sessions: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
