//! Legal exporter error types

use thiserror::Error;

use super::types::{AgreementType, SignerRole};

/// Errors raised while building or rendering an agreement
#[derive(Error, Debug)]
pub enum LegalError {
    /// Signer supplied for a role the agreement does not have
    #[error("Agreement '{agreement}' has no '{role}' signer")]
    UnknownRole {
        role: SignerRole,
        agreement: AgreementType,
    },

    /// Page geometry leaves no room for content
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// Writing the rendered document failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for legal operations
pub type LegalResult<T> = Result<T, LegalError>;
