//! Legal Document Exporter
//!
//! Renders one of five fixed agreements with the signer details a caller
//! supplies. The pipeline is:
//!
//! ```text
//! templates::build ─► Document ─► Paginator ─► pdf::render / text::render
//! ```
//!
//! Any signer field left out renders as a run of underscores so the printed
//! copy can be completed by hand.
//!
//! # Example
//!
//! ```
//! use assetsafe::legal::{export, AgreementType, ExportFormat, LayoutConfig, SignerMap};
//!
//! let doc = export(
//!     AgreementType::Nda,
//!     &SignerMap::new(),
//!     ExportFormat::Pdf,
//!     &LayoutConfig::default(),
//! )
//! .unwrap();
//! assert!(doc.bytes.starts_with(b"%PDF-1.4"));
//! ```

mod document;
mod error;
mod layout;
pub mod pdf;
mod templates;
pub mod text;
mod types;

pub use document::{Block, Document};
pub use error::{LegalError, LegalResult};
pub use layout::{wrap, LayoutConfig, Page, Paginator, PlacedLine, TextStyle};
pub use templates::{acknowledgments, build};
pub use types::{or_placeholder, AgreementType, SignerFields, SignerMap, SignerRole, PLACEHOLDER};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Output encoding
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Text,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Text => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Text => "txt",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "text" | "txt" => Ok(ExportFormat::Text),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

/// A finished agreement ready to download
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub file_name: String,
    pub page_count: usize,
}

/// Build, paginate and render an agreement
pub fn export(
    agreement: AgreementType,
    signers: &SignerMap,
    format: ExportFormat,
    layout: &LayoutConfig,
) -> LegalResult<RenderedDocument> {
    let document = build(agreement, signers)?;
    let paginator = Paginator::new(layout.clone())?;
    let pages = paginator.paginate(&document);

    let bytes = match format {
        ExportFormat::Pdf => pdf::render(&pages, paginator.config(), &document.title),
        ExportFormat::Text => text::render(&pages, paginator.config()),
    };

    tracing::debug!(
        agreement = %agreement,
        pages = pages.len(),
        bytes = bytes.len(),
        "Rendered agreement"
    );

    Ok(RenderedDocument {
        bytes,
        content_type: format.content_type(),
        file_name: format!("{}.{}", agreement.file_stem(), format.extension()),
        page_count: pages.len(),
    })
}
