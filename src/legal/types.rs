//! Agreement types, signer roles and signer fields

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Rendered in place of any signer field that was not supplied
pub const PLACEHOLDER: &str = "_________________________";

/// The five fixed agreement templates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgreementType {
    Nda,
    Confidentiality,
    OffshoreAddendum,
    ContractorPack,
    EquityGrant,
}

impl AgreementType {
    pub fn all() -> &'static [AgreementType] {
        &[
            AgreementType::Nda,
            AgreementType::Confidentiality,
            AgreementType::OffshoreAddendum,
            AgreementType::ContractorPack,
            AgreementType::EquityGrant,
        ]
    }

    /// Document title
    pub fn title(&self) -> &'static str {
        match self {
            AgreementType::Nda => "Mutual Non-Disclosure Agreement",
            AgreementType::Confidentiality => "Developer Confidentiality Agreement",
            AgreementType::OffshoreAddendum => "Offshore Development Addendum",
            AgreementType::ContractorPack => "Independent Contractor Agreement",
            AgreementType::EquityGrant => "Equity Grant Agreement",
        }
    }

    /// Signer roles in signing order
    pub fn roles(&self) -> &'static [SignerRole] {
        match self {
            AgreementType::Nda => &[SignerRole::Discloser, SignerRole::Recipient],
            AgreementType::Confidentiality | AgreementType::OffshoreAddendum => {
                &[SignerRole::Company, SignerRole::Developer]
            }
            AgreementType::ContractorPack => &[SignerRole::Company, SignerRole::Contractor],
            AgreementType::EquityGrant => &[SignerRole::Company, SignerRole::Grantee],
        }
    }

    /// File name stem for downloads
    pub fn file_stem(&self) -> &'static str {
        match self {
            AgreementType::Nda => "asset-safe-nda",
            AgreementType::Confidentiality => "asset-safe-confidentiality-agreement",
            AgreementType::OffshoreAddendum => "asset-safe-offshore-addendum",
            AgreementType::ContractorPack => "asset-safe-contractor-agreement",
            AgreementType::EquityGrant => "asset-safe-equity-grant",
        }
    }
}

impl std::fmt::Display for AgreementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgreementType::Nda => "nda",
            AgreementType::Confidentiality => "confidentiality",
            AgreementType::OffshoreAddendum => "offshore_addendum",
            AgreementType::ContractorPack => "contractor_pack",
            AgreementType::EquityGrant => "equity_grant",
        };
        f.write_str(s)
    }
}

impl FromStr for AgreementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        AgreementType::all()
            .iter()
            .find(|a| a.to_string() == wanted)
            .copied()
            .ok_or_else(|| format!("Unknown agreement type: {}", s))
    }
}

/// A named signing party
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SignerRole {
    Discloser,
    Recipient,
    Company,
    Developer,
    Contractor,
    Grantee,
}

impl SignerRole {
    /// Label used in defined terms and signature blocks
    pub fn label(&self) -> &'static str {
        match self {
            SignerRole::Discloser => "Discloser",
            SignerRole::Recipient => "Recipient",
            SignerRole::Company => "Company",
            SignerRole::Developer => "Developer",
            SignerRole::Contractor => "Contractor",
            SignerRole::Grantee => "Grantee",
        }
    }
}

impl std::fmt::Display for SignerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label().to_lowercase())
    }
}

impl FromStr for SignerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "discloser" => Ok(SignerRole::Discloser),
            "recipient" => Ok(SignerRole::Recipient),
            "company" => Ok(SignerRole::Company),
            "developer" => Ok(SignerRole::Developer),
            "contractor" => Ok(SignerRole::Contractor),
            "grantee" => Ok(SignerRole::Grantee),
            other => Err(format!("Unknown signer role: {}", other)),
        }
    }
}

/// Values a signer supplies; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SignerFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub signature_text: Option<String>,
    #[serde(default)]
    pub signature_date: Option<String>,
    /// Acknowledgment key → checked
    #[serde(default)]
    pub acknowledgments: BTreeMap<String, bool>,
}

impl SignerFields {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        or_placeholder(&self.name)
    }

    pub fn email(&self) -> &str {
        or_placeholder(&self.email)
    }

    pub fn location(&self) -> &str {
        or_placeholder(&self.location)
    }

    pub fn signature(&self) -> &str {
        or_placeholder(&self.signature_text)
    }

    pub fn date(&self) -> &str {
        or_placeholder(&self.signature_date)
    }

    pub fn acknowledged(&self, key: &str) -> bool {
        self.acknowledgments.get(key).copied().unwrap_or(false)
    }
}

/// Signer role → supplied fields
pub type SignerMap = BTreeMap<SignerRole, SignerFields>;

/// Supplied value as given, or the placeholder when absent or blank
pub fn or_placeholder(value: &Option<String>) -> &str {
    match value.as_deref() {
        Some(v) if !v.trim().is_empty() => v,
        _ => PLACEHOLDER,
    }
}
