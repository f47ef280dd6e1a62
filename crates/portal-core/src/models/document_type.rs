use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// The fixed set of compliance documents every company must submit.
///
/// The display name is also the value stored in `uploaded_documents.doc_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum DocumentType {
    #[serde(rename = "Company Profile")]
    CompanyProfile,
    #[serde(rename = "ISO Certificate")]
    IsoCertificate,
    #[serde(rename = "DPDP Assessment")]
    DpdpAssessment,
    #[serde(rename = "Cybersecurity Policy")]
    CybersecurityPolicy,
    #[serde(rename = "HR Policy")]
    HrPolicy,
    #[serde(rename = "Risk Assessment")]
    RiskAssessment,
    #[serde(rename = "Privacy Policy")]
    PrivacyPolicy,
    #[serde(rename = "Incident Response Plan")]
    IncidentResponsePlan,
    #[serde(rename = "Vendor Agreements")]
    VendorAgreements,
    #[serde(rename = "Consent Forms")]
    ConsentForms,
}

impl DocumentType {
    /// All document types in checklist order.
    pub const ALL: [DocumentType; 10] = [
        DocumentType::CompanyProfile,
        DocumentType::IsoCertificate,
        DocumentType::DpdpAssessment,
        DocumentType::CybersecurityPolicy,
        DocumentType::HrPolicy,
        DocumentType::RiskAssessment,
        DocumentType::PrivacyPolicy,
        DocumentType::IncidentResponsePlan,
        DocumentType::VendorAgreements,
        DocumentType::ConsentForms,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::CompanyProfile => "Company Profile",
            DocumentType::IsoCertificate => "ISO Certificate",
            DocumentType::DpdpAssessment => "DPDP Assessment",
            DocumentType::CybersecurityPolicy => "Cybersecurity Policy",
            DocumentType::HrPolicy => "HR Policy",
            DocumentType::RiskAssessment => "Risk Assessment",
            DocumentType::PrivacyPolicy => "Privacy Policy",
            DocumentType::IncidentResponsePlan => "Incident Response Plan",
            DocumentType::VendorAgreements => "Vendor Agreements",
            DocumentType::ConsentForms => "Consent Forms",
        }
    }

    /// The type whose display name is exactly `name`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == name)
    }

    /// Position in the checklist, starting at zero.
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|t| t == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    /// Accepts the display name in any letter case, or a 1-based checklist position.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if let Ok(position) = wanted.parse::<usize>() {
            if (1..=Self::ALL.len()).contains(&position) {
                return Ok(Self::ALL[position - 1]);
            }
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown document type: {}", wanted))
    }
}
