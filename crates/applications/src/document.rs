use core::str::FromStr;

use serde::{Deserialize, Serialize};

use certportal_core::WorkflowError;

/// Administratively-required document types for a submission.
///
/// Upload, storage, and content checking are external collaborators; the
/// engine only asks "is a document of this type attached?".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    BusinessLicense,
    TaxRegistration,
    DeedOfEstablishment,
    FinancialStatement,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::BusinessLicense,
        DocumentType::TaxRegistration,
        DocumentType::DeedOfEstablishment,
        DocumentType::FinancialStatement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::BusinessLicense => "business_license",
            DocumentType::TaxRegistration => "tax_registration",
            DocumentType::DeedOfEstablishment => "deed_of_establishment",
            DocumentType::FinancialStatement => "financial_statement",
        }
    }
}

impl core::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "business_license" => Ok(DocumentType::BusinessLicense),
            "tax_registration" => Ok(DocumentType::TaxRegistration),
            "deed_of_establishment" => Ok(DocumentType::DeedOfEstablishment),
            "financial_statement" => Ok(DocumentType::FinancialStatement),
            other => Err(WorkflowError::validation(format!(
                "unknown document type '{other}'"
            ))),
        }
    }
}
