use chrono::{DateTime, Months, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use certportal_applications::{Application, ApplicationId, QualificationTier};
use certportal_core::{RecordId, UserId, WorkflowError, WorkflowResult};

/// Certificate identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(pub RecordId);

impl CertificateId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CertificateId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for CertificateId {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(RecordId::from_str(s)?))
    }
}

/// Certificate status. Post-issuance changes (suspension, revocation) are
/// administrative actions outside the workflow engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Active,
    Suspended,
    Revoked,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Active => "active",
            CertificateStatus::Suspended => "suspended",
            CertificateStatus::Revoked => "revoked",
        }
    }
}

impl FromStr for CertificateStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(CertificateStatus::Active),
            "suspended" => Ok(CertificateStatus::Suspended),
            "revoked" => Ok(CertificateStatus::Revoked),
            other => Err(WorkflowError::validation(format!(
                "unknown certificate status '{other}'"
            ))),
        }
    }
}

/// Issuance policy: validity window and issuer identity.
///
/// One policy for every trigger path (direct approval and payment
/// confirmation alike).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityPolicy {
    pub validity_years: u32,
    pub issuer_name: String,
}

impl Default for ValidityPolicy {
    fn default() -> Self {
        Self {
            validity_years: 3,
            issuer_name: "Construction Services Certification Body".to_string(),
        }
    }
}

/// The issued credential.
///
/// Classification, business field and qualification are **snapshots** of the
/// application at issuance time; later edits to the application do not alter
/// an issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub owner_id: UserId,
    pub application_id: ApplicationId,
    /// `SBU-KI-<year>-<5 digits>`, unique.
    pub certificate_number: String,
    /// `NRN-<yyyymmdd>-<8 hex>`, unique.
    pub national_registration_number: Option<String>,
    pub classification: String,
    pub business_field: String,
    pub qualification: QualificationTier,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: CertificateStatus,
    pub issuer_name: String,
    /// Rendered on demand by the document renderer collaborator.
    pub file_path: Option<String>,
}

impl Certificate {
    /// Snapshot-issue a certificate for an application.
    ///
    /// Fails when the policy's validity window cannot be represented as a
    /// future expiry date.
    pub fn issue(
        id: CertificateId,
        application: &Application,
        certificate_number: String,
        national_registration_number: String,
        policy: &ValidityPolicy,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Self> {
        let months = policy
            .validity_years
            .checked_mul(12)
            .ok_or_else(|| WorkflowError::validation("validity policy exceeds the supported window"))?;
        let expires_at = now
            .checked_add_months(Months::new(months))
            .ok_or_else(|| WorkflowError::validation("validity policy exceeds the supported window"))?;
        Ok(Self {
            id,
            owner_id: application.owner_id,
            application_id: application.id,
            certificate_number,
            national_registration_number: Some(national_registration_number),
            classification: application.classification.clone(),
            business_field: application.business_field.clone(),
            qualification: application.qualification,
            issued_at: now,
            expires_at,
            status: CertificateStatus::Active,
            issuer_name: policy.issuer_name.clone(),
            file_path: None,
        })
    }
}
