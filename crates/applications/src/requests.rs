//! Typed requests for lifecycle operations.
//!
//! Inputs are explicit structs validated *before* any row lock is acquired,
//! so malformed input never blocks a row.

use serde::{Deserialize, Serialize};

use certportal_core::{CompanyId, WorkflowError, WorkflowResult};

use crate::{ApplicationId, ApplicationType, QualificationTier};

/// Minimum length for an administrator's rejection reason. A quality gate on
/// reviewer input, not a security control.
pub const MIN_REJECTION_REASON_LEN: usize = 10;

/// Request: create a new draft application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateApplication {
    pub company_id: CompanyId,
    pub application_type: ApplicationType,
    pub classification: String,
    pub business_field: String,
    pub qualification: QualificationTier,
}

impl CreateApplication {
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.classification.trim().is_empty() {
            return Err(WorkflowError::validation("classification must not be empty"));
        }
        if self.business_field.trim().is_empty() {
            return Err(WorkflowError::validation("business_field must not be empty"));
        }
        Ok(())
    }
}

/// Request: submit a draft application for review.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitApplication {
    pub application_id: ApplicationId,
}

/// Request: claim a submitted application for review.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartReview {
    pub application_id: ApplicationId,
}

/// Request: approve an application, issuing its certificate directly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveApplication {
    pub application_id: ApplicationId,
}

/// Request: reject an application with a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectApplication {
    pub application_id: ApplicationId,
    pub reason: String,
}

impl RejectApplication {
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.reason.trim().len() < MIN_REJECTION_REASON_LEN {
            return Err(WorkflowError::validation(format!(
                "rejection reason must be at least {MIN_REJECTION_REASON_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_classification_and_field() {
        let req = CreateApplication {
            company_id: CompanyId::new(),
            application_type: ApplicationType::New,
            classification: "  ".to_string(),
            business_field: "BG001".to_string(),
            qualification: QualificationTier::Small,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn short_rejection_reason_fails_validation() {
        let req = RejectApplication {
            application_id: ApplicationId::new(certportal_core::RecordId::new()),
            reason: "too bad".to_string(),
        };
        assert!(req.validate().is_err());

        let req = RejectApplication {
            reason: "missing a legible business license scan".to_string(),
            ..req
        };
        assert!(req.validate().is_ok());
    }
}
