use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use certportal_core::{CompanyId, RecordId, UserId, WorkflowError, WorkflowResult};

/// Application identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub RecordId);

impl ApplicationId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ApplicationId {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(RecordId::from_str(s)?))
    }
}

/// What the applicant is asking for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationType {
    New,
    Renewal,
    Upgrade,
}

impl ApplicationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationType::New => "new",
            ApplicationType::Renewal => "renewal",
            ApplicationType::Upgrade => "upgrade",
        }
    }
}

impl FromStr for ApplicationType {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ApplicationType::New),
            "renewal" => Ok(ApplicationType::Renewal),
            "upgrade" => Ok(ApplicationType::Upgrade),
            other => Err(WorkflowError::validation(format!(
                "unknown application type '{other}'"
            ))),
        }
    }
}

/// Company qualification tier requested on the application.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualificationTier {
    Small,
    Medium,
    Large,
}

impl QualificationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualificationTier::Small => "small",
            QualificationTier::Medium => "medium",
            QualificationTier::Large => "large",
        }
    }
}

impl FromStr for QualificationTier {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(QualificationTier::Small),
            "medium" => Ok(QualificationTier::Medium),
            "large" => Ok(QualificationTier::Large),
            other => Err(WorkflowError::validation(format!(
                "unknown qualification tier '{other}'"
            ))),
        }
    }
}

/// Application status lifecycle.
///
/// Transitions are monotonic along
/// `draft → submitted → under_review → {approved | rejected | completed}`;
/// there is no path back to `draft`. `rejected` and `completed` are terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Completed,
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Completed)
    }

    /// Legal edges of the status graph.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Draft, Submitted)
                | (Submitted, UnderReview)
                | (Submitted, Approved)
                | (Submitted, Rejected)
                | (Submitted, Completed)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (UnderReview, Completed)
                | (Approved, Completed)
                | (Draft, Rejected)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Completed => "completed",
        }
    }
}

impl core::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ApplicationStatus::Draft),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "under_review" => Ok(ApplicationStatus::UnderReview),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "completed" => Ok(ApplicationStatus::Completed),
            other => Err(WorkflowError::validation(format!(
                "unknown application status '{other}'"
            ))),
        }
    }
}

/// One certification request moving through the lifecycle.
///
/// Never physically deleted; terminal rows are permanent records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub owner_id: UserId,
    pub company_id: CompanyId,
    /// Human-readable unique number, `SBU-<year>-<4 digits>`.
    pub application_number: String,
    pub application_type: ApplicationType,
    pub classification: String,
    pub business_field: String,
    pub qualification: QualificationTier,
    pub status: ApplicationStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub reviewer_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Application {
    /// Create a new application in `draft`.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        id: ApplicationId,
        owner_id: UserId,
        company_id: CompanyId,
        application_number: String,
        application_type: ApplicationType,
        classification: String,
        business_field: String,
        qualification: QualificationTier,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            company_id,
            application_number,
            application_type,
            classification,
            business_field,
            qualification,
            status: ApplicationStatus::Draft,
            submitted_at: None,
            reviewed_at: None,
            completed_at: None,
            notes: None,
            reviewer_id: None,
            created_at: now,
        }
    }

    fn require_transition(&self, next: ApplicationStatus) -> WorkflowResult<()> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(WorkflowError::illegal_transition(
                self.status.as_str(),
                next.as_str(),
            ))
        }
    }

    /// `draft → submitted`. Document preconditions are checked by the
    /// lifecycle controller before this runs.
    pub fn submit(&mut self, now: DateTime<Utc>) -> WorkflowResult<()> {
        self.require_transition(ApplicationStatus::Submitted)?;
        self.status = ApplicationStatus::Submitted;
        self.submitted_at = Some(now);
        Ok(())
    }

    /// `submitted → under_review`, claiming the application for a reviewer.
    pub fn start_review(&mut self, reviewer: UserId, now: DateTime<Utc>) -> WorkflowResult<()> {
        self.require_transition(ApplicationStatus::UnderReview)?;
        self.status = ApplicationStatus::UnderReview;
        self.reviewer_id = Some(reviewer);
        self.reviewed_at = Some(now);
        Ok(())
    }

    /// Terminal rejection. Illegal once the application is `approved`,
    /// `rejected` or `completed`.
    pub fn reject(&mut self, reviewer: UserId, now: DateTime<Utc>) -> WorkflowResult<()> {
        self.require_transition(ApplicationStatus::Rejected)?;
        self.status = ApplicationStatus::Rejected;
        self.reviewer_id = Some(reviewer);
        self.reviewed_at = Some(now);
        Ok(())
    }

    /// Terminal completion; runs as part of certificate issuance.
    pub fn complete(&mut self, reviewer: UserId, now: DateTime<Utc>) -> WorkflowResult<()> {
        self.require_transition(ApplicationStatus::Completed)?;
        self.status = ApplicationStatus::Completed;
        self.completed_at = Some(now);
        if self.reviewed_at.is_none() {
            self.reviewed_at = Some(now);
        }
        self.reviewer_id = Some(reviewer);
        Ok(())
    }

    /// Whether an invoice may be created against this application.
    pub fn billable(&self) -> bool {
        matches!(
            self.status,
            ApplicationStatus::Submitted
                | ApplicationStatus::UnderReview
                | ApplicationStatus::Approved
        )
    }

    /// Whether certificate issuance may proceed for this application.
    ///
    /// Any status past `draft` that is not `rejected`; a payment confirmation
    /// may complete an application that is still `submitted`/`under_review`.
    pub fn issuance_eligible(&self) -> bool {
        !matches!(
            self.status,
            ApplicationStatus::Draft | ApplicationStatus::Rejected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_application() -> Application {
        Application::create(
            ApplicationId::new(RecordId::new()),
            UserId::new(),
            CompanyId::new(),
            "SBU-2025-0001".to_string(),
            ApplicationType::New,
            "building construction".to_string(),
            "BG001".to_string(),
            QualificationTier::Medium,
            Utc::now(),
        )
    }

    #[test]
    fn submit_moves_draft_to_submitted() {
        let mut app = draft_application();
        app.submit(Utc::now()).unwrap();
        assert_eq!(app.status, ApplicationStatus::Submitted);
        assert!(app.submitted_at.is_some());
    }

    #[test]
    fn submit_twice_is_illegal() {
        let mut app = draft_application();
        app.submit(Utc::now()).unwrap();
        let err = app.submit(Utc::now()).unwrap_err();
        match err {
            WorkflowError::IllegalTransition { current, .. } => {
                assert_eq!(current, "submitted");
            }
            other => panic!("expected IllegalTransition, got {other:?}"),
        }
    }

    #[test]
    fn no_edge_returns_to_draft() {
        use ApplicationStatus::*;
        for status in [Submitted, UnderReview, Approved, Rejected, Completed] {
            assert!(!status.can_transition_to(Draft));
        }
    }

    #[test]
    fn reject_is_illegal_from_final_states() {
        let mut app = draft_application();
        let reviewer = UserId::new();
        app.submit(Utc::now()).unwrap();
        app.complete(reviewer, Utc::now()).unwrap();
        let err = app.reject(reviewer, Utc::now()).unwrap_err();
        match err {
            WorkflowError::IllegalTransition { current, requested } => {
                assert_eq!(current, "completed");
                assert_eq!(requested, "rejected");
            }
            other => panic!("expected IllegalTransition, got {other:?}"),
        }
    }

    #[test]
    fn reject_twice_is_an_error_not_a_silent_success() {
        let mut app = draft_application();
        let reviewer = UserId::new();
        app.submit(Utc::now()).unwrap();
        app.reject(reviewer, Utc::now()).unwrap();
        assert!(app.reject(reviewer, Utc::now()).is_err());
    }

    #[test]
    fn complete_from_under_review_records_metadata() {
        let mut app = draft_application();
        let reviewer = UserId::new();
        app.submit(Utc::now()).unwrap();
        app.start_review(reviewer, Utc::now()).unwrap();
        app.complete(reviewer, Utc::now()).unwrap();
        assert_eq!(app.status, ApplicationStatus::Completed);
        assert_eq!(app.reviewer_id, Some(reviewer));
        assert!(app.completed_at.is_some());
    }

    #[test]
    fn draft_is_not_billable_or_issuance_eligible() {
        let app = draft_application();
        assert!(!app.billable());
        assert!(!app.issuance_eligible());
    }

    #[test]
    fn submitted_is_billable_and_issuance_eligible() {
        let mut app = draft_application();
        app.submit(Utc::now()).unwrap();
        assert!(app.billable());
        assert!(app.issuance_eligible());
    }
}
