//! Application lifecycle controller: create, submit, start review, approve,
//! reject.
//!
//! Submit requires ownership; everything else requires administrator
//! privilege. Each operation locks the Application row before reading its
//! status, so concurrent administrator actions on the same application are
//! serialized by lock acquisition order.

use std::sync::Arc;

use chrono::Utc;

use certportal_applications::{
    Application, ApplicationId, ApplicationStatus, ApproveApplication, AuditAction, AuditEntry,
    CreateApplication, DocumentType, RejectApplication, StartReview, SubmitApplication,
};
use certportal_auth::Principal;
use certportal_core::{
    CodeKind, Precondition, RecordId, WorkflowError, WorkflowResult,
};
use certportal_notifications::NotificationCategory;

use crate::collaborators::{DocumentStore, IdentityDirectory};
use crate::engine::{codes, notify, IssuanceService};
use crate::store::WorkflowStore;

pub struct LifecycleController {
    store: Arc<dyn WorkflowStore>,
    documents: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityDirectory>,
    issuance: IssuanceService,
    required_documents: Vec<DocumentType>,
}

impl LifecycleController {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityDirectory>,
        issuance: IssuanceService,
    ) -> Self {
        Self {
            store,
            documents,
            identity,
            issuance,
            required_documents: DocumentType::ALL.to_vec(),
        }
    }

    pub fn with_required_documents(mut self, required: Vec<DocumentType>) -> Self {
        self.required_documents = required;
        self
    }

    /// Create a new draft application owned by the caller.
    pub async fn create(
        &self,
        caller: &Principal,
        req: CreateApplication,
    ) -> WorkflowResult<Application> {
        req.validate()?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let number = codes::generate_unique(&mut *tx, CodeKind::ApplicationNumber).await?;
        let application = Application::create(
            ApplicationId::new(RecordId::new()),
            caller.user_id,
            req.company_id,
            number,
            req.application_type,
            req.classification,
            req.business_field,
            req.qualification,
            now,
        );
        tx.insert_application(&application).await?;
        tx.insert_audit_entry(&AuditEntry::record(
            application.id,
            AuditAction::Created,
            caller.user_id,
            None,
            now,
        ))
        .await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application.id,
            application_number = %application.application_number,
            "application created"
        );
        Ok(application)
    }

    /// Submit a draft for review. Owner only; all required document types
    /// must be attached.
    pub async fn submit(
        &self,
        caller: &Principal,
        req: SubmitApplication,
    ) -> WorkflowResult<Application> {
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut application = tx
            .lock_application(req.application_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        caller.require_owner(application.owner_id)?;

        let missing = self
            .documents
            .missing_documents(application.id, &self.required_documents)
            .await?;
        if !missing.is_empty() {
            return Err(WorkflowError::precondition(Precondition::MissingDocuments {
                document_types: missing.iter().map(|d| d.as_str().to_string()).collect(),
            }));
        }

        application.submit(now)?;
        tx.update_application(&application).await?;
        tx.insert_audit_entry(&AuditEntry::record(
            application.id,
            AuditAction::Submitted,
            caller.user_id,
            None,
            now,
        ))
        .await?;

        for admin in self.identity.administrator_ids().await? {
            notify::emit(
                &mut *tx,
                admin,
                "Application submitted",
                format!(
                    "Application {} has been submitted and awaits review.",
                    application.application_number
                ),
                NotificationCategory::Application,
                Some(application.id.0),
                Some(format!("/applications/{}", application.id)),
                now,
            )
            .await?;
        }

        tx.commit().await?;
        tracing::info!(application_id = %application.id, "application submitted");
        Ok(application)
    }

    /// Claim a submitted application for review. Administrator only.
    pub async fn start_review(
        &self,
        caller: &Principal,
        req: StartReview,
    ) -> WorkflowResult<Application> {
        caller.require_admin()?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut application = tx
            .lock_application(req.application_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        application.start_review(caller.user_id, now)?;
        tx.update_application(&application).await?;
        tx.insert_audit_entry(&AuditEntry::record(
            application.id,
            AuditAction::ReviewStarted,
            caller.user_id,
            None,
            now,
        ))
        .await?;
        notify::emit(
            &mut *tx,
            application.owner_id,
            "Application under review",
            format!(
                "Application {} is now under review.",
                application.application_number
            ),
            NotificationCategory::Application,
            Some(application.id.0),
            Some(format!("/applications/{}", application.id)),
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(application_id = %application.id, reviewer = %caller.user_id, "review started");
        Ok(application)
    }

    /// Approve directly, issuing the certificate without a billing step.
    ///
    /// Idempotent against the payment-confirmation race: if a concurrent
    /// `paid` confirmation already completed the application and issued its
    /// certificate, approve succeeds as a no-op.
    pub async fn approve(
        &self,
        caller: &Principal,
        req: ApproveApplication,
    ) -> WorkflowResult<Application> {
        caller.require_admin()?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut application = tx
            .lock_application(req.application_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        if matches!(
            application.status,
            ApplicationStatus::Draft | ApplicationStatus::Rejected
        ) {
            return Err(WorkflowError::illegal_transition(
                application.status.as_str(),
                ApplicationStatus::Completed.as_str(),
            ));
        }

        if application.status == ApplicationStatus::Completed
            && tx.certificate_exists(application.id).await?
        {
            tracing::info!(
                application_id = %application.id,
                "already completed with certificate, approve is a no-op"
            );
            tx.commit().await?;
            return Ok(application);
        }

        // Verification can be revoked between submit and approval.
        if !self.identity.is_verified(application.owner_id).await? {
            return Err(WorkflowError::precondition(Precondition::OwnerNotVerified));
        }

        self.issuance
            .issue_if_eligible(&mut *tx, &mut application, caller.user_id, now)
            .await?;
        tx.commit().await?;

        tracing::info!(application_id = %application.id, reviewer = %caller.user_id, "application approved");
        Ok(application)
    }

    /// Reject with a reason. Illegal once the application is final.
    pub async fn reject(
        &self,
        caller: &Principal,
        req: RejectApplication,
    ) -> WorkflowResult<Application> {
        caller.require_admin()?;
        req.validate()?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut application = tx
            .lock_application(req.application_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        application.reject(caller.user_id, now)?;
        tx.update_application(&application).await?;
        tx.insert_audit_entry(&AuditEntry::record(
            application.id,
            AuditAction::Rejected,
            caller.user_id,
            Some(req.reason.clone()),
            now,
        ))
        .await?;
        notify::emit(
            &mut *tx,
            application.owner_id,
            "Application rejected",
            format!(
                "Application {} was rejected: {}",
                application.application_number, req.reason
            ),
            NotificationCategory::Application,
            Some(application.id.0),
            Some(format!("/applications/{}", application.id)),
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(application_id = %application.id, reviewer = %caller.user_id, "application rejected");
        Ok(application)
    }

    /// Read one application: owner or administrator view.
    pub async fn view(
        &self,
        caller: &Principal,
        id: ApplicationId,
    ) -> WorkflowResult<Application> {
        let mut tx = self.store.begin().await?;
        let application = tx
            .find_application(id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !caller.role.is_admin() {
            caller.require_owner(application.owner_id)?;
        }
        tx.rollback().await?;
        Ok(application)
    }
}
