//! Certificate issuance, idempotent by construction.
//!
//! Called from two trigger points (direct approval and payment confirmation),
//! always with the Application row already locked by the caller's
//! transaction. The existence check under that lock is what makes
//! "at most one certificate per application, ever" hold under concurrency.

use chrono::{DateTime, Utc};

use certportal_applications::{
    Application, ApplicationStatus, AuditAction, AuditEntry,
};
use certportal_certificates::{Certificate, CertificateId, ValidityPolicy};
use certportal_core::{CodeKind, RecordId, UserId, WorkflowResult};
use certportal_notifications::NotificationCategory;

use crate::engine::{codes, notify};
use crate::store::WorkflowTx;

/// Issues certificates under a single validity policy, whichever path
/// triggered the issuance.
#[derive(Debug, Clone)]
pub struct IssuanceService {
    policy: ValidityPolicy,
}

impl IssuanceService {
    pub fn new(policy: ValidityPolicy) -> Self {
        Self { policy }
    }

    /// Issue a certificate for `application` if none exists yet.
    ///
    /// - A certificate already exists → `Ok(None)`, nothing written. This is
    ///   what makes the two trigger points safe to race.
    /// - Application is `draft` or `rejected` → `Ok(None)` with a warning;
    ///   callers that require issuance (direct approval) check eligibility
    ///   before calling, payment confirmation must still record the payment.
    /// - Otherwise: generate both numbers, insert the snapshot certificate,
    ///   complete the application, audit, notify the owner.
    pub async fn issue_if_eligible(
        &self,
        tx: &mut (dyn WorkflowTx + '_),
        application: &mut Application,
        issuer: UserId,
        now: DateTime<Utc>,
    ) -> WorkflowResult<Option<Certificate>> {
        if tx.certificate_exists(application.id).await? {
            tracing::info!(
                application_id = %application.id,
                "certificate already issued, issuance is a no-op"
            );
            return Ok(None);
        }

        if !application.issuance_eligible() {
            tracing::warn!(
                application_id = %application.id,
                status = %application.status,
                "application not eligible for issuance, skipping"
            );
            return Ok(None);
        }

        let certificate_number = codes::generate_unique(tx, CodeKind::CertificateNumber).await?;
        let national_registration =
            codes::generate_unique(tx, CodeKind::NationalRegistration).await?;

        let certificate = Certificate::issue(
            CertificateId::new(RecordId::new()),
            application,
            certificate_number,
            national_registration,
            &self.policy,
            now,
        )?;
        tx.insert_certificate(&certificate).await?;

        if application.status != ApplicationStatus::Completed {
            application.complete(issuer, now)?;
            tx.update_application(application).await?;
        }

        tx.insert_audit_entry(&AuditEntry::record(
            application.id,
            AuditAction::CertificateIssued,
            issuer,
            Some(certificate.certificate_number.clone()),
            now,
        ))
        .await?;

        notify::emit(
            tx,
            application.owner_id,
            "Certificate issued",
            format!(
                "Certificate {} for application {} has been issued.",
                certificate.certificate_number, application.application_number
            ),
            NotificationCategory::Certificate,
            Some(certificate.id.0),
            Some(format!("/certificates/{}", certificate.id)),
            now,
        )
        .await?;

        tracing::info!(
            application_id = %application.id,
            certificate_number = %certificate.certificate_number,
            "certificate issued"
        );

        Ok(Some(certificate))
    }
}

impl Default for IssuanceService {
    fn default() -> Self {
        Self::new(ValidityPolicy::default())
    }
}
