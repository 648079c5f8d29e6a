//! Append-only audit trail of application transitions.
//!
//! Replaces free-text "append to notes" mutation: every successful transition
//! writes one structured entry in the same commit, so an application's history
//! is auditable without parsing a concatenated text field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use certportal_core::{RecordId, UserId};

use crate::ApplicationId;

/// What happened to the application.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Submitted,
    ReviewStarted,
    Rejected,
    InvoiceCreated,
    PaymentConfirmed,
    CertificateIssued,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Submitted => "submitted",
            AuditAction::ReviewStarted => "review_started",
            AuditAction::Rejected => "rejected",
            AuditAction::InvoiceCreated => "invoice_created",
            AuditAction::PaymentConfirmed => "payment_confirmed",
            AuditAction::CertificateIssued => "certificate_issued",
        }
    }
}

/// One immutable audit record. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: RecordId,
    pub application_id: ApplicationId,
    pub action: AuditAction,
    pub actor: UserId,
    /// Free-form detail (e.g. the administrator's rejection reason).
    pub detail: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn record(
        application_id: ApplicationId,
        action: AuditAction,
        actor: UserId,
        detail: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            application_id,
            action,
            actor,
            detail,
            recorded_at: now,
        }
    }
}
