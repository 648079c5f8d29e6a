use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use certportal_applications::ApplicationId;
use certportal_core::{RecordId, UserId, WorkflowError, WorkflowResult};

/// Transaction (invoice) identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub RecordId);

impl TransactionId {
    pub fn new(id: RecordId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for TransactionId {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(RecordId::from_str(s)?))
    }
}

/// Payment status lifecycle.
///
/// One-directional: `paid`, `cancelled` and `refunded` are terminal, with the
/// single exception that re-confirming `paid → paid` is a no-op success
/// (payment webhooks retry).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
    Refunded,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Paid | TransactionStatus::Cancelled | TransactionStatus::Refunded
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Refunded => "refunded",
        }
    }
}

impl core::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = WorkflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "paid" => Ok(TransactionStatus::Paid),
            "failed" => Ok(TransactionStatus::Failed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            "refunded" => Ok(TransactionStatus::Refunded),
            other => Err(WorkflowError::validation(format!(
                "unknown transaction status '{other}'"
            ))),
        }
    }
}

/// What a status update did, so the caller can decide whether certificate
/// issuance must be triggered.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Status moved to something other than `paid`.
    Updated,
    /// Status moved to `paid` for the first time.
    BecamePaid,
    /// `paid → paid` retry; nothing changed.
    AlreadyPaid,
}

/// One billing invoice, tied to exactly one application. Never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub owner_id: UserId,
    pub application_id: ApplicationId,
    /// Human-readable unique number, `TRX-<10 digits>`.
    pub transaction_number: String,
    /// Amount in the smallest currency unit.
    pub amount: u64,
    pub status: TransactionStatus,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new `pending` invoice.
    pub fn pending(
        id: TransactionId,
        owner_id: UserId,
        application_id: ApplicationId,
        transaction_number: String,
        amount: u64,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            application_id,
            transaction_number,
            amount,
            status: TransactionStatus::Pending,
            payment_method: None,
            payment_reference: None,
            paid_at: None,
            notes,
            created_at: now,
        }
    }

    /// Apply a status update under the row lock.
    ///
    /// Terminal statuses refuse further movement, except the idempotent
    /// `paid → paid` retry which reports `AlreadyPaid` without touching the
    /// row.
    pub fn apply_status(
        &mut self,
        new_status: TransactionStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> WorkflowResult<PaymentOutcome> {
        if self.status == TransactionStatus::Paid && new_status == TransactionStatus::Paid {
            return Ok(PaymentOutcome::AlreadyPaid);
        }
        if self.status.is_terminal() {
            return Err(WorkflowError::illegal_transition(
                self.status.as_str(),
                new_status.as_str(),
            ));
        }
        if new_status == TransactionStatus::Pending {
            return Err(WorkflowError::illegal_transition(
                self.status.as_str(),
                new_status.as_str(),
            ));
        }

        self.status = new_status;
        if let Some(notes) = notes {
            self.notes = Some(notes);
        }
        if new_status == TransactionStatus::Paid {
            self.paid_at = Some(now);
            return Ok(PaymentOutcome::BecamePaid);
        }
        Ok(PaymentOutcome::Updated)
    }
}

/// Request: create an invoice for an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub application_id: ApplicationId,
    pub amount: u64,
    pub notes: Option<String>,
}

impl CreateInvoice {
    /// Largest storable amount; the amount column is a signed 64-bit integer.
    pub const MAX_AMOUNT: u64 = i64::MAX as u64;

    pub fn validate(&self) -> WorkflowResult<()> {
        if self.amount == 0 {
            return Err(WorkflowError::validation("invoice amount must be positive"));
        }
        if self.amount > Self::MAX_AMOUNT {
            return Err(WorkflowError::validation(
                "invoice amount exceeds the supported range",
            ));
        }
        Ok(())
    }
}

/// Request: update a transaction's payment status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTransactionStatus {
    pub transaction_id: TransactionId,
    pub status: TransactionStatus,
    pub notes: Option<String>,
}
