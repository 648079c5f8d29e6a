//! Billing controller: invoice creation and payment status updates.
//!
//! `update_status` is the payment-webhook entry point; it must tolerate
//! at-least-once delivery, so re-confirming `paid → paid` succeeds without
//! touching anything.

use std::sync::Arc;

use chrono::Utc;

use certportal_applications::{AuditAction, AuditEntry};
use certportal_auth::Principal;
use certportal_billing::{
    CreateInvoice, PaymentOutcome, Transaction, TransactionId, UpdateTransactionStatus,
};
use certportal_certificates::Certificate;
use certportal_core::{CodeKind, Precondition, RecordId, WorkflowError, WorkflowResult};
use certportal_notifications::NotificationCategory;

use crate::engine::{codes, notify, IssuanceService};
use crate::store::WorkflowStore;

pub struct BillingController {
    store: Arc<dyn WorkflowStore>,
    issuance: IssuanceService,
}

impl BillingController {
    pub fn new(store: Arc<dyn WorkflowStore>, issuance: IssuanceService) -> Self {
        Self { store, issuance }
    }

    /// Create a `pending` invoice for an application. Administrator only.
    ///
    /// Locks the Application row so the "no open invoice yet" check cannot
    /// race a concurrent create for the same application.
    pub async fn create_invoice(
        &self,
        caller: &Principal,
        req: CreateInvoice,
    ) -> WorkflowResult<Transaction> {
        caller.require_admin()?;
        req.validate()?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let application = tx
            .lock_application(req.application_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        if !application.billable() {
            return Err(WorkflowError::illegal_transition(
                application.status.as_str(),
                "invoice",
            ));
        }
        if tx.open_transaction_exists(application.id).await? {
            return Err(WorkflowError::precondition(Precondition::InvoiceAlreadyOpen));
        }

        let number = codes::generate_unique(&mut *tx, CodeKind::TransactionNumber).await?;
        let transaction = Transaction::pending(
            TransactionId::new(RecordId::new()),
            application.owner_id,
            application.id,
            number,
            req.amount,
            req.notes,
            now,
        );
        tx.insert_transaction(&transaction).await?;
        tx.insert_audit_entry(&AuditEntry::record(
            application.id,
            AuditAction::InvoiceCreated,
            caller.user_id,
            Some(format!(
                "{} (amount {})",
                transaction.transaction_number, transaction.amount
            )),
            now,
        ))
        .await?;
        notify::emit(
            &mut *tx,
            application.owner_id,
            "Invoice issued",
            format!(
                "Invoice {} for application {} has been issued (amount {}).",
                transaction.transaction_number,
                application.application_number,
                transaction.amount
            ),
            NotificationCategory::Billing,
            Some(transaction.id.0),
            Some(format!("/transactions/{}", transaction.id)),
            now,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            transaction_id = %transaction.id,
            application_id = %application.id,
            amount = transaction.amount,
            "invoice created"
        );
        Ok(transaction)
    }

    /// Update a transaction's payment status; confirming `paid` triggers
    /// certificate issuance when none exists yet.
    ///
    /// Returns the transaction and the certificate, if this call issued one.
    pub async fn update_status(
        &self,
        caller: &Principal,
        req: UpdateTransactionStatus,
    ) -> WorkflowResult<(Transaction, Option<Certificate>)> {
        caller.require_admin()?;
        let now = Utc::now();

        let mut tx = self.store.begin().await?;
        let mut transaction = tx
            .lock_transaction(req.transaction_id)
            .await?
            .ok_or(WorkflowError::NotFound)?;

        let outcome = transaction.apply_status(req.status, req.notes, now)?;
        if outcome == PaymentOutcome::AlreadyPaid {
            // Webhook retry; nothing to write, nothing to issue again.
            tracing::info!(transaction_id = %transaction.id, "paid re-confirmation, no-op");
            tx.commit().await?;
            return Ok((transaction, None));
        }

        tx.update_transaction(&transaction).await?;

        let mut issued = None;
        if outcome == PaymentOutcome::BecamePaid {
            // The application row lock closes the race between two concurrent
            // paid confirmations and between payment and direct approval.
            let mut application = tx
                .lock_application(transaction.application_id)
                .await?
                .ok_or_else(|| {
                    WorkflowError::storage(format!(
                        "transaction {} references missing application {}",
                        transaction.id, transaction.application_id
                    ))
                })?;

            tx.insert_audit_entry(&AuditEntry::record(
                application.id,
                AuditAction::PaymentConfirmed,
                caller.user_id,
                Some(transaction.transaction_number.clone()),
                now,
            ))
            .await?;
            notify::emit(
                &mut *tx,
                transaction.owner_id,
                "Payment confirmed",
                format!(
                    "Payment for invoice {} has been confirmed.",
                    transaction.transaction_number
                ),
                NotificationCategory::Billing,
                Some(transaction.id.0),
                Some(format!("/transactions/{}", transaction.id)),
                now,
            )
            .await?;

            issued = self
                .issuance
                .issue_if_eligible(&mut *tx, &mut application, caller.user_id, now)
                .await?;
        } else {
            notify::emit(
                &mut *tx,
                transaction.owner_id,
                "Payment status updated",
                format!(
                    "Invoice {} is now {}.",
                    transaction.transaction_number, transaction.status
                ),
                NotificationCategory::Billing,
                Some(transaction.id.0),
                Some(format!("/transactions/{}", transaction.id)),
                now,
            )
            .await?;
        }

        tx.commit().await?;
        tracing::info!(
            transaction_id = %transaction.id,
            status = %transaction.status,
            issued_certificate = issued.is_some(),
            "transaction status updated"
        );
        Ok((transaction, issued))
    }

    /// Read one transaction: owner or administrator view.
    pub async fn view(
        &self,
        caller: &Principal,
        id: TransactionId,
    ) -> WorkflowResult<Transaction> {
        let mut tx = self.store.begin().await?;
        let transaction = tx
            .find_transaction(id)
            .await?
            .ok_or(WorkflowError::NotFound)?;
        if !caller.role.is_admin() {
            caller.require_owner(transaction.owner_id)?;
        }
        tx.rollback().await?;
        Ok(transaction)
    }
}
