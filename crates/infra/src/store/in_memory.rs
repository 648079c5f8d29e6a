use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use certportal_applications::{Application, ApplicationId, AuditEntry};
use certportal_billing::{Transaction, TransactionId, TransactionStatus};
use certportal_certificates::{Certificate, CertificateId};
use certportal_core::CodeKind;
use certportal_notifications::Notification;

use super::r#trait::{StoreError, WorkflowStore, WorkflowTx};

#[derive(Debug, Clone, Default)]
struct State {
    applications: HashMap<ApplicationId, Application>,
    transactions: HashMap<TransactionId, Transaction>,
    certificates: HashMap<CertificateId, Certificate>,
    notifications: Vec<Notification>,
    audit_log: Vec<AuditEntry>,
}

/// In-memory workflow store.
///
/// Intended for tests/dev. "Row-level locking" degrades to one store-wide
/// exclusive lock held for the duration of a transaction, which preserves the
/// serialization guarantees the engine relies on (coarser, never weaker).
#[derive(Debug, Default)]
pub struct InMemoryWorkflowStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Inspection helpers for tests and dev tooling.

    pub async fn application(&self, id: ApplicationId) -> Option<Application> {
        self.state.lock().await.applications.get(&id).cloned()
    }

    pub async fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.state.lock().await.transactions.get(&id).cloned()
    }

    pub async fn certificates_for(&self, application_id: ApplicationId) -> Vec<Certificate> {
        self.state
            .lock()
            .await
            .certificates
            .values()
            .filter(|c| c.application_id == application_id)
            .cloned()
            .collect()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.lock().await.notifications.clone()
    }

    pub async fn audit_entries(&self, application_id: ApplicationId) -> Vec<AuditEntry> {
        self.state
            .lock()
            .await
            .audit_log
            .iter()
            .filter(|e| e.application_id == application_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn begin(&self) -> Result<Box<dyn WorkflowTx>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let snapshot = guard.clone();
        Ok(Box::new(InMemoryTx {
            guard,
            snapshot,
            committed: false,
        }))
    }
}

/// One open in-memory transaction: mutates the live state under the guard and
/// restores the snapshot on rollback (or drop without commit).
struct InMemoryTx {
    guard: OwnedMutexGuard<State>,
    snapshot: State,
    committed: bool,
}

impl Drop for InMemoryTx {
    fn drop(&mut self) {
        if !self.committed {
            *self.guard = self.snapshot.clone();
        }
    }
}

#[async_trait]
impl WorkflowTx for InMemoryTx {
    async fn insert_application(&mut self, application: &Application) -> Result<(), StoreError> {
        self.guard
            .applications
            .insert(application.id, application.clone());
        Ok(())
    }

    async fn lock_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<Application>, StoreError> {
        // The store-wide guard is already exclusive; a plain read suffices.
        Ok(self.guard.applications.get(&id).cloned())
    }

    async fn find_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<Application>, StoreError> {
        Ok(self.guard.applications.get(&id).cloned())
    }

    async fn update_application(&mut self, application: &Application) -> Result<(), StoreError> {
        self.guard
            .applications
            .insert(application.id, application.clone());
        Ok(())
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        self.guard
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn lock_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self.guard.transactions.get(&id).cloned())
    }

    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self.guard.transactions.get(&id).cloned())
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        self.guard
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn open_transaction_exists(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<bool, StoreError> {
        Ok(self.guard.transactions.values().any(|t| {
            t.application_id == application_id
                && matches!(t.status, TransactionStatus::Pending | TransactionStatus::Paid)
        }))
    }

    async fn insert_certificate(&mut self, certificate: &Certificate) -> Result<(), StoreError> {
        self.guard
            .certificates
            .insert(certificate.id, certificate.clone());
        Ok(())
    }

    async fn certificate_exists(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .guard
            .certificates
            .values()
            .any(|c| c.application_id == application_id))
    }

    async fn code_exists(&mut self, kind: CodeKind, code: &str) -> Result<bool, StoreError> {
        let state = &*self.guard;
        let taken = match kind {
            CodeKind::ApplicationNumber => state
                .applications
                .values()
                .any(|a| a.application_number == code),
            CodeKind::TransactionNumber => state
                .transactions
                .values()
                .any(|t| t.transaction_number == code),
            CodeKind::CertificateNumber => state
                .certificates
                .values()
                .any(|c| c.certificate_number == code),
            CodeKind::NationalRegistration => state
                .certificates
                .values()
                .any(|c| c.national_registration_number.as_deref() == Some(code)),
        };
        Ok(taken)
    }

    async fn insert_notification(
        &mut self,
        notification: &Notification,
    ) -> Result<(), StoreError> {
        self.guard.notifications.push(notification.clone());
        Ok(())
    }

    async fn insert_audit_entry(&mut self, entry: &AuditEntry) -> Result<(), StoreError> {
        self.guard.audit_log.push(entry.clone());
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> Result<(), StoreError> {
        self.committed = true;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), StoreError> {
        *self.guard = self.snapshot.clone();
        self.committed = true;
        Ok(())
    }
}
