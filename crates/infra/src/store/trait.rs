use async_trait::async_trait;
use thiserror::Error;

use certportal_applications::{Application, ApplicationId, AuditEntry};
use certportal_billing::{Transaction, TransactionId};
use certportal_certificates::Certificate;
use certportal_core::{CodeKind, WorkflowError};
use certportal_notifications::Notification;

/// Storage-level failure. Deterministic business failures never surface here.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure (connection, lock wait, unanticipated constraint).
    #[error("storage backend: {0}")]
    Backend(String),

    /// A persisted value could not be mapped back into the domain.
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        WorkflowError::Storage(err.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Handle to the persistent workflow state.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Open a transaction. All multi-step engine operations run inside one.
    async fn begin(&self) -> Result<Box<dyn WorkflowTx>, StoreError>;
}

/// One open store transaction.
///
/// `lock_*` acquire a row-level write lock (`SELECT … FOR UPDATE` semantics)
/// held until commit/rollback; they are the serialization point for every
/// engine operation. Dropping an uncommitted transaction rolls it back.
#[async_trait]
pub trait WorkflowTx: Send {
    async fn insert_application(&mut self, application: &Application) -> Result<(), StoreError>;

    /// Read and write-lock an application row.
    async fn lock_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<Application>, StoreError>;

    /// Plain (non-locking) read, for views.
    async fn find_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<Application>, StoreError>;

    async fn update_application(&mut self, application: &Application) -> Result<(), StoreError>;

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError>;

    /// Read and write-lock a transaction row.
    async fn lock_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError>;

    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError>;

    async fn update_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError>;

    /// Whether any `pending` or `paid` transaction exists for the application.
    async fn open_transaction_exists(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<bool, StoreError>;

    async fn insert_certificate(&mut self, certificate: &Certificate) -> Result<(), StoreError>;

    /// Whether a certificate already exists for the application. Must be
    /// called under the application/transaction row lock to be meaningful.
    async fn certificate_exists(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<bool, StoreError>;

    /// Uniqueness probe for the code generator. Runs inside this transaction
    /// so a concurrently-committing sibling cannot slip the same value in
    /// without one of the two failing at commit time.
    async fn code_exists(&mut self, kind: CodeKind, code: &str) -> Result<bool, StoreError>;

    async fn insert_notification(&mut self, notification: &Notification)
        -> Result<(), StoreError>;

    async fn insert_audit_entry(&mut self, entry: &AuditEntry) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
