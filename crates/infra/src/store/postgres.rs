//! Postgres-backed workflow store.
//!
//! Row locks are real `SELECT … FOR UPDATE` locks held to commit; the schema
//! (see `sql/schema.sql`) carries unique constraints on every generated code
//! column, so the generator's probe-inside-transaction discipline is backed
//! by a database-level source of truth.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction as PgTransaction};
use uuid::Uuid;

use certportal_applications::{Application, ApplicationId, AuditEntry};
use certportal_billing::{Transaction, TransactionId};
use certportal_certificates::Certificate;
use certportal_core::{CodeKind, RecordId, WorkflowError};
use certportal_notifications::Notification;

use super::r#trait::{StoreError, WorkflowStore, WorkflowTx};

/// Production store over a sqlx connection pool (thread-safe, cloneable).
pub struct PostgresWorkflowStore {
    pool: PgPool,
}

impl PostgresWorkflowStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowStore for PostgresWorkflowStore {
    async fn begin(&self) -> Result<Box<dyn WorkflowTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgWorkflowTx { tx }))
    }
}

/// One open postgres transaction. Dropped without commit → rolled back by
/// sqlx.
struct PgWorkflowTx {
    tx: PgTransaction<'static, Postgres>,
}

fn corrupt(err: WorkflowError) -> StoreError {
    StoreError::CorruptRow(err.to_string())
}

fn map_application(row: &PgRow) -> Result<Application, StoreError> {
    Ok(Application {
        id: ApplicationId::new(RecordId::from_uuid(row.try_get("id")?)),
        owner_id: row.try_get::<Uuid, _>("owner_id")?.into(),
        company_id: row.try_get::<Uuid, _>("company_id")?.into(),
        application_number: row.try_get("application_number")?,
        application_type: row
            .try_get::<String, _>("application_type")?
            .parse()
            .map_err(corrupt)?,
        classification: row.try_get("classification")?,
        business_field: row.try_get("business_field")?,
        qualification: row
            .try_get::<String, _>("qualification")?
            .parse()
            .map_err(corrupt)?,
        status: row.try_get::<String, _>("status")?.parse().map_err(corrupt)?,
        submitted_at: row.try_get("submitted_at")?,
        reviewed_at: row.try_get("reviewed_at")?,
        completed_at: row.try_get("completed_at")?,
        notes: row.try_get("notes")?,
        reviewer_id: row
            .try_get::<Option<Uuid>, _>("reviewer_id")?
            .map(Into::into),
        created_at: row.try_get("created_at")?,
    })
}

fn map_transaction(row: &PgRow) -> Result<Transaction, StoreError> {
    Ok(Transaction {
        id: TransactionId::new(RecordId::from_uuid(row.try_get("id")?)),
        owner_id: row.try_get::<Uuid, _>("owner_id")?.into(),
        application_id: ApplicationId::new(RecordId::from_uuid(row.try_get("application_id")?)),
        transaction_number: row.try_get("transaction_number")?,
        amount: row.try_get::<i64, _>("amount")? as u64,
        status: row.try_get::<String, _>("status")?.parse().map_err(corrupt)?,
        payment_method: row.try_get("payment_method")?,
        payment_reference: row.try_get("payment_reference")?,
        paid_at: row.try_get("paid_at")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

const APPLICATION_COLUMNS: &str = "id, owner_id, company_id, application_number, \
     application_type, classification, business_field, qualification, status, \
     submitted_at, reviewed_at, completed_at, notes, reviewer_id, created_at";

const TRANSACTION_COLUMNS: &str = "id, owner_id, application_id, transaction_number, \
     amount, status, payment_method, payment_reference, paid_at, notes, created_at";

#[async_trait]
impl WorkflowTx for PgWorkflowTx {
    async fn insert_application(&mut self, application: &Application) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO applications \
             (id, owner_id, company_id, application_number, application_type, \
              classification, business_field, qualification, status, submitted_at, \
              reviewed_at, completed_at, notes, reviewer_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(application.id.0.as_uuid())
        .bind(application.owner_id.as_uuid())
        .bind(application.company_id.as_uuid())
        .bind(&application.application_number)
        .bind(application.application_type.as_str())
        .bind(&application.classification)
        .bind(&application.business_field)
        .bind(application.qualification.as_str())
        .bind(application.status.as_str())
        .bind(application.submitted_at)
        .bind(application.reviewed_at)
        .bind(application.completed_at)
        .bind(&application.notes)
        .bind(application.reviewer_id.map(|r| *r.as_uuid()))
        .bind(application.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn lock_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<Application>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.0.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(map_application).transpose()
    }

    async fn find_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<Application>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id.0.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(map_application).transpose()
    }

    async fn update_application(&mut self, application: &Application) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE applications SET status = $2, submitted_at = $3, reviewed_at = $4, \
             completed_at = $5, notes = $6, reviewer_id = $7, classification = $8, \
             business_field = $9, qualification = $10 WHERE id = $1",
        )
        .bind(application.id.0.as_uuid())
        .bind(application.status.as_str())
        .bind(application.submitted_at)
        .bind(application.reviewed_at)
        .bind(application.completed_at)
        .bind(&application.notes)
        .bind(application.reviewer_id.map(|r| *r.as_uuid()))
        .bind(&application.classification)
        .bind(&application.business_field)
        .bind(application.qualification.as_str())
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO transactions \
             (id, owner_id, application_id, transaction_number, amount, status, \
              payment_method, payment_reference, paid_at, notes, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(transaction.id.0.as_uuid())
        .bind(transaction.owner_id.as_uuid())
        .bind(transaction.application_id.0.as_uuid())
        .bind(&transaction.transaction_number)
        .bind(transaction.amount as i64)
        .bind(transaction.status.as_str())
        .bind(&transaction.payment_method)
        .bind(&transaction.payment_reference)
        .bind(transaction.paid_at)
        .bind(&transaction.notes)
        .bind(transaction.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn lock_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.0.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(map_transaction).transpose()
    }

    async fn find_transaction(
        &mut self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id.0.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(map_transaction).transpose()
    }

    async fn update_transaction(&mut self, transaction: &Transaction) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE transactions SET status = $2, payment_method = $3, \
             payment_reference = $4, paid_at = $5, notes = $6 WHERE id = $1",
        )
        .bind(transaction.id.0.as_uuid())
        .bind(transaction.status.as_str())
        .bind(&transaction.payment_method)
        .bind(&transaction.payment_reference)
        .bind(transaction.paid_at)
        .bind(&transaction.notes)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn open_transaction_exists(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM transactions \
             WHERE application_id = $1 AND status IN ('pending', 'paid')) AS present",
        )
        .bind(application_id.0.as_uuid())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.try_get("present")?)
    }

    async fn insert_certificate(&mut self, certificate: &Certificate) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO certificates \
             (id, owner_id, application_id, certificate_number, \
              national_registration_number, classification, business_field, \
              qualification, issued_at, expires_at, status, issuer_name, file_path) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(certificate.id.0.as_uuid())
        .bind(certificate.owner_id.as_uuid())
        .bind(certificate.application_id.0.as_uuid())
        .bind(&certificate.certificate_number)
        .bind(&certificate.national_registration_number)
        .bind(&certificate.classification)
        .bind(&certificate.business_field)
        .bind(certificate.qualification.as_str())
        .bind(certificate.issued_at)
        .bind(certificate.expires_at)
        .bind(certificate.status.as_str())
        .bind(&certificate.issuer_name)
        .bind(&certificate.file_path)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn certificate_exists(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM certificates WHERE application_id = $1) AS present",
        )
        .bind(application_id.0.as_uuid())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.try_get("present")?)
    }

    async fn code_exists(&mut self, kind: CodeKind, code: &str) -> Result<bool, StoreError> {
        let query = match kind {
            CodeKind::ApplicationNumber => {
                "SELECT EXISTS(SELECT 1 FROM applications WHERE application_number = $1) AS present"
            }
            CodeKind::TransactionNumber => {
                "SELECT EXISTS(SELECT 1 FROM transactions WHERE transaction_number = $1) AS present"
            }
            CodeKind::CertificateNumber => {
                "SELECT EXISTS(SELECT 1 FROM certificates WHERE certificate_number = $1) AS present"
            }
            CodeKind::NationalRegistration => {
                "SELECT EXISTS(SELECT 1 FROM certificates \
                 WHERE national_registration_number = $1) AS present"
            }
        };
        let row = sqlx::query(query)
            .bind(code)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(row.try_get("present")?)
    }

    async fn insert_notification(
        &mut self,
        notification: &Notification,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO notifications \
             (id, user_id, title, message, category, related_entity_id, action_url, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(notification.id.as_uuid())
        .bind(notification.user_id.as_uuid())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.category.as_str())
        .bind(notification.related_entity_id.map(|r| *r.as_uuid()))
        .bind(&notification.action_url)
        .bind(notification.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_audit_entry(&mut self, entry: &AuditEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO audit_log (id, application_id, action, actor, detail, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id.as_uuid())
        .bind(entry.application_id.0.as_uuid())
        .bind(entry.action.as_str())
        .bind(entry.actor.as_uuid())
        .bind(&entry.detail)
        .bind(entry.recorded_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
