//! External collaborator interfaces the engine consumes.
//!
//! Document storage and identity live outside this core; the engine only ever
//! asks the questions below. In-memory implementations back tests/dev, the
//! `Pg*` ones read the portal's own tables in production.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use certportal_applications::{ApplicationId, DocumentType};
use certportal_core::UserId;

use crate::store::StoreError;

/// "Does application X have an attached document of type T?"
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// The subset of `required` that is not attached to the application.
    async fn missing_documents(
        &self,
        application_id: ApplicationId,
        required: &[DocumentType],
    ) -> Result<Vec<DocumentType>, StoreError>;
}

/// Account facts the engine re-checks at transition time.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Whether the user's account is active/verified.
    async fn is_verified(&self, user_id: UserId) -> Result<bool, StoreError>;

    /// All administrator accounts (recipients of submission notifications).
    async fn administrator_ids(&self) -> Result<Vec<UserId>, StoreError>;
}

/// In-memory document directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    attached: Mutex<HashMap<ApplicationId, HashSet<DocumentType>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, application_id: ApplicationId, document_type: DocumentType) {
        self.attached
            .lock()
            .expect("document store lock poisoned")
            .entry(application_id)
            .or_default()
            .insert(document_type);
    }

    pub fn attach_all(&self, application_id: ApplicationId, document_types: &[DocumentType]) {
        for dt in document_types {
            self.attach(application_id, *dt);
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn missing_documents(
        &self,
        application_id: ApplicationId,
        required: &[DocumentType],
    ) -> Result<Vec<DocumentType>, StoreError> {
        let attached = self.attached.lock().expect("document store lock poisoned");
        let present = attached.get(&application_id);
        Ok(required
            .iter()
            .filter(|dt| !present.is_some_and(|set| set.contains(dt)))
            .copied()
            .collect())
    }
}

/// In-memory identity directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryIdentityDirectory {
    verified: Mutex<HashSet<UserId>>,
    admins: Mutex<Vec<UserId>>,
}

impl InMemoryIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_verified(&self, user_id: UserId) {
        self.verified
            .lock()
            .expect("identity lock poisoned")
            .insert(user_id);
    }

    pub fn register_admin(&self, user_id: UserId) {
        self.admins
            .lock()
            .expect("identity lock poisoned")
            .push(user_id);
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn is_verified(&self, user_id: UserId) -> Result<bool, StoreError> {
        Ok(self
            .verified
            .lock()
            .expect("identity lock poisoned")
            .contains(&user_id))
    }

    async fn administrator_ids(&self) -> Result<Vec<UserId>, StoreError> {
        Ok(self.admins.lock().expect("identity lock poisoned").clone())
    }
}

/// Postgres-backed document directory (reads the `documents` table).
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn missing_documents(
        &self,
        application_id: ApplicationId,
        required: &[DocumentType],
    ) -> Result<Vec<DocumentType>, StoreError> {
        let rows = sqlx::query(
            "SELECT document_type FROM documents WHERE application_id = $1",
        )
        .bind(application_id.0.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        let mut present: HashSet<DocumentType> = HashSet::new();
        for row in &rows {
            let raw: String = row.try_get("document_type")?;
            // Unknown types in storage are someone else's documents; skip.
            if let Ok(dt) = raw.parse::<DocumentType>() {
                present.insert(dt);
            }
        }

        Ok(required
            .iter()
            .filter(|dt| !present.contains(dt))
            .copied()
            .collect())
    }
}

/// Postgres-backed identity directory (reads the `users` table).
pub struct PgIdentityDirectory {
    pool: PgPool,
}

impl PgIdentityDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityDirectory for PgIdentityDirectory {
    async fn is_verified(&self, user_id: UserId) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND verified) AS present",
        )
        .bind(user_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("present")?)
    }

    async fn administrator_ids(&self) -> Result<Vec<UserId>, StoreError> {
        let rows = sqlx::query("SELECT id FROM users WHERE role IN ('admin', 'super_admin')")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| Ok(row.try_get::<uuid::Uuid, _>("id")?.into()))
            .collect()
    }
}
