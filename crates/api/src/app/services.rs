//! Store and collaborator wiring for the HTTP API.
//!
//! Two backends: Postgres when `DATABASE_URL` is set, otherwise an in-memory
//! store for dev/test. The controllers are backend-agnostic; only this module
//! knows which implementations sit behind them.

use std::sync::Arc;

use sqlx::PgPool;

use certportal_certificates::ValidityPolicy;
use certportal_infra::{
    BillingController, DocumentStore, IdentityDirectory, InMemoryDocumentStore,
    InMemoryIdentityDirectory, InMemoryWorkflowStore, IssuanceService, LifecycleController,
    PgDocumentStore, PgIdentityDirectory, PostgresWorkflowStore, WorkflowStore,
};

/// Shared controller handles for the route layer.
pub struct AppServices {
    pub lifecycle: Arc<LifecycleController>,
    pub billing: Arc<BillingController>,
}

/// Direct handles into the in-memory backend, for seeding in dev/tests.
pub struct InMemoryHandles {
    pub store: Arc<InMemoryWorkflowStore>,
    pub documents: Arc<InMemoryDocumentStore>,
    pub identity: Arc<InMemoryIdentityDirectory>,
}

/// Certificate validity window, overridable via environment.
fn policy_from_env() -> ValidityPolicy {
    let mut policy = ValidityPolicy::default();
    if let Ok(raw) = std::env::var("CERTIFICATE_VALIDITY_YEARS") {
        match raw.parse::<u32>() {
            Ok(years) if (1..=100).contains(&years) => policy.validity_years = years,
            _ => tracing::warn!(%raw, "ignoring out-of-range CERTIFICATE_VALIDITY_YEARS"),
        }
    }
    if let Ok(name) = std::env::var("CERTIFICATE_ISSUER_NAME") {
        policy.issuer_name = name;
    }
    policy
}

fn assemble(
    store: Arc<dyn WorkflowStore>,
    documents: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityDirectory>,
) -> AppServices {
    let issuance = IssuanceService::new(policy_from_env());
    let lifecycle = Arc::new(LifecycleController::new(
        store.clone(),
        documents,
        identity,
        issuance.clone(),
    ));
    let billing = Arc::new(BillingController::new(store, issuance));
    AppServices { lifecycle, billing }
}

/// In-memory wiring for dev/tests, with handles for seeding.
pub fn in_memory_services() -> (AppServices, InMemoryHandles) {
    let store = Arc::new(InMemoryWorkflowStore::new());
    let documents = Arc::new(InMemoryDocumentStore::new());
    let identity = Arc::new(InMemoryIdentityDirectory::new());
    let services = assemble(store.clone(), documents.clone(), identity.clone());
    (
        services,
        InMemoryHandles {
            store,
            documents,
            identity,
        },
    )
}

/// Postgres wiring for production.
pub fn postgres_services(pool: PgPool) -> AppServices {
    let store = Arc::new(PostgresWorkflowStore::new(pool.clone()));
    let documents = Arc::new(PgDocumentStore::new(pool.clone()));
    let identity = Arc::new(PgIdentityDirectory::new(pool));
    assemble(store, documents, identity)
}

/// Pick the backend from the environment (`main.rs` entrypoint).
pub async fn build_services() -> AppServices {
    match std::env::var("DATABASE_URL") {
        Ok(url) => {
            let pool = PgPool::connect(&url)
                .await
                .expect("failed to connect to Postgres");
            postgres_services(pool)
        }
        Err(_) => {
            tracing::warn!("DATABASE_URL not set; using in-memory store (state is not persisted)");
            in_memory_services().0
        }
    }
}
