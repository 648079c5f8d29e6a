//! `certportal-infra` — persistence and the workflow engine.
//!
//! The store layer owns transactions and row-level locking (in-memory for
//! tests/dev, postgres for production); the engine layer implements the
//! lifecycle, billing and certificate-issuance operations on top of it.

pub mod collaborators;
pub mod engine;
pub mod store;

mod integration_tests;

pub use collaborators::{
    DocumentStore, IdentityDirectory, InMemoryDocumentStore, InMemoryIdentityDirectory,
    PgDocumentStore, PgIdentityDirectory,
};
pub use engine::{BillingController, IssuanceService, LifecycleController};
pub use store::{
    InMemoryWorkflowStore, PostgresWorkflowStore, StoreError, WorkflowStore, WorkflowTx,
};
