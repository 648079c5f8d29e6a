//! Workflow store: transactional persistence with row-level locking.

pub mod in_memory;
pub mod postgres;
mod r#trait;

pub use in_memory::InMemoryWorkflowStore;
pub use postgres::PostgresWorkflowStore;
pub use r#trait::{StoreError, WorkflowStore, WorkflowTx};
