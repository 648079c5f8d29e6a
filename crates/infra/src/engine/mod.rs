//! The workflow engine: lifecycle, billing and certificate issuance.
//!
//! Every operation here is stateless between calls; all shared state lives in
//! the workflow store, and every multi-step operation runs inside one store
//! transaction that locks the target row before reading its status.

pub mod billing;
pub mod codes;
pub mod issuance;
pub mod lifecycle;
pub mod notify;

pub use billing::BillingController;
pub use issuance::IssuanceService;
pub use lifecycle::LifecycleController;
