//! `certportal-applications` — certification application entity and lifecycle.
//!
//! Pure domain: the status state machine, typed transition requests and their
//! validation, required document types, and the append-only audit trail.
//! Persistence and locking live in `certportal-infra`.

pub mod application;
pub mod audit;
pub mod document;
pub mod requests;

pub use application::{
    Application, ApplicationId, ApplicationStatus, ApplicationType, QualificationTier,
};
pub use audit::{AuditAction, AuditEntry};
pub use document::DocumentType;
pub use requests::{
    ApproveApplication, CreateApplication, RejectApplication, StartReview, SubmitApplication,
};
