//! Workflow error taxonomy.
//!
//! Keep this focused on deterministic, business/domain failures (validation,
//! illegal transitions, unmet preconditions). Storage failures are carried in
//! a single opaque variant; infrastructure detail belongs in logs, not here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the workflow engine.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// A business precondition that failed before any state was changed.
///
/// Structured so callers can render actionable detail (e.g. the exact list of
/// missing document types) instead of parsing a message string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Precondition {
    /// Submit requires every administratively-required document type.
    MissingDocuments { document_types: Vec<String> },
    /// An application may carry at most one open (pending or paid) invoice.
    InvoiceAlreadyOpen,
    /// The applicant's account must be active/verified at approval time.
    OwnerNotVerified,
}

impl core::fmt::Display for Precondition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Precondition::MissingDocuments { document_types } => {
                write!(f, "missing required documents: {}", document_types.join(", "))
            }
            Precondition::InvoiceAlreadyOpen => {
                write!(f, "an open invoice already exists for this application")
            }
            Precondition::OwnerNotVerified => {
                write!(f, "applicant account is not verified")
            }
        }
    }
}

/// Workflow-level error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// A value failed validation (e.g. malformed input, notes too short).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Target record does not exist, or is invisible to the caller.
    ///
    /// Ownership filters deliberately collapse into this variant so existence
    /// is not leaked across ownership boundaries.
    #[error("not found")]
    NotFound,

    /// The record exists but is not in a status from which the requested
    /// transition is legal. Carries the current status to aid the caller.
    #[error("illegal transition from '{current}' (requested: {requested})")]
    IllegalTransition { current: String, requested: String },

    /// A business precondition failed; no state was changed.
    #[error("precondition unmet: {0}")]
    Precondition(Precondition),

    /// The unique code generator ran out of attempts. Fatal to the enclosing
    /// transaction; should not occur in practice and warrants operator
    /// attention.
    #[error("code generation exhausted for {kind} after {attempts} attempts")]
    CodeGenerationExhausted { kind: String, attempts: u32 },

    /// Unanticipated storage failure (lock timeout, constraint violation).
    #[error("storage error: {0}")]
    Storage(String),

    /// Authorization failure at the workflow boundary.
    #[error("unauthorized")]
    Unauthorized,
}

impl WorkflowError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn illegal_transition(current: impl Into<String>, requested: impl Into<String>) -> Self {
        Self::IllegalTransition {
            current: current.into(),
            requested: requested.into(),
        }
    }

    pub fn precondition(p: Precondition) -> Self {
        Self::Precondition(p)
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
