//! Bounded generate-and-check loop for unique human-readable codes.
//!
//! Database-level uniqueness is the source of truth: the probe runs through
//! the caller's open transaction, so two concurrent generators cannot both
//! observe "not taken" and both commit — the surrounding lock/unique
//! constraint fails one of them. No centralized counter, no cross-process
//! coordination.

use chrono::Utc;

use certportal_core::{CodeKind, WorkflowError, WorkflowResult};

use crate::store::WorkflowTx;

/// Attempt bound. Exhaustion is fatal to the enclosing transaction and is
/// logged for operational attention.
pub const MAX_CODE_ATTEMPTS: u32 = 100;

/// Generate a code of `kind` that is unused at probe time.
pub async fn generate_unique(
    tx: &mut (dyn WorkflowTx + '_),
    kind: CodeKind,
) -> WorkflowResult<String> {
    for attempt in 1..=MAX_CODE_ATTEMPTS {
        let candidate = kind.candidate(Utc::now(), rand::random());
        if !tx.code_exists(kind, &candidate).await? {
            if attempt > 1 {
                // Retries are expected to be rare; a climbing count means
                // collision pressure on this code space.
                tracing::warn!(kind = %kind, retries = attempt - 1, "unique code found after retries");
            }
            return Ok(candidate);
        }
        tracing::debug!(kind = %kind, attempt, candidate = %candidate, "code collision, retrying");
    }

    tracing::error!(kind = %kind, attempts = MAX_CODE_ATTEMPTS, "code generation exhausted");
    Err(WorkflowError::CodeGenerationExhausted {
        kind: kind.as_str().to_string(),
        attempts: MAX_CODE_ATTEMPTS,
    })
}
