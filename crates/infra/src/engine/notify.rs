//! Notification emitter.
//!
//! Pure insert, no business logic. Always called as the last statements
//! before commit, inside the same transaction as the triggering state change:
//! a notification is never observed without its transition having committed,
//! and never survives a rollback.

use chrono::{DateTime, Utc};

use certportal_core::{RecordId, UserId, WorkflowResult};
use certportal_notifications::{Notification, NotificationCategory};

use crate::store::WorkflowTx;

#[allow(clippy::too_many_arguments)]
pub async fn emit(
    tx: &mut (dyn WorkflowTx + '_),
    user_id: UserId,
    title: &str,
    message: String,
    category: NotificationCategory,
    related_entity_id: Option<RecordId>,
    action_url: Option<String>,
    now: DateTime<Utc>,
) -> WorkflowResult<()> {
    let notification = Notification::new(
        user_id,
        title,
        message,
        category,
        related_entity_id,
        action_url,
        now,
    );
    tx.insert_notification(&notification).await?;
    Ok(())
}
