//! `certportal-notifications` — append-only user-facing notification records.
//!
//! A notification row is inserted as the last statement of the same store
//! transaction as the state change it reports: it is never observed without
//! its transition having committed, and never survives a rollback. Delivery
//! (email/push) is an external collaborator reading these rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use certportal_core::{RecordId, UserId};

/// What part of the workflow the notification belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Application,
    Billing,
    Certificate,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Application => "application",
            NotificationCategory::Billing => "billing",
            NotificationCategory::Certificate => "certificate",
        }
    }
}

/// One notification addressed to a user. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: RecordId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub category: NotificationCategory,
    pub related_entity_id: Option<RecordId>,
    pub action_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        category: NotificationCategory,
        related_entity_id: Option<RecordId>,
        action_url: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            user_id,
            title: title.into(),
            message: message.into(),
            category,
            related_entity_id,
            action_url,
            created_at: now,
        }
    }
}
