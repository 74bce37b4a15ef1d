//! Activity history model.
//!
//! # Invariants
//! - Activities are append-only; they are removed only with their contact.
//! - Only touch-point types advance a contact's `last_touch_at`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::contact::ContactId;
use super::directory::UserId;

pub type ActivityId = Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    #[default]
    Note,
    Call,
    Meeting,
    EmailLogged,
    TextLogged,
    DocumentSent,
    DocumentReceived,
    StatusChange,
    TaskCreated,
    TaskCompleted,
}

impl ActivityType {
    pub const ALL: [ActivityType; 10] = [
        ActivityType::Note,
        ActivityType::Call,
        ActivityType::Meeting,
        ActivityType::EmailLogged,
        ActivityType::TextLogged,
        ActivityType::DocumentSent,
        ActivityType::DocumentReceived,
        ActivityType::StatusChange,
        ActivityType::TaskCreated,
        ActivityType::TaskCompleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Note => "NOTE",
            ActivityType::Call => "CALL",
            ActivityType::Meeting => "MEETING",
            ActivityType::EmailLogged => "EMAIL_LOGGED",
            ActivityType::TextLogged => "TEXT_LOGGED",
            ActivityType::DocumentSent => "DOCUMENT_SENT",
            ActivityType::DocumentReceived => "DOCUMENT_RECEIVED",
            ActivityType::StatusChange => "STATUS_CHANGE",
            ActivityType::TaskCreated => "TASK_CREATED",
            ActivityType::TaskCompleted => "TASK_COMPLETED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Whether logging this activity counts as touching the contact.
    pub fn is_touch_point(self) -> bool {
        matches!(
            self,
            ActivityType::Call | ActivityType::Meeting | ActivityType::EmailLogged
        )
    }
}

/// One entry in a contact's activity history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub contact_id: ContactId,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub occurred_at: i64,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub actor_user_id: Option<UserId>,
    pub created_at: i64,
}

/// Input for logging an activity. Missing `occurred_at` means "now".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    pub contact_id: ContactId,
    #[serde(rename = "type", default)]
    pub kind: ActivityType,
    #[serde(default)]
    pub occurred_at: Option<i64>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub actor_user_id: Option<UserId>,
}

impl NewActivity {
    pub fn new(contact_id: ContactId, kind: ActivityType) -> Self {
        Self {
            contact_id,
            kind,
            occurred_at: None,
            subject: None,
            body: None,
            actor_user_id: None,
        }
    }
}
