use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::Role;
use crate::error::NrcError;
use crate::store::{Record, Row, Table};

cell_enum! {
    #[derive(Default)]
    pub enum NotificationKind {
        SamAlert => "sam_alert",
        Admission => "admission",
        Discharge => "discharge",
        VisitScheduled => "visit_scheduled",
        #[default]
        General => "general",
    }
}

/// Addressed to one user, to every user of a role, or both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub user_id: Option<String>,
    pub recipient_role: Option<Role>,
    pub kind: NotificationKind,
    pub message: String,
    pub patient_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: super::new_id(),
            user_id: None,
            recipient_role: None,
            kind,
            message: message.into(),
            patient_id: None,
            read: false,
            created_at: super::now(),
        }
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn for_role(mut self, role: Role) -> Self {
        self.recipient_role = Some(role);
        self
    }

    pub fn about(mut self, patient_id: impl Into<String>) -> Self {
        self.patient_id = Some(patient_id.into());
        self
    }

    /// Whether a user with `user_id` and `role` should see this notification.
    pub fn visible_to(&self, user_id: Option<&str>, role: Option<Role>) -> bool {
        let direct = user_id.is_some() && self.user_id.as_deref() == user_id;
        let by_role = role.is_some() && self.recipient_role == role;
        direct || by_role
    }
}

impl Record for Notification {
    const TABLE: Table = Table::Notifications;

    fn from_row(row: &Row) -> Result<Self, NrcError> {
        Ok(Self {
            id: row.text("id"),
            user_id: row.opt_text("user_id"),
            recipient_role: row.opt_parse(Self::TABLE, "recipient_role")?,
            kind: row.parse(Self::TABLE, "kind")?,
            message: row.text("message"),
            patient_id: row.opt_text("patient_id"),
            read: row.flag("read"),
            created_at: row.parse(Self::TABLE, "created_at")?,
        })
    }

    fn to_row(&self) -> Result<Row, NrcError> {
        Ok(Row::new()
            .with("id", &self.id)
            .with_opt("user_id", self.user_id.as_ref())
            .with_opt("recipient_role", self.recipient_role)
            .with("kind", self.kind.as_str())
            .with("message", &self.message)
            .with_opt("patient_id", self.patient_id.as_ref())
            .with("read", self.read.to_string())
            .with("created_at", self.created_at.to_rfc3339()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub recipient_role: Option<Role>,
    #[serde(default)]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NotificationQuery {
    pub user_id: Option<String>,
    pub role: Option<Role>,
    pub unread_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkAllReadRequest {
    pub user_id: String,
    #[serde(default)]
    pub role: Option<Role>,
}
