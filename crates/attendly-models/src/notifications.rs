use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use attendly_core::pagination::{PaginationMeta, PaginationParams};
use attendly_core::serde::deserialize_optional_bool;

use crate::ids::{LeaveRequestId, NotificationId, StudentId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Absence,
    LeaveApproved,
    LeaveRejected,
    General,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Absence => "absence",
            NotificationKind::LeaveApproved => "leave_approved",
            NotificationKind::LeaveRejected => "leave_rejected",
            NotificationKind::General => "general",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub sender_id: Option<UserId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub student_id: Option<StudentId>,
    pub leave_request_id: Option<LeaveRequestId>,
    pub created_at: DateTime<Utc>,
}

/// A message waiting to be delivered to one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub sender_id: Option<UserId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub student_id: Option<StudentId>,
    pub leave_request_id: Option<LeaveRequestId>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct NotificationFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub unread_only: Option<bool>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedNotificationsResponse {
    pub data: Vec<Notification>,
    pub unread: i64,
    pub meta: PaginationMeta,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub updated: i64,
}
