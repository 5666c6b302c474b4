//! Attendance ledger records, marking and amendment DTOs.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use attendly_core::pagination::{PaginationMeta, PaginationParams};
use attendly_core::serde::{deserialize_optional_date, deserialize_optional_uuid};

use crate::ids::{
    AttendanceId, AuditEntryId, GroupId, LeaveRequestId, ScheduleSlotId, StudentId, SubjectId,
    UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "attendance_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[serde(alias = "Present")]
    Present,
    #[serde(alias = "Absent")]
    Absent,
    #[serde(alias = "Late")]
    Late,
    #[serde(alias = "Excused")]
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Absent,
        AttendanceStatus::Late,
        AttendanceStatus::Excused,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "Present",
            AttendanceStatus::Absent => "Absent",
            AttendanceStatus::Late => "Late",
            AttendanceStatus::Excused => "Excused",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

/// The authoritative mark for one student, subject and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub student_id: StudentId,
    pub subject_id: SubjectId,
    pub schedule_slot_id: Option<ScheduleSlotId>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Option<UserId>,
    pub marked_at: DateTime<Utc>,
    pub leave_request_id: Option<LeaveRequestId>,
}

/// A record joined with display names, used by history and listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceRecordDetail {
    pub id: AttendanceId,
    pub student_id: StudentId,
    pub student_name: String,
    pub group_id: Option<GroupId>,
    pub group_name: Option<String>,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub schedule_slot_id: Option<ScheduleSlotId>,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub marked_by: Option<UserId>,
    pub marked_at: DateTime<Utc>,
    pub leave_request_id: Option<LeaveRequestId>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct MarkEntry {
    pub student_id: StudentId,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkMarkDto {
    pub schedule_id: ScheduleSlotId,
    /// Lesson date (defaults to today); must fall on the slot's weekday
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 500, message = "Provide between 1 and 500 entries"))]
    pub entries: Vec<MarkEntry>,
}

/// Outcome of a bulk mark. Skipped students already had a record for the
/// subject and date; their stored mark is left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkMarkOutcome {
    pub created: i64,
    /// Always zero: bulk marking never overwrites
    pub updated: i64,
    pub skipped: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AmendAttendanceDto {
    pub status: AttendanceStatus,
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AmendOutcome {
    pub id: AttendanceId,
    pub old_status: AttendanceStatus,
    pub new_status: AttendanceStatus,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct AmendManyDto {
    #[validate(length(min = 1, max = 1000, message = "Provide between 1 and 1000 record ids"))]
    pub ids: Vec<AttendanceId>,
    pub status: AttendanceStatus,
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AmendManyOutcome {
    pub updated: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceAuditEntry {
    pub id: AuditEntryId,
    pub attendance_id: AttendanceId,
    pub actor_id: Option<UserId>,
    pub old_status: AttendanceStatus,
    pub new_status: AttendanceStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AttendanceAuditEntry {
    /// Human-readable change line, e.g. `Absent → Excused. Doctor's note`.
    pub fn summary(&self) -> String {
        let mut line = format!("{} → {}", self.old_status.label(), self.new_status.label());
        if let Some(reason) = self.reason.as_deref().filter(|r| !r.trim().is_empty()) {
            line.push_str(". ");
            line.push_str(reason.trim());
        }
        line
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct HistoryParams {
    /// Student to read (defaults to the caller's own student profile)
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct AttendanceListParams {
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub group: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject: Option<uuid::Uuid>,
    pub status: Option<AttendanceStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedAttendanceResponse {
    pub data: Vec<AttendanceRecordDetail>,
    pub meta: PaginationMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_accepts_lower_and_title_case() {
        let lower: AttendanceStatus = serde_json::from_str(r#""late""#).unwrap();
        let title: AttendanceStatus = serde_json::from_str(r#""Late""#).unwrap();
        assert_eq!(lower, AttendanceStatus::Late);
        assert_eq!(title, AttendanceStatus::Late);
        assert_eq!(serde_json::to_string(&title).unwrap(), r#""late""#);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result: Result<AttendanceStatus, _> = serde_json::from_str(r#""sick""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_audit_summary() {
        let mut entry = AttendanceAuditEntry {
            id: AuditEntryId::new(),
            attendance_id: AttendanceId::new(),
            actor_id: None,
            old_status: AttendanceStatus::Absent,
            new_status: AttendanceStatus::Excused,
            reason: Some("  Doctor's note ".to_string()),
            created_at: Utc::now(),
        };
        assert_eq!(entry.summary(), "Absent → Excused. Doctor's note");
        entry.reason = Some("   ".to_string());
        assert_eq!(entry.summary(), "Absent → Excused");
    }
}
