//! Weekly timetable: schedule slots and rosters.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use attendly_core::serde::{deserialize_optional_bool, deserialize_optional_date, deserialize_optional_uuid};

use crate::attendance::AttendanceStatus;
use crate::ids::{
    AttendanceId, CourseId, GroupId, ScheduleSlotId, StudentId, SubjectId, TeacherId, TimeSlotId,
    UserId,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "weekday", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// The weekday a calendar date falls on.
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    pub fn short_name(&self) -> &'static str {
        &self.name()[..3]
    }
}

/// One weekly recurring lesson as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ScheduleSlot {
    pub id: ScheduleSlotId,
    pub subject_id: SubjectId,
    pub teacher_id: TeacherId,
    pub group_id: GroupId,
    pub day_of_week: Weekday,
    pub time_slot_id: TimeSlotId,
    pub room: Option<String>,
    pub is_active: bool,
}

/// A schedule slot joined with the names a timetable view needs.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ScheduleSlotDetail {
    pub id: ScheduleSlotId,
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub teacher_id: TeacherId,
    pub teacher_name: String,
    pub group_id: GroupId,
    pub group_name: String,
    pub course_id: CourseId,
    pub day_of_week: Weekday,
    pub time_slot_id: TimeSlotId,
    pub time_slot_name: String,
    pub sequence: i16,
    #[schema(value_type = String, example = "08:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "09:20:00")]
    pub end_time: NaiveTime,
    pub room: Option<String>,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpsertScheduleSlotDto {
    pub subject_id: SubjectId,
    /// Defaults to the subject's teacher
    pub teacher_id: Option<TeacherId>,
    pub group_id: GroupId,
    pub day_of_week: Weekday,
    pub time_slot_id: TimeSlotId,
    #[validate(length(max = 50, message = "Room must be at most 50 characters"))]
    pub room: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ScheduleFilterParams {
    pub day: Option<Weekday>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub group: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub teacher: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub course: Option<uuid::Uuid>,
    /// Only active slots (default `true`)
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub active_only: Option<bool>,
}

impl ScheduleFilterParams {
    pub fn active_only(&self) -> bool {
        self.active_only.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct DayParams {
    pub day: Option<Weekday>,
}

/// Result of retiring or reactivating a slot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotActivationResponse {
    pub slot: ScheduleSlotDetail,
    /// Attendance records that keep pointing at this slot
    pub attendance_preserved: i64,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RosterParams {
    /// Lesson date (defaults to today)
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub date: Option<NaiveDate>,
}

/// A student on a combined roster with their mark for the lesson date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RosterEntry {
    pub student_id: StudentId,
    pub full_name: String,
    pub group_id: GroupId,
    pub group_name: String,
    /// The section slot this student attends
    pub schedule_slot_id: ScheduleSlotId,
    pub is_marked: bool,
    pub current_status: Option<AttendanceStatus>,
    pub attendance_id: Option<AttendanceId>,
    pub marked_at: Option<DateTime<Utc>>,
    pub marked_by: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LessonInfo {
    pub subject_name: String,
    pub teacher_name: String,
    pub room: Option<String>,
    pub day_of_week: Weekday,
    pub time_slot_name: String,
    pub groups: Vec<String>,
    pub total_students: usize,
    pub marked_count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosterResponse {
    pub schedule_slot_id: ScheduleSlotId,
    pub date: NaiveDate,
    pub lesson_info: LessonInfo,
    pub students: Vec<RosterEntry>,
}
