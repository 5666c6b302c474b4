//! Attendance statistics shared by the dashboard and the report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use attendly_core::serde::{deserialize_optional_date, deserialize_optional_uuid};

use crate::ids::{CourseId, GroupId, StudentId};
use crate::schedule::ScheduleSlotDetail;
use crate::users::Role;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct StatsFilterParams {
    /// Inclusive lower bound
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub to: Option<NaiveDate>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub group: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub student: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub subject: Option<uuid::Uuid>,
}

/// Counts per status and their share of the total, rounded to one decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusBreakdown {
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    pub present_rate: f64,
    pub absent_rate: f64,
    pub late_rate: f64,
    pub excused_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// e.g. `02.09 (Mon)`
    pub label: String,
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
    /// Present marks as a share of all students in scope
    pub present_of_students: f64,
    pub absent_of_students: f64,
    pub late_of_students: f64,
    pub excused_of_students: f64,
    /// Present marks as a share of the day's marks
    pub present_of_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GroupStat {
    pub group_id: GroupId,
    pub group_name: String,
    pub course_id: CourseId,
    pub course_name: String,
    pub students_count: i64,
    pub subjects_count: i64,
    pub total_records: i64,
    pub present_count: i64,
    pub absent_count: i64,
    pub attendance_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AbsentStudent {
    pub student_id: StudentId,
    pub full_name: String,
    pub group_name: Option<String>,
    pub absences: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatsReport {
    /// Number of students the caller can see, after filters
    pub students_in_scope: i64,
    pub overall: StatusBreakdown,
    pub today: StatusBreakdown,
    /// Seven days ending today, oldest first
    pub weekly_trend: Vec<TrendPoint>,
    /// Present-rate per group; only for admins and managers
    pub group_breakdown: Option<Vec<GroupStat>>,
    /// Students with the most absences; only for teachers, admins and managers
    pub top_absent: Option<Vec<AbsentStudent>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InstitutionTotals {
    pub students: i64,
    pub teachers: i64,
    pub groups: i64,
    pub subjects: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChildSummary {
    pub student_id: StudentId,
    pub full_name: String,
    pub group_name: Option<String>,
    pub overall: StatusBreakdown,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub role: Option<Role>,
    pub stats: StatsReport,
    /// Institution-wide counts; only for admins and managers
    pub totals: Option<InstitutionTotals>,
    /// The caller's lessons today (teachers and students)
    pub today_lessons: Vec<ScheduleSlotDetail>,
    /// Per-child summaries for parents
    pub children: Vec<ChildSummary>,
}
