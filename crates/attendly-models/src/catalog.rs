//! Reference data: courses, groups, teachers, subjects, periods and students.
//!
//! The attendance engine only reads these. They are written by the seeding
//! CLI and by role assignment.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use attendly_core::pagination::{PaginationMeta, PaginationParams};
use attendly_core::serde::deserialize_optional_uuid;

use crate::ids::{CourseId, GroupId, StudentId, SubjectId, TeacherId, TimeSlotId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub year: i16,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub course_id: CourseId,
    pub course_name: String,
    pub students_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Teacher {
    pub id: TeacherId,
    pub user_id: Option<UserId>,
    pub full_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub code: Option<String>,
    pub course_id: Option<CourseId>,
    pub teacher_id: Option<TeacherId>,
    pub teacher_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TimeSlot {
    pub id: TimeSlotId,
    pub name: String,
    #[schema(value_type = String, example = "08:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "09:20:00")]
    pub end_time: NaiveTime,
    pub sequence: i16,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    pub id: StudentId,
    pub user_id: Option<UserId>,
    pub full_name: String,
    pub course_id: Option<CourseId>,
    pub group_id: Option<GroupId>,
    pub group_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct GroupFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub course: Option<uuid::Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SubjectFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub teacher: Option<uuid::Uuid>,
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub course: Option<uuid::Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct StudentFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_uuid")]
    pub group: Option<uuid::Uuid>,
    /// Case-insensitive substring of the student's name
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedStudentsResponse {
    pub data: Vec<Student>,
    pub meta: PaginationMeta,
}
