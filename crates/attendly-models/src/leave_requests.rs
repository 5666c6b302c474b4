use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::ids::{LeaveRequestId, StudentId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "leave_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum LeaveStatus {
    #[serde(alias = "pending")]
    Pending,
    #[serde(alias = "approved")]
    Approved,
    #[serde(alias = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[sqlx(type_name = "leave_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Family,
    Personal,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: LeaveRequestId,
    pub student_id: StudentId,
    pub student_name: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub status: LeaveStatus,
    pub requested_by: Option<UserId>,
    pub approved_by: Option<UserId>,
    pub rejection_reason: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub approval_notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

fn validate_range(dto: &CreateLeaveRequestDto) -> Result<(), ValidationError> {
    if dto.end_date < dto.start_date {
        let mut err = ValidationError::new("date_range");
        err.message = Some("end_date must not be before start_date".into());
        return Err(err);
    }
    if (dto.end_date - dto.start_date).num_days() > 365 {
        let mut err = ValidationError::new("date_range");
        err.message = Some("A leave request may span at most one year".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_range"))]
pub struct CreateLeaveRequestDto {
    /// Required when a parent files for a child; ignored for students
    pub student_id: Option<StudentId>,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(length(min = 1, max = 2000, message = "Reason is required"))]
    pub reason: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DecideLeaveRequestDto {
    /// `APPROVED` or `REJECTED`
    pub status: LeaveStatus,
    #[validate(length(max = 1000, message = "Rejection reason must be at most 1000 characters"))]
    pub rejection_reason: Option<String>,
}

/// Counts produced by one run of leave propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PropagationSummary {
    /// Lessons found in the range
    pub lessons: usize,
    /// New Excused records
    pub created: usize,
    /// Existing records overwritten to Excused
    pub overwritten: usize,
    /// Lessons that failed and were skipped
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaveDecisionResponse {
    pub request: LeaveRequest,
    pub propagation: Option<PropagationSummary>,
    /// Whether this call sent the student's notification
    pub notified: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveRequestFilterParams {
    pub status: Option<LeaveStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(start: (i32, u32, u32), end: (i32, u32, u32)) -> CreateLeaveRequestDto {
        CreateLeaveRequestDto {
            student_id: None,
            leave_type: LeaveType::Sick,
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            reason: "Flu".to_string(),
        }
    }

    #[test]
    fn test_reversed_range_is_invalid() {
        assert!(dto((2024, 9, 4), (2024, 9, 2)).validate().is_err());
    }

    #[test]
    fn test_single_day_range_is_valid() {
        assert!(dto((2024, 9, 2), (2024, 9, 2)).validate().is_ok());
    }

    #[test]
    fn test_status_accepts_both_cases() {
        let upper: LeaveStatus = serde_json::from_str(r#""APPROVED""#).unwrap();
        let lower: LeaveStatus = serde_json::from_str(r#""rejected""#).unwrap();
        assert_eq!(upper, LeaveStatus::Approved);
        assert_eq!(lower, LeaveStatus::Rejected);
    }
}
