//! Pure decision logic for leave requests: which state transition a decision
//! performs, and which lessons an approved range covers.

use std::collections::HashSet;

use attendly_core::AppError;
use attendly_models::{LeaveStatus, ScheduleSlotId, SubjectId, Weekday};
use chrono::NaiveDate;

/// What a decision does to a request in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveTransition {
    /// PENDING -> APPROVED: record the approval, then propagate.
    Approve,
    /// APPROVED -> APPROVED: a no-op. Propagation and the student
    /// notification belong to the first approval only.
    Reapprove,
    /// PENDING -> REJECTED
    Reject,
    /// REJECTED -> REJECTED: only the rejection reason may change.
    UpdateRejection,
}

pub fn plan_transition(
    current: LeaveStatus,
    target: LeaveStatus,
) -> Result<LeaveTransition, AppError> {
    match (current, target) {
        (_, LeaveStatus::Pending) => Err(AppError::unprocessable(anyhow::anyhow!(
            "A decision must be APPROVED or REJECTED"
        ))),
        (LeaveStatus::Pending, LeaveStatus::Approved) => Ok(LeaveTransition::Approve),
        (LeaveStatus::Pending, LeaveStatus::Rejected) => Ok(LeaveTransition::Reject),
        (LeaveStatus::Approved, LeaveStatus::Approved) => Ok(LeaveTransition::Reapprove),
        (LeaveStatus::Rejected, LeaveStatus::Rejected) => Ok(LeaveTransition::UpdateRejection),
        (LeaveStatus::Approved, LeaveStatus::Rejected) => Err(AppError::conflict(anyhow::anyhow!(
            "Leave request is already approved and cannot be rejected"
        ))),
        (LeaveStatus::Rejected, LeaveStatus::Approved) => Err(AppError::conflict(anyhow::anyhow!(
            "Leave request is already rejected and cannot be approved"
        ))),
    }
}

/// One active weekly lesson of the student's group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct WeeklyLesson {
    pub schedule_slot_id: ScheduleSlotId,
    pub subject_id: SubjectId,
    pub day_of_week: Weekday,
}

/// A lesson instance inside the leave range that must end up Excused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedExcuse {
    pub date: NaiveDate,
    pub schedule_slot_id: ScheduleSlotId,
    pub subject_id: SubjectId,
}

/// Walks `start..=end` day by day and emits every weekly lesson that falls on
/// each date, in date order then in the order `lessons` were given.
///
/// A subject taught twice on the same day yields one entry: the ledger keeps a
/// single record per student, subject and date.
pub fn plan_leave_propagation(
    start: NaiveDate,
    end: NaiveDate,
    lessons: &[WeeklyLesson],
) -> Vec<PlannedExcuse> {
    let mut planned = Vec::new();
    let mut seen: HashSet<(NaiveDate, SubjectId)> = HashSet::new();

    for date in start.iter_days().take_while(|d| *d <= end) {
        let weekday = Weekday::of(date);
        for lesson in lessons.iter().filter(|l| l.day_of_week == weekday) {
            if seen.insert((date, lesson.subject_id)) {
                planned.push(PlannedExcuse {
                    date,
                    schedule_slot_id: lesson.schedule_slot_id,
                    subject_id: lesson.subject_id,
                });
            }
        }
    }

    planned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        // 2024-09-02 is a Monday
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn lesson(subject: SubjectId, day: Weekday) -> WeeklyLesson {
        WeeklyLesson {
            schedule_slot_id: ScheduleSlotId::new(),
            subject_id: subject,
            day_of_week: day,
        }
    }

    #[test]
    fn test_reversed_range_plans_nothing() {
        let math = SubjectId::new();
        let lessons = [lesson(math, Weekday::Monday)];
        assert!(plan_leave_propagation(date(4), date(2), &lessons).is_empty());
    }

    #[test]
    fn test_weekend_range_without_lessons() {
        let lessons = [lesson(SubjectId::new(), Weekday::Monday)];
        assert!(plan_leave_propagation(date(7), date(8), &lessons).is_empty());
    }

    #[test]
    fn test_same_subject_twice_a_day_is_planned_once() {
        let math = SubjectId::new();
        let lessons = [lesson(math, Weekday::Monday), lesson(math, Weekday::Monday)];
        let planned = plan_leave_propagation(date(2), date(2), &lessons);
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].schedule_slot_id, lessons[0].schedule_slot_id);
    }

    #[test]
    fn test_transitions() {
        use LeaveStatus::*;
        assert_eq!(plan_transition(Pending, Approved).unwrap(), LeaveTransition::Approve);
        assert_eq!(plan_transition(Approved, Approved).unwrap(), LeaveTransition::Reapprove);
        assert_eq!(plan_transition(Pending, Rejected).unwrap(), LeaveTransition::Reject);
        assert_eq!(
            plan_transition(Rejected, Rejected).unwrap(),
            LeaveTransition::UpdateRejection
        );
        assert_eq!(plan_transition(Approved, Rejected).unwrap_err().status.as_u16(), 409);
        assert_eq!(plan_transition(Rejected, Approved).unwrap_err().status.as_u16(), 409);
        assert_eq!(plan_transition(Pending, Pending).unwrap_err().status.as_u16(), 422);
    }
}
