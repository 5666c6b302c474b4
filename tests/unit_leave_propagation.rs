use attendly::modules::leave_requests::planning::{
    LeaveTransition, WeeklyLesson, plan_leave_propagation, plan_transition,
};
use attendly_models::{LeaveStatus, ScheduleSlotId, SubjectId, Weekday};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn lesson(subject_id: SubjectId, day_of_week: Weekday) -> WeeklyLesson {
    WeeklyLesson {
        schedule_slot_id: ScheduleSlotId::new(),
        subject_id,
        day_of_week,
    }
}

#[test]
fn test_monday_to_wednesday_excuses_three_lessons() {
    let math = SubjectId::new();
    let english = SubjectId::new();
    let lessons = [
        lesson(math, Weekday::Monday),
        lesson(english, Weekday::Tuesday),
        lesson(math, Weekday::Wednesday),
    ];

    // 2024-09-02 is a Monday
    let planned = plan_leave_propagation(date(2024, 9, 2), date(2024, 9, 4), &lessons);

    let got: Vec<(NaiveDate, SubjectId)> = planned.iter().map(|p| (p.date, p.subject_id)).collect();
    assert_eq!(
        got,
        vec![
            (date(2024, 9, 2), math),
            (date(2024, 9, 3), english),
            (date(2024, 9, 4), math),
        ]
    );
    assert_eq!(planned[0].schedule_slot_id, lessons[0].schedule_slot_id);
    assert_eq!(planned[2].schedule_slot_id, lessons[2].schedule_slot_id);
}

#[test]
fn test_single_day_range() {
    let math = SubjectId::new();
    let planned = plan_leave_propagation(
        date(2024, 9, 3),
        date(2024, 9, 3),
        &[lesson(math, Weekday::Monday), lesson(math, Weekday::Tuesday)],
    );
    assert_eq!(planned.len(), 1);
    assert_eq!(planned[0].date, date(2024, 9, 3));
}

#[test]
fn test_weekend_only_range_excuses_nothing() {
    let planned = plan_leave_propagation(
        date(2024, 9, 7),
        date(2024, 9, 8),
        &[lesson(SubjectId::new(), Weekday::Monday)],
    );
    assert!(planned.is_empty());
}

#[test]
fn test_range_spanning_two_weeks_repeats_lessons() {
    let math = SubjectId::new();
    let planned = plan_leave_propagation(
        date(2024, 9, 2),
        date(2024, 9, 15),
        &[lesson(math, Weekday::Monday)],
    );
    let dates: Vec<NaiveDate> = planned.iter().map(|p| p.date).collect();
    assert_eq!(dates, vec![date(2024, 9, 2), date(2024, 9, 9)]);
}

#[test]
fn test_subject_twice_a_day_is_excused_once() {
    let math = SubjectId::new();
    let planned = plan_leave_propagation(
        date(2024, 9, 2),
        date(2024, 9, 2),
        &[lesson(math, Weekday::Monday), lesson(math, Weekday::Monday)],
    );
    assert_eq!(planned.len(), 1);
}

#[test]
fn test_decision_transitions() {
    assert_eq!(
        plan_transition(LeaveStatus::Pending, LeaveStatus::Approved).unwrap(),
        LeaveTransition::Approve
    );
    assert_eq!(
        plan_transition(LeaveStatus::Approved, LeaveStatus::Approved).unwrap(),
        LeaveTransition::Reapprove
    );
    assert_eq!(
        plan_transition(LeaveStatus::Pending, LeaveStatus::Rejected).unwrap(),
        LeaveTransition::Reject
    );
    assert_eq!(
        plan_transition(LeaveStatus::Rejected, LeaveStatus::Rejected).unwrap(),
        LeaveTransition::UpdateRejection
    );

    let err = plan_transition(LeaveStatus::Approved, LeaveStatus::Rejected).unwrap_err();
    assert_eq!(err.status.as_u16(), 409);
    let err = plan_transition(LeaveStatus::Rejected, LeaveStatus::Approved).unwrap_err();
    assert_eq!(err.status.as_u16(), 409);
    let err = plan_transition(LeaveStatus::Pending, LeaveStatus::Pending).unwrap_err();
    assert_eq!(err.status.as_u16(), 422);
}
