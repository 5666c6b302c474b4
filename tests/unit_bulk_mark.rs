use std::collections::HashSet;

use attendly::modules::attendance::model::MarkEntry;
use attendly::modules::attendance::planning::{
    CandidateStudent, bulk_mark_message, dedupe_entries, plan_bulk_mark,
};
use attendly_models::{AttendanceStatus, GroupId, StudentId};

fn student(name: &str, group_id: GroupId) -> CandidateStudent {
    CandidateStudent {
        id: StudentId::new(),
        full_name: name.to_string(),
        group_id: Some(group_id),
    }
}

fn entry(student_id: StudentId, status: AttendanceStatus) -> MarkEntry {
    MarkEntry { student_id, status }
}

#[test]
fn test_first_mark_is_written() {
    let group = GroupId::new();
    let x = student("Student X", group);

    let plan = plan_bulk_mark(
        &[entry(x.id, AttendanceStatus::Present)],
        std::slice::from_ref(&x),
        group,
        &HashSet::new(),
    );

    assert_eq!(plan.to_insert.len(), 1);
    assert_eq!(plan.to_insert[0].student_id, x.id);
    assert_eq!(plan.to_insert[0].status, AttendanceStatus::Present);
    assert!(plan.skipped.is_empty());
}

#[test]
fn test_second_mark_same_day_is_skipped_not_overwritten() {
    let group = GroupId::new();
    let x = student("Student X", group);
    let already: HashSet<StudentId> = [x.id].into_iter().collect();

    let plan = plan_bulk_mark(
        &[entry(x.id, AttendanceStatus::Absent)],
        std::slice::from_ref(&x),
        group,
        &already,
    );

    assert!(plan.to_insert.is_empty());
    assert_eq!(plan.skipped, vec!["Student X".to_string()]);
    assert_eq!(
        bulk_mark_message(plan.to_insert.len(), plan.skipped.len()),
        "All 1 student(s) were already marked; nothing changed"
    );
}

#[test]
fn test_students_of_a_parallel_section_group_are_ignored() {
    let group_a = GroupId::new();
    let group_b = GroupId::new();
    let a = student("Aida", group_a);
    let b = student("Bek", group_b);

    let plan = plan_bulk_mark(
        &[
            entry(a.id, AttendanceStatus::Present),
            entry(b.id, AttendanceStatus::Late),
        ],
        &[a.clone(), b.clone()],
        group_a,
        &HashSet::new(),
    );

    assert_eq!(plan.to_insert.len(), 1);
    assert_eq!(plan.to_insert[0].student_id, a.id);
    assert_eq!(plan.ignored, 1);
    assert!(plan.skipped.is_empty());
}

#[test]
fn test_students_outside_group_or_unknown_are_ignored() {
    let group = GroupId::new();
    let outsider = student("Outsider", GroupId::new());
    let insider = student("Insider", group);

    let plan = plan_bulk_mark(
        &[
            entry(outsider.id, AttendanceStatus::Present),
            entry(StudentId::new(), AttendanceStatus::Present),
            entry(insider.id, AttendanceStatus::Absent),
        ],
        &[outsider, insider.clone()],
        group,
        &HashSet::new(),
    );

    assert_eq!(plan.ignored, 2);
    assert_eq!(plan.to_insert.len(), 1);
    assert_eq!(plan.to_insert[0].student_id, insider.id);
}

#[test]
fn test_repeated_entries_keep_last_status() {
    let id = StudentId::new();
    let other = StudentId::new();
    let deduped = dedupe_entries(&[
        entry(id, AttendanceStatus::Present),
        entry(other, AttendanceStatus::Late),
        entry(id, AttendanceStatus::Absent),
    ]);

    assert_eq!(deduped.len(), 2);
    assert_eq!(deduped[0].student_id, id);
    assert_eq!(deduped[0].status, AttendanceStatus::Absent);
    assert_eq!(deduped[1].student_id, other);
}

#[test]
fn test_bulk_mark_messages() {
    assert_eq!(bulk_mark_message(0, 0), "No attendance was recorded");
    assert_eq!(bulk_mark_message(3, 0), "Attendance recorded for 3 student(s)");
    assert!(bulk_mark_message(2, 1).contains("1 already marked"));
}
