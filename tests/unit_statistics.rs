use attendly::modules::statistics::aggregate::{
    DayCounts, StatusCounts, breakdown, build_trend, percentage, rank_top_absent, resolve_scope,
    today_breakdown,
};
use attendly::modules::statistics::model::{AbsentStudent, StatsFilterParams};
use attendly::policy::{LinkedChild, Profile};
use attendly_models::{GroupId, Role, StudentId, SubjectId, TeacherId, UserId};
use chrono::NaiveDate;

fn teacher(subjects: Vec<SubjectId>) -> Profile {
    Profile::Teacher {
        user_id: UserId::new(),
        teacher_id: TeacherId::new(),
        subject_ids: subjects,
    }
}

#[test]
fn test_teacher_scope_stays_on_taught_subjects_under_group_filter() {
    let taught = SubjectId::new();
    let group = GroupId::new();
    let filters = StatsFilterParams {
        group: Some(group.into_inner()),
        ..Default::default()
    };

    let scope = resolve_scope(&teacher(vec![taught]), &filters).unwrap();

    assert_eq!(scope.subjects, Some(vec![taught]));
    assert_eq!(scope.group, Some(group));
    assert!(scope.students.is_none());
    assert!(scope.include_top_absent);
    assert!(!scope.include_groups);
}

#[test]
fn test_teacher_without_subjects_sees_nothing() {
    let scope = resolve_scope(&teacher(Vec::new()), &StatsFilterParams::default()).unwrap();
    assert!(scope.is_empty());
}

#[test]
fn test_teacher_subject_filter_cannot_widen_scope() {
    let taught = SubjectId::new();
    let foreign = SubjectId::new();
    let filters = StatsFilterParams {
        subject: Some(foreign.into_inner()),
        ..Default::default()
    };

    let scope = resolve_scope(&teacher(vec![taught]), &filters).unwrap();

    // Both restrictions apply, so no row can satisfy them together.
    assert_eq!(scope.subjects, Some(vec![taught]));
    assert_eq!(scope.subject, Some(foreign));
}

#[test]
fn test_student_is_pinned_to_self() {
    let me = StudentId::new();
    let profile = Profile::Student {
        user_id: UserId::new(),
        student_id: me,
        group_id: None,
    };
    let filters = StatsFilterParams {
        student: Some(StudentId::new().into_inner()),
        ..Default::default()
    };

    let scope = resolve_scope(&profile, &filters).unwrap();
    assert_eq!(scope.students, Some(vec![me]));
    assert!(!scope.include_top_absent);
}

#[test]
fn test_parent_request_is_intersected_with_children() {
    let child = StudentId::new();
    let profile = Profile::Parent {
        user_id: UserId::new(),
        children: vec![LinkedChild {
            student_id: child,
            group_id: None,
            full_name: "Child".to_string(),
        }],
    };

    let own = StatsFilterParams {
        student: Some(child.into_inner()),
        ..Default::default()
    };
    assert_eq!(resolve_scope(&profile, &own).unwrap().students, Some(vec![child]));

    let foreign = StatsFilterParams {
        student: Some(StudentId::new().into_inner()),
        ..Default::default()
    };
    assert!(resolve_scope(&profile, &foreign).unwrap().is_empty());
}

#[test]
fn test_unassigned_scope_is_empty() {
    let profile = Profile::Unassigned {
        user_id: UserId::new(),
    };
    assert!(
        resolve_scope(&profile, &StatsFilterParams::default())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_staff_scope_is_unrestricted() {
    let profile = Profile::AdminOrManager {
        user_id: UserId::new(),
        role: Role::Admin,
    };
    let scope = resolve_scope(&profile, &StatsFilterParams::default()).unwrap();
    assert!(scope.students.is_none());
    assert!(scope.subjects.is_none());
    assert!(scope.include_groups);
    assert!(!scope.is_empty());
}

#[test]
fn test_percentages_never_divide_by_zero() {
    assert_eq!(percentage(5, 0), 0.0);
    assert_eq!(percentage(0, 0), 0.0);
    assert_eq!(percentage(1, 3), 33.3);
    assert_eq!(percentage(2, 3), 66.7);

    let empty = breakdown(&StatusCounts::default());
    assert_eq!(empty.present_rate, 0.0);
    assert_eq!(empty.absent_rate, 0.0);
}

#[test]
fn test_trend_covers_seven_days_with_zero_gaps() {
    let today = NaiveDate::from_ymd_opt(2024, 9, 8).unwrap();
    let days = [DayCounts {
        date: today,
        counts: StatusCounts {
            total: 4,
            present: 3,
            absent: 1,
            late: 0,
            excused: 0,
        },
    }];

    let trend = build_trend(today, &days, 0);

    assert_eq!(trend.len(), 7);
    assert_eq!(trend[0].date, NaiveDate::from_ymd_opt(2024, 9, 2).unwrap());
    assert!(trend[..6].iter().all(|p| p.total == 0));
    assert_eq!(trend[6].present, 3);
    assert_eq!(trend[6].present_of_day, 75.0);
    // Empty population must not divide by zero
    assert_eq!(trend[6].present_of_students, 0.0);

    let today_stats = today_breakdown(&trend);
    assert_eq!(today_stats.total, 4);
    assert_eq!(today_stats.absent_rate, 25.0);
}

#[test]
fn test_top_absent_ranking() {
    let low = StudentId::from_u128(1);
    let high = StudentId::from_u128(2);
    let tied = StudentId::from_u128(3);
    let absent = |student_id, absences| AbsentStudent {
        student_id,
        full_name: "S".to_string(),
        group_name: None,
        absences,
    };

    let ranked = rank_top_absent(
        vec![absent(tied, 4), absent(high, 4), absent(low, 1), absent(StudentId::new(), 0)],
        2,
    );

    let ids: Vec<StudentId> = ranked.iter().map(|s| s.student_id).collect();
    assert_eq!(ids, vec![high, tied]);
}
