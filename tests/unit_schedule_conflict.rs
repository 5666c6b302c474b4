use attendly::modules::schedule::planning::{SlotKey, find_conflict, parallel_section};
use attendly_models::{
    GroupId, ScheduleSlot, ScheduleSlotId, SubjectId, TeacherId, TimeSlotId, Weekday,
};

fn slot(
    subject: SubjectId,
    teacher: TeacherId,
    group: GroupId,
    day: Weekday,
    period: TimeSlotId,
) -> ScheduleSlot {
    ScheduleSlot {
        id: ScheduleSlotId::new(),
        subject_id: subject,
        teacher_id: teacher,
        group_id: group,
        day_of_week: day,
        time_slot_id: period,
        room: None,
        is_active: true,
    }
}

struct Fixture {
    math: SubjectId,
    physics: SubjectId,
    teacher_x: TeacherId,
    teacher_y: TeacherId,
    group_a: GroupId,
    first_period: TimeSlotId,
}

fn fixture() -> Fixture {
    Fixture {
        math: SubjectId::new(),
        physics: SubjectId::new(),
        teacher_x: TeacherId::new(),
        teacher_y: TeacherId::new(),
        group_a: GroupId::new(),
        first_period: TimeSlotId::new(),
    }
}

#[test]
fn test_first_slot_in_free_cell_has_no_conflict() {
    let f = fixture();
    let candidate = slot(f.math, f.teacher_x, f.group_a, Weekday::Monday, f.first_period);

    assert!(find_conflict(&SlotKey::of(&candidate), &[], None).is_none());
}

#[test]
fn test_other_subject_in_same_cell_conflicts() {
    let f = fixture();
    let existing = slot(f.math, f.teacher_x, f.group_a, Weekday::Monday, f.first_period);
    let candidate = slot(f.physics, f.teacher_x, f.group_a, Weekday::Monday, f.first_period);

    let hit = find_conflict(&SlotKey::of(&candidate), std::slice::from_ref(&existing), None);
    assert_eq!(hit.map(|s| s.id), Some(existing.id));
}

#[test]
fn test_conflict_key_ignores_teacher() {
    let f = fixture();
    let existing = slot(f.math, f.teacher_x, f.group_a, Weekday::Monday, f.first_period);
    let candidate = slot(f.math, f.teacher_y, f.group_a, Weekday::Monday, f.first_period);

    assert!(
        find_conflict(&SlotKey::of(&candidate), std::slice::from_ref(&existing), None).is_some()
    );
}

#[test]
fn test_retired_slots_and_the_slot_itself_do_not_conflict() {
    let f = fixture();
    let mut retired = slot(f.math, f.teacher_x, f.group_a, Weekday::Monday, f.first_period);
    retired.is_active = false;
    let candidate = slot(f.physics, f.teacher_x, f.group_a, Weekday::Monday, f.first_period);
    assert!(
        find_conflict(&SlotKey::of(&candidate), std::slice::from_ref(&retired), None).is_none()
    );

    let active = slot(f.math, f.teacher_x, f.group_a, Weekday::Monday, f.first_period);
    assert!(
        find_conflict(&SlotKey::of(&active), std::slice::from_ref(&active), Some(active.id))
            .is_none()
    );
}

#[test]
fn test_different_day_or_period_is_free() {
    let f = fixture();
    let existing = slot(f.math, f.teacher_x, f.group_a, Weekday::Monday, f.first_period);
    let tuesday = slot(f.math, f.teacher_x, f.group_a, Weekday::Tuesday, f.first_period);
    let later = slot(f.math, f.teacher_x, f.group_a, Weekday::Monday, TimeSlotId::new());

    let existing = [existing];
    assert!(find_conflict(&SlotKey::of(&tuesday), &existing, None).is_none());
    assert!(find_conflict(&SlotKey::of(&later), &existing, None).is_none());
}

#[test]
fn test_teacher_may_hold_parallel_sections() {
    let f = fixture();
    let group_b = GroupId::new();
    let anchor = slot(f.math, f.teacher_x, f.group_a, Weekday::Monday, f.first_period);
    let sibling = slot(f.math, f.teacher_x, group_b, Weekday::Monday, f.first_period);
    let unrelated = slot(f.math, f.teacher_y, GroupId::new(), Weekday::Monday, f.first_period);

    assert!(
        find_conflict(&SlotKey::of(&sibling), std::slice::from_ref(&anchor), None).is_none()
    );

    let candidates = [anchor.clone(), sibling.clone(), unrelated];
    let section = parallel_section(&anchor, &candidates);
    let ids: Vec<ScheduleSlotId> = section.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![anchor.id, sibling.id]);
}
