//! Conflict detection and parallel-section grouping over in-memory slots.
//!
//! The database enforces the same rule with a partial unique index. These
//! checks run first so a collision can be reported with the slot it hits.

use attendly_models::{GroupId, ScheduleSlot, ScheduleSlotId, TimeSlotId, Weekday};

use crate::modules::schedule::model::RosterEntry;

/// The key at most one active slot may hold. The teacher is not part of it:
/// a teacher may lecture several groups in the same period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub group_id: GroupId,
    pub day_of_week: Weekday,
    pub time_slot_id: TimeSlotId,
}

impl SlotKey {
    pub fn of(slot: &ScheduleSlot) -> Self {
        Self {
            group_id: slot.group_id,
            day_of_week: slot.day_of_week,
            time_slot_id: slot.time_slot_id,
        }
    }
}

/// The active slot that already occupies `key`, ignoring `exclude` (the slot
/// being updated or reactivated).
pub fn find_conflict<'a>(
    key: &SlotKey,
    existing: &'a [ScheduleSlot],
    exclude: Option<ScheduleSlotId>,
) -> Option<&'a ScheduleSlot> {
    existing
        .iter()
        .filter(|slot| slot.is_active)
        .filter(|slot| Some(slot.id) != exclude)
        .find(|slot| SlotKey::of(slot) == *key)
}

/// Every slot taught together with `anchor`: same teacher, weekday and
/// period, one per group. The anchor is always included, even when retired,
/// and wins over another slot of its own group.
pub fn parallel_section<'a>(anchor: &'a ScheduleSlot, candidates: &'a [ScheduleSlot]) -> Vec<&'a ScheduleSlot> {
    let mut section = vec![anchor];
    for slot in candidates {
        let same_lecture = slot.is_active
            && slot.teacher_id == anchor.teacher_id
            && slot.day_of_week == anchor.day_of_week
            && slot.time_slot_id == anchor.time_slot_id;
        if same_lecture && !section.iter().any(|s| s.group_id == slot.group_id) {
            section.push(slot);
        }
    }
    section
}

/// Roster order: group name, then student name, then id for stability.
pub fn sort_roster(entries: &mut [RosterEntry]) {
    entries.sort_by(|a, b| {
        a.group_name
            .cmp(&b.group_name)
            .then_with(|| a.full_name.cmp(&b.full_name))
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
}
