//! Pure decisions of the attendance ledger: which bulk-mark entries are
//! written, skipped or ignored, and who may amend a record.

use std::collections::{HashMap, HashSet};

use attendly_core::AppError;
use attendly_models::{AttendanceStatus, GroupId, StudentId, SubjectId, TeacherId};

use crate::modules::attendance::model::MarkEntry;
use crate::policy::Profile;

/// A student named by a bulk-mark entry, as stored.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CandidateStudent {
    pub id: StudentId,
    pub full_name: String,
    pub group_id: Option<GroupId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedMark {
    pub student_id: StudentId,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkMarkPlan {
    pub to_insert: Vec<PlannedMark>,
    /// Names of students that already have a record for the subject and date
    pub skipped: Vec<String>,
    /// Entries naming unknown students or students of another group
    pub ignored: usize,
}

/// Collapses repeated students: the last status given wins, the position of
/// the first occurrence is kept.
pub fn dedupe_entries(entries: &[MarkEntry]) -> Vec<MarkEntry> {
    let mut position: HashMap<StudentId, usize> = HashMap::new();
    let mut deduped: Vec<MarkEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match position.get(&entry.student_id) {
            Some(&idx) => deduped[idx].status = entry.status,
            None => {
                position.insert(entry.student_id, deduped.len());
                deduped.push(*entry);
            }
        }
    }

    deduped
}

/// Decides what a bulk mark does, entry by entry.
///
/// Only students of the slot's own group are accepted; anyone else is
/// ignored. A student with an existing record is skipped, never overwritten.
pub fn plan_bulk_mark(
    entries: &[MarkEntry],
    students: &[CandidateStudent],
    group_id: GroupId,
    already_marked: &HashSet<StudentId>,
) -> BulkMarkPlan {
    let students: HashMap<StudentId, &CandidateStudent> =
        students.iter().map(|s| (s.id, s)).collect();

    let mut plan = BulkMarkPlan::default();
    for entry in dedupe_entries(entries) {
        let Some(student) = students
            .get(&entry.student_id)
            .filter(|s| s.group_id == Some(group_id))
        else {
            plan.ignored += 1;
            continue;
        };

        if already_marked.contains(&student.id) {
            plan.skipped.push(student.full_name.clone());
        } else {
            plan.to_insert.push(PlannedMark {
                student_id: student.id,
                status: entry.status,
            });
        }
    }

    plan
}

/// Amending a record requires staff, or the teacher who owns the subject or
/// instructs the slot the record was taken in.
pub fn authorize_amend(
    profile: &Profile,
    subject_id: SubjectId,
    slot_teacher: Option<TeacherId>,
) -> Result<(), AppError> {
    if profile.may_teach(subject_id, slot_teacher) {
        return Ok(());
    }
    tracing::warn!(user = %profile.user_id(), subject = %subject_id, "Attendance amend denied");
    Err(AppError::forbidden(
        "Only administrators, managers and the subject's teacher can change attendance"
            .to_string(),
    ))
}

/// The message returned with a bulk mark.
pub fn bulk_mark_message(created: usize, skipped: usize) -> String {
    match (created, skipped) {
        (0, 0) => "No attendance was recorded".to_string(),
        (c, 0) => format!("Attendance recorded for {c} student(s)"),
        (0, s) => format!("All {s} student(s) were already marked; nothing changed"),
        (c, s) => format!(
            "Attendance recorded for {c} student(s); {s} already marked and left unchanged"
        ),
    }
}
