//! Visibility predicates derived from a [`Profile`].
//!
//! A [`Predicate`] is computed once per request and then either pushed into a
//! `QueryBuilder` as extra `AND` clauses ([`Predicate::push_sql`]) or checked
//! against a single row in memory ([`Predicate::admits`]). Both paths share
//! the same rules, so listing and point lookups cannot disagree.

use attendly_models::{GroupId, StudentId, SubjectId, TeacherId};
use sqlx::{Postgres, QueryBuilder};

use super::profile::Profile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Students,
    Schedules,
    Attendance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    All,
    Nothing,
    Students(Vec<StudentId>),
    Groups(Vec<GroupId>),
    Subjects(Vec<SubjectId>),
    /// Slots the teacher instructs, plus any slot of a subject they own.
    TaughtBy {
        teacher_id: TeacherId,
        subjects: Vec<SubjectId>,
    },
}

/// Column expressions a query exposes for scoping. A predicate that needs a
/// column the query does not have matches nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeColumns {
    pub student: Option<&'static str>,
    pub group: Option<&'static str>,
    pub subject: Option<&'static str>,
    pub teacher: Option<&'static str>,
}

/// The identifying attributes of one row, for in-memory checks.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScopeTarget {
    pub student_id: Option<StudentId>,
    pub group_id: Option<GroupId>,
    pub subject_id: Option<SubjectId>,
    pub teacher_id: Option<TeacherId>,
}

pub fn visible_scope(profile: &Profile, kind: ResourceKind) -> Predicate {
    match (profile, kind) {
        (Profile::AdminOrManager { .. }, _) => Predicate::All,
        (Profile::Unassigned { .. }, _) => Predicate::Nothing,

        (Profile::Teacher { .. }, ResourceKind::Students) => Predicate::All,
        (
            Profile::Teacher {
                teacher_id,
                subject_ids,
                ..
            },
            ResourceKind::Schedules,
        ) => Predicate::TaughtBy {
            teacher_id: *teacher_id,
            subjects: subject_ids.clone(),
        },
        (Profile::Teacher { subject_ids, .. }, ResourceKind::Attendance) => {
            Predicate::Subjects(subject_ids.clone())
        }

        (Profile::Student { student_id, .. }, ResourceKind::Students | ResourceKind::Attendance) => {
            Predicate::Students(vec![*student_id])
        }
        (Profile::Student { group_id, .. }, ResourceKind::Schedules) => match group_id {
            Some(group_id) => Predicate::Groups(vec![*group_id]),
            None => Predicate::Nothing,
        },

        (Profile::Parent { children, .. }, ResourceKind::Students | ResourceKind::Attendance) => {
            Predicate::Students(children.iter().map(|c| c.student_id).collect())
        }
        (Profile::Parent { children, .. }, ResourceKind::Schedules) => {
            let mut groups: Vec<GroupId> = children.iter().filter_map(|c| c.group_id).collect();
            groups.sort();
            groups.dedup();
            Predicate::Groups(groups)
        }
    }
}

impl Predicate {
    pub fn is_all(&self) -> bool {
        matches!(self, Predicate::All)
    }

    /// True when no row can possibly match.
    pub fn is_empty(&self) -> bool {
        match self {
            Predicate::All => false,
            Predicate::Nothing => true,
            Predicate::Students(ids) => ids.is_empty(),
            Predicate::Groups(ids) => ids.is_empty(),
            Predicate::Subjects(ids) => ids.is_empty(),
            Predicate::TaughtBy { .. } => false,
        }
    }

    pub fn admits(&self, target: &ScopeTarget) -> bool {
        match self {
            Predicate::All => true,
            Predicate::Nothing => false,
            Predicate::Students(ids) => target.student_id.is_some_and(|id| ids.contains(&id)),
            Predicate::Groups(ids) => target.group_id.is_some_and(|id| ids.contains(&id)),
            Predicate::Subjects(ids) => target.subject_id.is_some_and(|id| ids.contains(&id)),
            Predicate::TaughtBy {
                teacher_id,
                subjects,
            } => {
                target.teacher_id == Some(*teacher_id)
                    || target.subject_id.is_some_and(|id| subjects.contains(&id))
            }
        }
    }

    /// Appends ` AND ...` clauses restricting the query to this scope.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>, cols: &ScopeColumns) {
        match self {
            Predicate::All => {}
            Predicate::Nothing => {
                qb.push(" AND FALSE");
            }
            Predicate::Students(ids) => push_any(qb, cols.student, ids.clone()),
            Predicate::Groups(ids) => push_any(qb, cols.group, ids.clone()),
            Predicate::Subjects(ids) => push_any(qb, cols.subject, ids.clone()),
            Predicate::TaughtBy {
                teacher_id,
                subjects,
            } => match (cols.teacher, cols.subject) {
                (Some(teacher), Some(subject)) => {
                    qb.push(" AND (")
                        .push(teacher)
                        .push(" = ")
                        .push_bind(*teacher_id)
                        .push(" OR ")
                        .push(subject)
                        .push(" = ANY(")
                        .push_bind(subjects.clone())
                        .push("))");
                }
                (Some(teacher), None) => {
                    qb.push(" AND ").push(teacher).push(" = ").push_bind(*teacher_id);
                }
                (None, Some(_)) => push_any(qb, cols.subject, subjects.clone()),
                (None, None) => {
                    qb.push(" AND FALSE");
                }
            },
        }
    }
}

fn push_any<T>(qb: &mut QueryBuilder<'_, Postgres>, column: Option<&'static str>, ids: Vec<T>)
where
    Vec<T>: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
{
    match column {
        Some(column) if !ids.is_empty() => {
            qb.push(" AND ").push(column).push(" = ANY(").push_bind(ids).push(")");
        }
        _ => {
            qb.push(" AND FALSE");
        }
    }
}
