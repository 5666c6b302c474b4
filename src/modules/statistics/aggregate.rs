//! Scope resolution and arithmetic behind every statistics view.
//!
//! The dashboard and the report both go through [`resolve_scope`] and the
//! builders below, so the two can never disagree on the same inputs.

use attendly_core::AppError;
use attendly_models::{CourseId, GroupId, StudentId, SubjectId, Weekday};
use chrono::{Duration, NaiveDate};

use crate::modules::statistics::model::{
    AbsentStudent, GroupStat, StatsFilterParams, StatusBreakdown, TrendPoint,
};
use crate::policy::{Predicate, Profile, ResourceKind, visible_scope};

pub const TREND_DAYS: i64 = 7;

/// Filters after the caller's role has been applied. `None` on a list means
/// "no restriction"; an empty list matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsScope {
    pub students: Option<Vec<StudentId>>,
    pub subjects: Option<Vec<SubjectId>>,
    pub group: Option<GroupId>,
    pub subject: Option<SubjectId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub include_groups: bool,
    pub include_top_absent: bool,
}

impl StatsScope {
    /// True when no attendance row can match.
    pub fn is_empty(&self) -> bool {
        self.students.as_ref().is_some_and(Vec::is_empty)
            || self.subjects.as_ref().is_some_and(Vec::is_empty)
    }
}

/// Applies role scoping first, then narrows by the caller's filters.
///
/// A student is always pinned to themselves, a parent to the intersection of
/// the requested student and their children, a teacher to their subjects.
pub fn resolve_scope(profile: &Profile, filters: &StatsFilterParams) -> Result<StatsScope, AppError> {
    if let (Some(from), Some(to)) = (filters.from, filters.to)
        && from > to
    {
        return Err(AppError::unprocessable(anyhow::anyhow!(
            "from must not be after to"
        )));
    }

    let requested_student = filters.student.map(StudentId::from);
    let mut scope = StatsScope {
        group: filters.group.map(GroupId::from),
        subject: filters.subject.map(SubjectId::from),
        from: filters.from,
        to: filters.to,
        ..Default::default()
    };

    match visible_scope(profile, ResourceKind::Attendance) {
        Predicate::All => {
            scope.students = requested_student.map(|id| vec![id]);
        }
        Predicate::Students(visible) => {
            let students = match (profile, requested_student) {
                (Profile::Parent { .. }, Some(requested)) => visible
                    .into_iter()
                    .filter(|id| *id == requested)
                    .collect(),
                _ => visible,
            };
            scope.students = Some(students);
        }
        Predicate::Subjects(subjects) => {
            scope.subjects = Some(subjects);
            scope.students = requested_student.map(|id| vec![id]);
        }
        Predicate::Nothing | Predicate::Groups(_) | Predicate::TaughtBy { .. } => {
            scope.students = Some(Vec::new());
        }
    }

    scope.include_groups = profile.is_staff();
    scope.include_top_absent = matches!(
        profile,
        Profile::AdminOrManager { .. } | Profile::Teacher { .. }
    );

    Ok(scope)
}

/// Share of `part` in `total` as a percentage rounded to one decimal; zero
/// when `total` is zero.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / total as f64).round() / 10.0
}

/// Status tally of a set of attendance rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct StatusCounts {
    pub total: i64,
    pub present: i64,
    pub absent: i64,
    pub late: i64,
    pub excused: i64,
}

pub fn breakdown(counts: &StatusCounts) -> StatusBreakdown {
    StatusBreakdown {
        total: counts.total,
        present: counts.present,
        absent: counts.absent,
        late: counts.late,
        excused: counts.excused,
        present_rate: percentage(counts.present, counts.total),
        absent_rate: percentage(counts.absent, counts.total),
        late_rate: percentage(counts.late, counts.total),
        excused_rate: percentage(counts.excused, counts.total),
    }
}

/// Tally of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct DayCounts {
    pub date: NaiveDate,
    #[sqlx(flatten)]
    pub counts: StatusCounts,
}

/// The seven dates ending at `today`, oldest first.
pub fn trend_dates(today: NaiveDate) -> Vec<NaiveDate> {
    (0..TREND_DAYS)
        .rev()
        .map(|back| today - Duration::days(back))
        .collect()
}

/// `dd.mm (Mon)`
pub fn trend_label(date: NaiveDate) -> String {
    format!("{} ({})", date.format("%d.%m"), Weekday::of(date).short_name())
}

/// One point per trend date; days without rows are zero.
pub fn build_trend(today: NaiveDate, days: &[DayCounts], population: i64) -> Vec<TrendPoint> {
    trend_dates(today)
        .into_iter()
        .map(|date| {
            let counts = days
                .iter()
                .find(|d| d.date == date)
                .map(|d| d.counts)
                .unwrap_or_default();
            TrendPoint {
                date,
                label: trend_label(date),
                total: counts.total,
                present: counts.present,
                absent: counts.absent,
                late: counts.late,
                excused: counts.excused,
                present_of_students: percentage(counts.present, population),
                absent_of_students: percentage(counts.absent, population),
                late_of_students: percentage(counts.late, population),
                excused_of_students: percentage(counts.excused, population),
                present_of_day: percentage(counts.present, counts.total),
            }
        })
        .collect()
}

/// The last trend point as a breakdown.
pub fn today_breakdown(trend: &[TrendPoint]) -> StatusBreakdown {
    trend
        .last()
        .map(|point| {
            breakdown(&StatusCounts {
                total: point.total,
                present: point.present,
                absent: point.absent,
                late: point.late,
                excused: point.excused,
            })
        })
        .unwrap_or_default()
}

/// Most absences first, ties by ascending student id.
pub fn rank_top_absent(mut students: Vec<AbsentStudent>, limit: usize) -> Vec<AbsentStudent> {
    students.retain(|s| s.absences > 0);
    students.sort_by(|a, b| {
        b.absences
            .cmp(&a.absences)
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    students.truncate(limit);
    students
}

/// Per-group tallies as read from the store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GroupCounts {
    pub group_id: GroupId,
    pub group_name: String,
    pub course_id: CourseId,
    pub course_name: String,
    pub students_count: i64,
    pub subjects_count: i64,
    pub total_records: i64,
    pub present_count: i64,
    pub absent_count: i64,
}

impl From<GroupCounts> for GroupStat {
    fn from(row: GroupCounts) -> Self {
        GroupStat {
            attendance_rate: percentage(row.present_count, row.total_records),
            group_id: row.group_id,
            group_name: row.group_name,
            course_id: row.course_id,
            course_name: row.course_name,
            students_count: row.students_count,
            subjects_count: row.subjects_count,
            total_records: row.total_records,
            present_count: row.present_count,
            absent_count: row.absent_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(5, 5), 100.0);
    }

    #[test]
    fn test_percentage_of_nothing_is_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(3, 0), 0.0);
        assert!(!percentage(0, 0).is_nan());
    }

    #[test]
    fn test_trend_dates_end_today() {
        let today = NaiveDate::from_ymd_opt(2024, 9, 8).unwrap();
        let dates = trend_dates(today);
        assert_eq!(dates.len(), 7);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2024, 9, 2).unwrap());
        assert_eq!(dates[6], today);
    }

    #[test]
    fn test_trend_label() {
        let monday = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        assert_eq!(trend_label(monday), "02.09 (Mon)");
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let profile = Profile::Unassigned {
            user_id: attendly_models::UserId::new(),
        };
        let filters = StatsFilterParams {
            from: NaiveDate::from_ymd_opt(2024, 9, 9),
            to: NaiveDate::from_ymd_opt(2024, 9, 2),
            ..Default::default()
        };
        assert_eq!(resolve_scope(&profile, &filters).unwrap_err().status.as_u16(), 422);
    }
}
