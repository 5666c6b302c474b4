use attendly_core::AppError;
use attendly_models::{GroupId, Role, Weekday};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use crate::modules::schedule::ScheduleService;
use crate::modules::statistics::aggregate::{
    DayCounts, GroupCounts, StatsScope, StatusCounts, breakdown, build_trend, rank_top_absent,
    resolve_scope, today_breakdown, trend_dates,
};
use crate::modules::statistics::model::{
    AbsentStudent, ChildSummary, DashboardResponse, GroupStat, InstitutionTotals,
    StatsFilterParams, StatsReport,
};
use crate::policy::Profile;

const STATUS_COLUMNS: &str = r#"
    COUNT(*) AS total,
    COUNT(*) FILTER (WHERE a.status = 'present') AS present,
    COUNT(*) FILTER (WHERE a.status = 'absent') AS absent,
    COUNT(*) FILTER (WHERE a.status = 'late') AS late,
    COUNT(*) FILTER (WHERE a.status = 'excused') AS excused
"#;

/// Appends the scope as ` AND ...` clauses over `attendance_records a` and
/// `students s`. Date bounds are only added when `with_dates` is set.
fn push_conditions(qb: &mut QueryBuilder<'_, Postgres>, scope: &StatsScope, with_dates: bool) {
    if scope.is_empty() {
        qb.push(" AND FALSE");
        return;
    }
    if let Some(students) = &scope.students {
        qb.push(" AND a.student_id = ANY(").push_bind(students.clone()).push(")");
    }
    if let Some(subjects) = &scope.subjects {
        qb.push(" AND a.subject_id = ANY(").push_bind(subjects.clone()).push(")");
    }
    if let Some(group) = scope.group {
        qb.push(" AND s.group_id = ").push_bind(group);
    }
    if let Some(subject) = scope.subject {
        qb.push(" AND a.subject_id = ").push_bind(subject);
    }
    if with_dates {
        if let Some(from) = scope.from {
            qb.push(" AND a.date >= ").push_bind(from);
        }
        if let Some(to) = scope.to {
            qb.push(" AND a.date <= ").push_bind(to);
        }
    }
}

pub struct StatisticsService;

impl StatisticsService {
    /// The one aggregation behind both the report and the dashboard.
    #[instrument(skip(db))]
    pub async fn compute_stats(
        db: &PgPool,
        profile: &Profile,
        filters: &StatsFilterParams,
        today: NaiveDate,
        top_absent_limit: i64,
    ) -> Result<StatsReport, AppError> {
        let scope = resolve_scope(profile, filters)?;

        let students_in_scope = Self::population(db, &scope).await?;
        let overall = breakdown(&Self::tally(db, &scope).await?);
        let days = Self::daily_tallies(db, &scope, today).await?;
        let weekly_trend = build_trend(today, &days, students_in_scope);
        let today = today_breakdown(&weekly_trend);

        let group_breakdown = if scope.include_groups {
            Some(Self::group_tallies(db, &scope).await?)
        } else {
            None
        };

        let top_absent = if scope.include_top_absent {
            Some(Self::top_absent(db, &scope, top_absent_limit).await?)
        } else {
            None
        };

        Ok(StatsReport {
            students_in_scope,
            overall,
            today,
            weekly_trend,
            group_breakdown,
            top_absent,
        })
    }

    /// Students the scope covers. A teacher's population is the students of
    /// groups that have an active lesson in one of their subjects.
    async fn population(db: &PgPool, scope: &StatsScope) -> Result<i64, AppError> {
        if scope.is_empty() {
            return Ok(0);
        }

        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM students s WHERE TRUE");
        if let Some(students) = &scope.students {
            qb.push(" AND s.id = ANY(").push_bind(students.clone()).push(")");
        }
        if let Some(group) = scope.group {
            qb.push(" AND s.group_id = ").push_bind(group);
        }
        if let Some(subjects) = &scope.subjects {
            qb.push(
                " AND s.group_id IN (SELECT ss.group_id FROM schedule_slots ss WHERE ss.is_active AND ss.subject_id = ANY(",
            )
            .push_bind(subjects.clone())
            .push("))");
        }

        let count: i64 = qb.build_query_scalar().fetch_one(db).await?;
        Ok(count)
    }

    async fn tally(db: &PgPool, scope: &StatsScope) -> Result<StatusCounts, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT ");
        qb.push(STATUS_COLUMNS);
        qb.push(" FROM attendance_records a JOIN students s ON s.id = a.student_id WHERE TRUE");
        push_conditions(&mut qb, scope, true);

        let counts = qb.build_query_as::<StatusCounts>().fetch_one(db).await?;
        Ok(counts)
    }

    /// Per-day tallies over the trend window. The window always ends today and
    /// ignores the requested date range.
    async fn daily_tallies(
        db: &PgPool,
        scope: &StatsScope,
        today: NaiveDate,
    ) -> Result<Vec<DayCounts>, AppError> {
        let dates = trend_dates(today);
        let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
            return Ok(Vec::new());
        };

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT a.date, ");
        qb.push(STATUS_COLUMNS);
        qb.push(" FROM attendance_records a JOIN students s ON s.id = a.student_id WHERE a.date BETWEEN ")
            .push_bind(*first)
            .push(" AND ")
            .push_bind(*last);
        push_conditions(&mut qb, scope, false);
        qb.push(" GROUP BY a.date ORDER BY a.date");

        let days = qb.build_query_as::<DayCounts>().fetch_all(db).await?;
        Ok(days)
    }

    async fn group_tallies(db: &PgPool, scope: &StatsScope) -> Result<Vec<GroupStat>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"SELECT g.id AS group_id, g.name AS group_name, c.id AS course_id, c.name AS course_name,
                      (SELECT COUNT(*) FROM students s2 WHERE s2.group_id = g.id) AS students_count,
                      (SELECT COUNT(DISTINCT ss.subject_id) FROM schedule_slots ss
                        WHERE ss.group_id = g.id AND ss.is_active) AS subjects_count,
                      COUNT(a.id) AS total_records,
                      COUNT(a.id) FILTER (WHERE a.status = 'present') AS present_count,
                      COUNT(a.id) FILTER (WHERE a.status = 'absent') AS absent_count
               FROM groups g
               JOIN courses c ON c.id = g.course_id
               LEFT JOIN students s ON s.group_id = g.id
               LEFT JOIN attendance_records a ON a.student_id = s.id"#,
        );
        push_conditions(&mut qb, scope, true);
        qb.push(" WHERE TRUE");
        if let Some(group) = scope.group {
            qb.push(" AND g.id = ").push_bind(group);
        }
        qb.push(" GROUP BY g.id, g.name, c.id, c.name ORDER BY c.name, g.name");

        let rows = qb.build_query_as::<GroupCounts>().fetch_all(db).await?;
        Ok(rows.into_iter().map(GroupStat::from).collect())
    }

    async fn top_absent(
        db: &PgPool,
        scope: &StatsScope,
        limit: i64,
    ) -> Result<Vec<AbsentStudent>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"SELECT s.id AS student_id, s.full_name, g.name AS group_name, COUNT(*) AS absences
               FROM attendance_records a
               JOIN students s ON s.id = a.student_id
               LEFT JOIN groups g ON g.id = s.group_id
               WHERE a.status = 'absent'"#,
        );
        push_conditions(&mut qb, scope, true);
        qb.push(" GROUP BY s.id, s.full_name, g.name ORDER BY absences DESC, s.id ASC LIMIT ")
            .push_bind(limit);

        let rows = qb.build_query_as::<AbsentStudent>().fetch_all(db).await?;
        Ok(rank_top_absent(rows, limit.max(0) as usize))
    }

    /// One group's rate over the given filters.
    #[instrument(skip(db))]
    pub async fn group_stats(
        db: &PgPool,
        profile: &Profile,
        group_id: GroupId,
        filters: &StatsFilterParams,
    ) -> Result<GroupStat, AppError> {
        let filters = StatsFilterParams {
            group: Some(group_id.into_inner()),
            ..filters.clone()
        };
        let scope = resolve_scope(profile, &filters)?;

        Self::group_tallies(db, &scope)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Group not found")))
    }

    async fn institution_totals(db: &PgPool) -> Result<InstitutionTotals, AppError> {
        let (students, teachers, groups, subjects) = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"SELECT (SELECT COUNT(*) FROM students),
                      (SELECT COUNT(*) FROM teachers),
                      (SELECT COUNT(*) FROM groups),
                      (SELECT COUNT(*) FROM subjects)"#,
        )
        .fetch_one(db)
        .await?;

        Ok(InstitutionTotals {
            students,
            teachers,
            groups,
            subjects,
        })
    }

    /// Role-specific landing data built on [`Self::compute_stats`].
    #[instrument(skip(db))]
    pub async fn dashboard(
        db: &PgPool,
        profile: &Profile,
        filters: &StatsFilterParams,
        today: NaiveDate,
        top_absent_limit: i64,
    ) -> Result<DashboardResponse, AppError> {
        let stats = Self::compute_stats(db, profile, filters, today, top_absent_limit).await?;

        let totals = if profile.is_staff() {
            Some(Self::institution_totals(db).await?)
        } else {
            None
        };

        let today_lessons = match profile.role() {
            Some(Role::Teacher | Role::Student) => {
                ScheduleService::mine(db, profile, Some(Weekday::of(today))).await?
            }
            _ => Vec::new(),
        };

        let mut children = Vec::new();
        if let Profile::Parent {
            children: linked, ..
        } = profile
        {
            for child in linked {
                let child_filters = StatsFilterParams {
                    student: Some(child.student_id.into_inner()),
                    ..filters.clone()
                };
                let scope = resolve_scope(profile, &child_filters)?;
                let group_name = match child.group_id {
                    Some(group_id) => {
                        sqlx::query_scalar::<_, String>("SELECT name FROM groups WHERE id = $1")
                            .bind(group_id)
                            .fetch_optional(db)
                            .await?
                    }
                    None => None,
                };
                children.push(ChildSummary {
                    student_id: child.student_id,
                    full_name: child.full_name.clone(),
                    group_name,
                    overall: breakdown(&Self::tally(db, &scope).await?),
                });
            }
        }

        Ok(DashboardResponse {
            role: profile.role(),
            stats,
            totals,
            today_lessons,
            children,
        })
    }
}
