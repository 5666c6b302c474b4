use attendly_core::AppError;
use attendly_core::pagination::PaginationMeta;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;

use crate::modules::catalog::model::{
    Course, Group, GroupFilterParams, PaginatedStudentsResponse, Student, StudentFilterParams,
    Subject, SubjectFilterParams, Teacher, TimeSlot,
};
use crate::policy::{Profile, ResourceKind, ScopeColumns, visible_scope};

const STUDENT_SCOPE: ScopeColumns = ScopeColumns {
    student: Some("s.id"),
    group: Some("s.group_id"),
    subject: None,
    teacher: None,
};

pub struct CatalogService;

impl CatalogService {
    #[instrument(skip(db))]
    pub async fn courses(db: &PgPool) -> Result<Vec<Course>, AppError> {
        let courses = sqlx::query_as::<_, Course>(
            "SELECT id, name, year FROM courses ORDER BY year, name",
        )
        .fetch_all(db)
        .await?;

        Ok(courses)
    }

    #[instrument(skip(db))]
    pub async fn groups(db: &PgPool, filters: &GroupFilterParams) -> Result<Vec<Group>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT g.id, g.name, g.course_id, c.name AS course_name,
                   (SELECT COUNT(*) FROM students s WHERE s.group_id = g.id) AS students_count
            FROM groups g
            JOIN courses c ON c.id = g.course_id
            WHERE TRUE
            "#,
        );
        if let Some(course) = filters.course {
            qb.push(" AND g.course_id = ").push_bind(course);
        }
        qb.push(" ORDER BY c.year, c.name, g.name");

        let groups = qb.build_query_as::<Group>().fetch_all(db).await?;
        Ok(groups)
    }

    #[instrument(skip(db))]
    pub async fn subjects(
        db: &PgPool,
        filters: &SubjectFilterParams,
    ) -> Result<Vec<Subject>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT sub.id, sub.name, sub.code, sub.course_id, sub.teacher_id,
                   t.full_name AS teacher_name
            FROM subjects sub
            LEFT JOIN teachers t ON t.id = sub.teacher_id
            WHERE TRUE
            "#,
        );
        if let Some(teacher) = filters.teacher {
            qb.push(" AND sub.teacher_id = ").push_bind(teacher);
        }
        if let Some(course) = filters.course {
            qb.push(" AND sub.course_id = ").push_bind(course);
        }
        qb.push(" ORDER BY sub.name");

        let subjects = qb.build_query_as::<Subject>().fetch_all(db).await?;
        Ok(subjects)
    }

    #[instrument(skip(db))]
    pub async fn teachers(db: &PgPool) -> Result<Vec<Teacher>, AppError> {
        let teachers = sqlx::query_as::<_, Teacher>(
            "SELECT id, user_id, full_name FROM teachers ORDER BY full_name",
        )
        .fetch_all(db)
        .await?;

        Ok(teachers)
    }

    /// Active periods in day order.
    #[instrument(skip(db))]
    pub async fn time_slots(db: &PgPool) -> Result<Vec<TimeSlot>, AppError> {
        let slots = sqlx::query_as::<_, TimeSlot>(
            r#"
            SELECT id, name, start_time, end_time, sequence, is_active
            FROM time_slots
            WHERE is_active
            ORDER BY sequence
            "#,
        )
        .fetch_all(db)
        .await?;

        Ok(slots)
    }

    #[instrument(skip(db))]
    pub async fn students(
        db: &PgPool,
        profile: &Profile,
        filters: StudentFilterParams,
    ) -> Result<PaginatedStudentsResponse, AppError> {
        let scope = visible_scope(profile, ResourceKind::Students);
        let search = filters
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{s}%"));

        let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
            scope.push_sql(qb, &STUDENT_SCOPE);
            if let Some(group) = filters.group {
                qb.push(" AND s.group_id = ").push_bind(group);
            }
            if let Some(pattern) = &search {
                qb.push(" AND s.full_name ILIKE ").push_bind(pattern.clone());
            }
        };

        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM students s WHERE TRUE");
        push_filters(&mut count_qb);
        let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

        let mut qb = QueryBuilder::new(
            r#"
            SELECT s.id, s.user_id, s.full_name, s.course_id, s.group_id, g.name AS group_name
            FROM students s
            LEFT JOIN groups g ON g.id = s.group_id
            WHERE TRUE
            "#,
        );
        push_filters(&mut qb);
        qb.push(" ORDER BY s.full_name, s.id LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());

        let students = qb.build_query_as::<Student>().fetch_all(db).await?;

        Ok(PaginatedStudentsResponse {
            data: students,
            meta: PaginationMeta::new(&filters.pagination, total),
        })
    }
}
