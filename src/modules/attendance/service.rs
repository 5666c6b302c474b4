use std::collections::HashSet;

use attendly_core::AppError;
use attendly_core::pagination::PaginationMeta;
use attendly_models::{
    AttendanceId, AttendanceStatus, StudentId, SubjectId, TeacherId, Weekday,
};
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, instrument, warn};

use crate::events;
use crate::metrics;
use crate::modules::attendance::model::{
    AmendAttendanceDto, AmendManyDto, AmendManyOutcome, AmendOutcome, AttendanceAuditEntry,
    AttendanceListParams, AttendanceRecord, AttendanceRecordDetail, BulkMarkDto, BulkMarkOutcome,
    HistoryParams, PaginatedAttendanceResponse,
};
use crate::modules::attendance::planning::{
    CandidateStudent, authorize_amend, bulk_mark_message, dedupe_entries, plan_bulk_mark,
};
use crate::modules::schedule::ScheduleService;
use crate::policy::{Profile, ResourceKind, ScopeColumns, visible_scope};

const RECORD_COLUMNS: &str = "id, student_id, subject_id, schedule_slot_id, date, status, \
     marked_by, marked_at, leave_request_id";

const RECORD_DETAIL_SELECT: &str = r#"
    SELECT a.id, a.student_id, st.full_name AS student_name, st.group_id, g.name AS group_name,
           a.subject_id, sub.name AS subject_name, a.schedule_slot_id, a.date, a.status,
           a.marked_by, a.marked_at, a.leave_request_id
    FROM attendance_records a
    JOIN students st ON st.id = a.student_id
    LEFT JOIN groups g ON g.id = st.group_id
    JOIN subjects sub ON sub.id = a.subject_id
"#;

pub const RECORD_SCOPE: ScopeColumns = ScopeColumns {
    student: Some("a.student_id"),
    group: Some("st.group_id"),
    subject: Some("a.subject_id"),
    teacher: None,
};

/// Who may amend a record: its subject and the instructor of its slot.
#[derive(Debug, sqlx::FromRow)]
struct AmendTarget {
    subject_id: SubjectId,
    status: AttendanceStatus,
    slot_teacher: Option<TeacherId>,
}

pub struct AttendanceService;

impl AttendanceService {
    /// Marks a lecture's roster. Students that already have a record for the
    /// subject and date are skipped, never overwritten.
    #[instrument(skip(db, profile, dto), fields(schedule_slot = %dto.schedule_id, entries = dto.entries.len()))]
    pub async fn mark_bulk(
        db: &PgPool,
        profile: &Profile,
        dto: BulkMarkDto,
        today: NaiveDate,
    ) -> Result<BulkMarkOutcome, AppError> {
        let date = dto.date.unwrap_or(today);
        let anchor = ScheduleService::find_slot(db, dto.schedule_id).await?;

        if !anchor.is_active {
            return Err(AppError::not_found(anyhow::anyhow!("Schedule slot not found")));
        }
        if Weekday::of(date) != anchor.day_of_week {
            return Err(AppError::unprocessable(anyhow::anyhow!(
                "{} is a {}, but this lesson takes place on {}",
                date,
                Weekday::of(date).name(),
                anchor.day_of_week.name()
            )));
        }
        if !profile.may_teach(anchor.subject_id, Some(anchor.teacher_id)) {
            warn!(user = %profile.user_id(), "Bulk mark denied");
            return Err(AppError::forbidden(
                "Only administrators, managers and the lesson's teacher can mark attendance"
                    .to_string(),
            ));
        }

        let entries = dedupe_entries(&dto.entries);
        let student_ids: Vec<StudentId> = entries.iter().map(|e| e.student_id).collect();

        let students = sqlx::query_as::<_, CandidateStudent>(
            "SELECT id, full_name, group_id FROM students WHERE id = ANY($1)",
        )
        .bind(&student_ids)
        .fetch_all(db)
        .await?;

        let already_marked: HashSet<StudentId> = sqlx::query_scalar::<_, StudentId>(
            r#"SELECT student_id FROM attendance_records
               WHERE subject_id = $1 AND date = $2 AND student_id = ANY($3)"#,
        )
        .bind(anchor.subject_id)
        .bind(date)
        .bind(&student_ids)
        .fetch_all(db)
        .await?
        .into_iter()
        .collect();

        let plan = plan_bulk_mark(&entries, &students, anchor.group_id, &already_marked);
        let mut skipped = plan.skipped;

        let mut created: Vec<AttendanceRecord> = Vec::new();
        if !plan.to_insert.is_empty() {
            let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO attendance_records (student_id, subject_id, schedule_slot_id, date, status, marked_by) ",
            );
            qb.push_values(&plan.to_insert, |mut row, mark| {
                row.push_bind(mark.student_id)
                    .push_bind(anchor.subject_id)
                    .push_bind(anchor.id)
                    .push_bind(date)
                    .push_bind(mark.status)
                    .push_bind(profile.user_id());
            });
            qb.push(" ON CONFLICT ON CONSTRAINT unique_attendance_per_day DO NOTHING RETURNING ");
            qb.push(RECORD_COLUMNS);

            created = qb.build_query_as::<AttendanceRecord>().fetch_all(db).await?;

            // Rows a concurrent mark inserted first come back missing.
            let inserted: HashSet<StudentId> = created.iter().map(|r| r.student_id).collect();
            for mark in plan.to_insert.iter().filter(|m| !inserted.contains(&m.student_id)) {
                if let Some(student) = students.iter().find(|s| s.id == mark.student_id) {
                    skipped.push(student.full_name.clone());
                }
            }
        }

        for status in AttendanceStatus::ALL {
            let count = created.iter().filter(|r| r.status == status).count();
            metrics::track_attendance_marked(status.as_str(), count as u64);
        }
        metrics::track_attendance_skipped(skipped.len() as u64);

        for record in &created {
            events::on_attendance_created(db, record, Some(profile.user_id())).await;
        }

        info!(
            created = created.len(),
            skipped = skipped.len(),
            ignored = plan.ignored,
            %date,
            "Bulk attendance marked"
        );

        Ok(BulkMarkOutcome {
            created: created.len() as i64,
            updated: 0,
            message: bulk_mark_message(created.len(), skipped.len()),
            skipped,
        })
    }

    /// Changes the status of one record and writes an audit entry.
    #[instrument(skip(db, profile, dto), fields(status = dto.status.as_str()))]
    pub async fn amend(
        db: &PgPool,
        profile: &Profile,
        id: AttendanceId,
        dto: AmendAttendanceDto,
    ) -> Result<AmendOutcome, AppError> {
        let reason = dto.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());
        let mut tx = db.begin().await?;

        let target = sqlx::query_as::<_, AmendTarget>(
            r#"SELECT a.subject_id, a.status, ss.teacher_id AS slot_teacher
               FROM attendance_records a
               LEFT JOIN schedule_slots ss ON ss.id = a.schedule_slot_id
               WHERE a.id = $1
               FOR UPDATE OF a"#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Attendance record not found")))?;

        authorize_amend(profile, target.subject_id, target.slot_teacher)?;

        sqlx::query("UPDATE attendance_records SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(dto.status)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"INSERT INTO attendance_audit_log (attendance_id, actor_id, old_status, new_status, reason)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(id)
        .bind(profile.user_id())
        .bind(target.status)
        .bind(dto.status)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        metrics::track_attendance_amended(1);

        info!(attendance = %id, old = target.status.as_str(), new = dto.status.as_str(), "Attendance amended");
        Ok(AmendOutcome {
            id,
            old_status: target.status,
            new_status: dto.status,
        })
    }

    /// Sets one status on many records. A teacher's update silently covers
    /// only records of their own subjects; records already in the target
    /// status are left out and not counted.
    #[instrument(skip(db, profile, dto), fields(ids = dto.ids.len(), status = dto.status.as_str()))]
    pub async fn amend_many(
        db: &PgPool,
        profile: &Profile,
        dto: AmendManyDto,
    ) -> Result<AmendManyOutcome, AppError> {
        let subject_scope: Option<&[SubjectId]> = match profile {
            Profile::AdminOrManager { .. } => None,
            Profile::Teacher { subject_ids, .. } => Some(subject_ids.as_slice()),
            _ => {
                warn!(user = %profile.user_id(), "Bulk amend denied");
                return Err(AppError::forbidden(
                    "Only administrators, managers and teachers can change attendance".to_string(),
                ));
            }
        };
        let reason = dto.reason.as_deref().map(str::trim).filter(|r| !r.is_empty());

        let mut tx = db.begin().await?;

        let mut select: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT id, status FROM attendance_records WHERE id = ANY(");
        select.push_bind(dto.ids.clone()).push(") AND status <> ").push_bind(dto.status);
        if let Some(subjects) = subject_scope {
            select.push(" AND subject_id = ANY(").push_bind(subjects.to_vec()).push(")");
        }
        select.push(" ORDER BY id FOR UPDATE");

        let targets: Vec<(AttendanceId, AttendanceStatus)> =
            select.build_query_as().fetch_all(&mut *tx).await?;

        if targets.is_empty() {
            tx.rollback().await?;
            return Ok(AmendManyOutcome { updated: 0 });
        }

        let ids: Vec<AttendanceId> = targets.iter().map(|(id, _)| *id).collect();
        let old_statuses: Vec<AttendanceStatus> = targets.iter().map(|(_, s)| *s).collect();

        let updated = sqlx::query("UPDATE attendance_records SET status = $2 WHERE id = ANY($1)")
            .bind(&ids)
            .bind(dto.status)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(
            r#"INSERT INTO attendance_audit_log (attendance_id, actor_id, old_status, new_status, reason)
               SELECT t.id, $3, t.old_status, $4, $5
               FROM UNNEST($1::uuid[], $2::attendance_status[]) AS t(id, old_status)"#,
        )
        .bind(&ids)
        .bind(&old_statuses)
        .bind(profile.user_id())
        .bind(dto.status)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        metrics::track_attendance_amended(updated);

        info!(updated, "Attendance amended in bulk");
        Ok(AmendManyOutcome {
            updated: updated as i64,
        })
    }

    /// One student's records, newest first. Without an explicit student the
    /// caller's own student profile is used. Records outside the caller's
    /// scope are never returned.
    #[instrument(skip(db))]
    pub async fn history(
        db: &PgPool,
        profile: &Profile,
        params: HistoryParams,
    ) -> Result<Vec<AttendanceRecordDetail>, AppError> {
        let student_id = params
            .student
            .map(StudentId::from)
            .or_else(|| profile.student_id())
            .ok_or_else(|| AppError::unprocessable(anyhow::anyhow!("student is required")))?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(RECORD_DETAIL_SELECT);
        qb.push(" WHERE a.student_id = ").push_bind(student_id);
        if let Some(subject) = params.subject {
            qb.push(" AND a.subject_id = ").push_bind(subject);
        }
        if let Some(from) = params.from {
            qb.push(" AND a.date >= ").push_bind(from);
        }
        if let Some(to) = params.to {
            qb.push(" AND a.date <= ").push_bind(to);
        }
        visible_scope(profile, ResourceKind::Attendance).push_sql(&mut qb, &RECORD_SCOPE);
        qb.push(" ORDER BY a.date DESC, a.marked_at DESC");

        let records = qb.build_query_as::<AttendanceRecordDetail>().fetch_all(db).await?;
        Ok(records)
    }

    fn push_list_filters(qb: &mut QueryBuilder<'_, Postgres>, params: &AttendanceListParams) {
        if let Some(from) = params.from {
            qb.push(" AND a.date >= ").push_bind(from);
        }
        if let Some(to) = params.to {
            qb.push(" AND a.date <= ").push_bind(to);
        }
        if let Some(group) = params.group {
            qb.push(" AND st.group_id = ").push_bind(group);
        }
        if let Some(subject) = params.subject {
            qb.push(" AND a.subject_id = ").push_bind(subject);
        }
        if let Some(status) = params.status {
            qb.push(" AND a.status = ").push_bind(status);
        }
    }

    /// Role-scoped listing, newest first.
    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        profile: &Profile,
        params: AttendanceListParams,
    ) -> Result<PaginatedAttendanceResponse, AppError> {
        let scope = visible_scope(profile, ResourceKind::Attendance);

        let mut count_qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"SELECT COUNT(*) FROM attendance_records a
               JOIN students st ON st.id = a.student_id
               WHERE TRUE"#,
        );
        Self::push_list_filters(&mut count_qb, &params);
        scope.push_sql(&mut count_qb, &RECORD_SCOPE);
        let total: i64 = count_qb.build_query_scalar().fetch_one(db).await?;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(RECORD_DETAIL_SELECT);
        qb.push(" WHERE TRUE");
        Self::push_list_filters(&mut qb, &params);
        scope.push_sql(&mut qb, &RECORD_SCOPE);
        qb.push(" ORDER BY a.date DESC, a.marked_at DESC, a.id LIMIT ")
            .push_bind(params.pagination.limit())
            .push(" OFFSET ")
            .push_bind(params.pagination.offset());

        let data = qb.build_query_as::<AttendanceRecordDetail>().fetch_all(db).await?;

        Ok(PaginatedAttendanceResponse {
            data,
            meta: PaginationMeta::new(&params.pagination, total),
        })
    }

    /// Change log of one record, oldest first. Readable by staff and the
    /// subject's teacher.
    #[instrument(skip(db))]
    pub async fn audit_trail(
        db: &PgPool,
        profile: &Profile,
        id: AttendanceId,
    ) -> Result<Vec<AttendanceAuditEntry>, AppError> {
        let target = sqlx::query_as::<_, AmendTarget>(
            r#"SELECT a.subject_id, a.status, ss.teacher_id AS slot_teacher
               FROM attendance_records a
               LEFT JOIN schedule_slots ss ON ss.id = a.schedule_slot_id
               WHERE a.id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Attendance record not found")))?;

        authorize_amend(profile, target.subject_id, target.slot_teacher)?;

        let entries = sqlx::query_as::<_, AttendanceAuditEntry>(
            r#"SELECT id, attendance_id, actor_id, old_status, new_status, reason, created_at
               FROM attendance_audit_log
               WHERE attendance_id = $1
               ORDER BY created_at, id"#,
        )
        .bind(id)
        .fetch_all(db)
        .await?;

        Ok(entries)
    }
}
