use attendly_core::AppError;
use attendly_models::{GroupId, LeaveRequestId, StudentId, UserId};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{instrument, warn};

use crate::metrics;
use crate::modules::leave_requests::model::{
    CreateLeaveRequestDto, DecideLeaveRequestDto, LeaveRequest, LeaveRequestFilterParams,
    LeaveStatus, PropagationSummary,
};
use crate::modules::leave_requests::planning::{
    LeaveTransition, WeeklyLesson, plan_leave_propagation, plan_transition,
};
use crate::policy::{Profile, ResourceKind, ScopeColumns, visible_scope};

const LEAVE_SELECT: &str = r#"
    SELECT lr.id, lr.student_id, s.full_name AS student_name, lr.leave_type,
           lr.start_date, lr.end_date, lr.reason, lr.status, lr.requested_by,
           lr.approved_by, lr.rejection_reason, lr.decided_at,
           lr.approval_notified_at, lr.created_at
    FROM leave_requests lr
    JOIN students s ON s.id = lr.student_id
"#;

/// Result of applying a decision, before any side effects run.
#[derive(Debug, Clone)]
pub struct AppliedDecision {
    pub request: LeaveRequest,
    pub transition: LeaveTransition,
}

pub struct LeaveRequestService;

impl LeaveRequestService {
    #[instrument(skip(db, dto))]
    pub async fn create(
        db: &PgPool,
        profile: &Profile,
        dto: CreateLeaveRequestDto,
    ) -> Result<LeaveRequest, AppError> {
        let student_id = Self::resolve_applicant(db, profile, dto.student_id).await?;

        let id = sqlx::query_scalar::<_, LeaveRequestId>(
            r#"INSERT INTO leave_requests
                   (student_id, leave_type, start_date, end_date, reason, requested_by)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING id"#,
        )
        .bind(student_id)
        .bind(dto.leave_type)
        .bind(dto.start_date)
        .bind(dto.end_date)
        .bind(dto.reason.trim())
        .bind(profile.user_id())
        .fetch_one(db)
        .await?;

        Self::find_by_id(db, id).await
    }

    /// The student a new request is filed for.
    async fn resolve_applicant(
        db: &PgPool,
        profile: &Profile,
        requested: Option<StudentId>,
    ) -> Result<StudentId, AppError> {
        match profile {
            Profile::Student { student_id, .. } => Ok(*student_id),
            Profile::Parent { children, .. } => {
                let student_id = requested.ok_or_else(|| {
                    AppError::unprocessable(anyhow::anyhow!(
                        "student_id is required when filing for a child"
                    ))
                })?;
                if children.iter().any(|c| c.student_id == student_id) {
                    Ok(student_id)
                } else {
                    Err(AppError::not_found(anyhow::anyhow!("Student not found")))
                }
            }
            Profile::Teacher { user_id, .. } => {
                sqlx::query_scalar::<_, StudentId>("SELECT id FROM students WHERE user_id = $1")
                    .bind(user_id)
                    .fetch_optional(db)
                    .await?
                    .ok_or_else(|| {
                        AppError::forbidden(
                            "Only students and parents can file leave requests".to_string(),
                        )
                    })
            }
            Profile::AdminOrManager { .. } => {
                let student_id = requested.ok_or_else(|| {
                    AppError::unprocessable(anyhow::anyhow!("student_id is required"))
                })?;
                let exists =
                    sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
                        .bind(student_id)
                        .fetch_one(db)
                        .await?;
                if !exists {
                    return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
                }
                Ok(student_id)
            }
            Profile::Unassigned { .. } => Err(AppError::forbidden(
                "Access denied. No role has been assigned to this account.".to_string(),
            )),
        }
    }

    /// Appends the caller's visibility to a query over `leave_requests lr`.
    /// Teachers see the requests they filed themselves.
    fn push_visibility(qb: &mut QueryBuilder<'_, Postgres>, profile: &Profile) {
        if let Profile::Teacher { user_id, .. } = profile {
            qb.push(" AND lr.requested_by = ").push_bind(*user_id);
            return;
        }
        visible_scope(profile, ResourceKind::Attendance).push_sql(
            qb,
            &ScopeColumns {
                student: Some("lr.student_id"),
                ..Default::default()
            },
        );
    }

    #[instrument(skip(db))]
    pub async fn list(
        db: &PgPool,
        profile: &Profile,
        filters: LeaveRequestFilterParams,
    ) -> Result<Vec<LeaveRequest>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(LEAVE_SELECT);
        qb.push(" WHERE TRUE");
        Self::push_visibility(&mut qb, profile);
        if let Some(status) = filters.status {
            qb.push(" AND lr.status = ").push_bind(status);
        }
        qb.push(" ORDER BY lr.created_at DESC, lr.id DESC");

        let requests = qb.build_query_as::<LeaveRequest>().fetch_all(db).await?;
        Ok(requests)
    }

    /// A single request, reported missing when outside the caller's scope.
    #[instrument(skip(db))]
    pub async fn get_visible(
        db: &PgPool,
        profile: &Profile,
        id: LeaveRequestId,
    ) -> Result<LeaveRequest, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(LEAVE_SELECT);
        qb.push(" WHERE lr.id = ").push_bind(id);
        Self::push_visibility(&mut qb, profile);

        qb.build_query_as::<LeaveRequest>()
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Leave request not found")))
    }

    #[instrument(skip(db))]
    pub async fn find_by_id(db: &PgPool, id: LeaveRequestId) -> Result<LeaveRequest, AppError> {
        sqlx::query_as::<_, LeaveRequest>(&format!("{LEAVE_SELECT} WHERE lr.id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Leave request not found")))
    }

    /// Records a decision. Pending requests are updated conditionally so two
    /// concurrent deciders cannot both move the same request out of PENDING.
    #[instrument(skip(db, dto), fields(status = ?dto.status))]
    pub async fn decide(
        db: &PgPool,
        id: LeaveRequestId,
        dto: &DecideLeaveRequestDto,
        decided_by: UserId,
    ) -> Result<AppliedDecision, AppError> {
        let current = Self::find_by_id(db, id).await?;
        let transition = plan_transition(current.status, dto.status)?;
        let rejection_reason = dto
            .rejection_reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let updated = match transition {
            LeaveTransition::Reapprove => 1,
            LeaveTransition::Approve => sqlx::query(
                r#"UPDATE leave_requests
                   SET status = $2, approved_by = $3, rejection_reason = NULL, decided_at = NOW()
                   WHERE id = $1 AND status = 'pending'"#,
            )
            .bind(id)
            .bind(LeaveStatus::Approved)
            .bind(decided_by)
            .execute(db)
            .await?
            .rows_affected(),
            LeaveTransition::Reject => sqlx::query(
                r#"UPDATE leave_requests
                   SET status = $2, approved_by = $3, rejection_reason = $4, decided_at = NOW()
                   WHERE id = $1 AND status = 'pending'"#,
            )
            .bind(id)
            .bind(LeaveStatus::Rejected)
            .bind(decided_by)
            .bind(rejection_reason)
            .execute(db)
            .await?
            .rows_affected(),
            LeaveTransition::UpdateRejection => sqlx::query(
                r#"UPDATE leave_requests
                   SET rejection_reason = COALESCE($2, rejection_reason)
                   WHERE id = $1 AND status = 'rejected'"#,
            )
            .bind(id)
            .bind(rejection_reason)
            .execute(db)
            .await?
            .rows_affected(),
        };

        if updated == 0 {
            return Err(AppError::conflict(anyhow::anyhow!(
                "Leave request was decided by someone else, reload and try again"
            )));
        }

        let request = Self::find_by_id(db, id).await?;
        Ok(AppliedDecision {
            request,
            transition,
        })
    }

    /// Writes Excused for every lesson of the student's group inside the
    /// request's range. Each lesson is written on its own; a failing lesson is
    /// logged and counted, the rest still run. Safe to repeat.
    #[instrument(skip(db, request), fields(leave_request = %request.id, student = %request.student_id))]
    pub async fn propagate(
        db: &PgPool,
        request: &LeaveRequest,
        approved_by: Option<UserId>,
    ) -> Result<PropagationSummary, AppError> {
        let group_id = sqlx::query_scalar::<_, Option<GroupId>>(
            "SELECT group_id FROM students WHERE id = $1",
        )
        .bind(request.student_id)
        .fetch_optional(db)
        .await?
        .flatten();

        let Some(group_id) = group_id else {
            warn!("Student has no group, nothing to excuse");
            return Ok(PropagationSummary::default());
        };

        let lessons = sqlx::query_as::<_, WeeklyLesson>(
            r#"SELECT ss.id AS schedule_slot_id, ss.subject_id, ss.day_of_week
               FROM schedule_slots ss
               JOIN time_slots ts ON ts.id = ss.time_slot_id
               WHERE ss.group_id = $1 AND ss.is_active
               ORDER BY ss.day_of_week, ts.sequence"#,
        )
        .bind(group_id)
        .fetch_all(db)
        .await?;

        let planned = plan_leave_propagation(request.start_date, request.end_date, &lessons);
        let mut summary = PropagationSummary {
            lessons: planned.len(),
            ..Default::default()
        };

        for excuse in planned {
            let result = sqlx::query_scalar::<_, bool>(
                r#"INSERT INTO attendance_records
                       (student_id, subject_id, schedule_slot_id, date, status, marked_by, leave_request_id)
                   VALUES ($1, $2, $3, $4, 'excused', $5, $6)
                   ON CONFLICT ON CONSTRAINT unique_attendance_per_day
                   DO UPDATE SET status = 'excused', leave_request_id = EXCLUDED.leave_request_id
                   RETURNING (xmax = 0) AS inserted"#,
            )
            .bind(request.student_id)
            .bind(excuse.subject_id)
            .bind(excuse.schedule_slot_id)
            .bind(excuse.date)
            .bind(approved_by)
            .bind(request.id)
            .fetch_one(db)
            .await;

            match result {
                Ok(true) => summary.created += 1,
                Ok(false) => summary.overwritten += 1,
                Err(e) => {
                    warn!(
                        error = %e,
                        date = %excuse.date,
                        schedule_slot = %excuse.schedule_slot_id,
                        "Failed to excuse lesson, skipping"
                    );
                    summary.failed += 1;
                }
            }
        }

        metrics::track_leave_cascade("created", summary.created as u64);
        metrics::track_leave_cascade("overwritten", summary.overwritten as u64);
        metrics::track_leave_cascade("failed", summary.failed as u64);

        Ok(summary)
    }
}
