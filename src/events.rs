//! Domain events.
//!
//! Side effects of a state change are invoked explicitly by the service that
//! performed it, after the change has committed. Notification delivery never
//! fails the triggering write: delivery errors are logged and counted.

use attendly_core::AppError;
use attendly_models::notifications::{NewNotification, NotificationKind};
use attendly_models::leave_requests::PropagationSummary;
use attendly_models::{AttendanceRecord, AttendanceStatus, LeaveRequest, LeaveRequestId, UserId};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use crate::metrics;
use crate::modules::leave_requests::LeaveRequestService;
use crate::modules::notifications::NotificationService;

const DATE_FORMAT: &str = "%d.%m.%Y";

/// Outcome of [`on_leave_approved`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveApproval {
    pub propagation: PropagationSummary,
    /// Whether this call delivered the student's approval notification
    pub notified: bool,
}

/// A newly created Absent record alerts the subject's teacher, when that
/// teacher has a login.
#[instrument(skip(db, record), fields(attendance = %record.id))]
pub async fn on_attendance_created(db: &PgPool, record: &AttendanceRecord, actor: Option<UserId>) {
    if record.status != AttendanceStatus::Absent {
        return;
    }

    if let Err(e) = notify_absence(db, record, actor).await {
        metrics::track_notification_failure();
        warn!(error = %e.error, "Failed to deliver absence notification");
    }
}

async fn notify_absence(
    db: &PgPool,
    record: &AttendanceRecord,
    actor: Option<UserId>,
) -> Result<(), AppError> {
    let target = sqlx::query_as::<_, (Option<UserId>, String, String)>(
        r#"SELECT t.user_id, sub.name, st.full_name
           FROM subjects sub
           LEFT JOIN teachers t ON t.id = sub.teacher_id
           JOIN students st ON st.id = $2
           WHERE sub.id = $1"#,
    )
    .bind(record.subject_id)
    .bind(record.student_id)
    .fetch_optional(db)
    .await?;

    let Some((Some(recipient_id), subject_name, student_name)) = target else {
        debug!("Subject teacher has no login, absence notification skipped");
        return Ok(());
    };

    let notification = NewNotification {
        recipient_id,
        sender_id: actor,
        kind: NotificationKind::Absence,
        title: format!("Absence: {student_name}"),
        message: format!(
            "{student_name} was marked absent in {subject_name} on {}.",
            record.date.format(DATE_FORMAT)
        ),
        student_id: Some(record.student_id),
        leave_request_id: None,
    };

    NotificationService::create(db, &notification).await?;
    metrics::track_notification_sent(NotificationKind::Absence.as_str());
    Ok(())
}

/// Runs leave propagation for an approved request, then notifies the student
/// once per approval. Safe to call again for the same request.
#[instrument(skip(db, request), fields(leave_request = %request.id))]
pub async fn on_leave_approved(
    db: &PgPool,
    request: &LeaveRequest,
    approver: Option<UserId>,
) -> Result<LeaveApproval, AppError> {
    let propagation = LeaveRequestService::propagate(db, request, approver).await?;

    let notified = match notify_leave_approved(db, request, approver, &propagation).await {
        Ok(sent) => sent,
        Err(e) => {
            metrics::track_notification_failure();
            warn!(error = %e.error, "Failed to deliver leave approval notification");
            false
        }
    };

    Ok(LeaveApproval {
        propagation,
        notified,
    })
}

async fn student_login(db: &PgPool, request: &LeaveRequest) -> Result<Option<UserId>, AppError> {
    let user_id = sqlx::query_scalar::<_, Option<UserId>>("SELECT user_id FROM students WHERE id = $1")
        .bind(request.student_id)
        .fetch_optional(db)
        .await?
        .flatten();
    Ok(user_id)
}

/// Claims `approval_notified_at` and inserts the notification in the same
/// transaction. Only the caller that claims the marker delivers.
async fn notify_leave_approved(
    db: &PgPool,
    request: &LeaveRequest,
    approver: Option<UserId>,
    propagation: &PropagationSummary,
) -> Result<bool, AppError> {
    let Some(recipient_id) = student_login(db, request).await? else {
        debug!("Student has no login, approval notification skipped");
        return Ok(false);
    };

    let mut tx = db.begin().await?;

    let claimed = sqlx::query_scalar::<_, LeaveRequestId>(
        r#"UPDATE leave_requests SET approval_notified_at = NOW()
           WHERE id = $1 AND approval_notified_at IS NULL
           RETURNING id"#,
    )
    .bind(request.id)
    .fetch_optional(&mut *tx)
    .await?;

    if claimed.is_none() {
        tx.rollback().await?;
        debug!("Approval already notified");
        return Ok(false);
    }

    let excused = propagation.created + propagation.overwritten;
    let notification = NewNotification {
        recipient_id,
        sender_id: approver,
        kind: NotificationKind::LeaveApproved,
        title: "Leave request approved".to_string(),
        message: format!(
            "Your leave from {} to {} has been approved. {} lesson(s) marked as excused.",
            request.start_date.format(DATE_FORMAT),
            request.end_date.format(DATE_FORMAT),
            excused
        ),
        student_id: Some(request.student_id),
        leave_request_id: Some(request.id),
    };

    NotificationService::create(&mut *tx, &notification).await?;
    tx.commit().await?;

    metrics::track_notification_sent(NotificationKind::LeaveApproved.as_str());
    Ok(true)
}

/// Tells the student their request was rejected. Returns whether a
/// notification was delivered.
#[instrument(skip(db, request), fields(leave_request = %request.id))]
pub async fn on_leave_rejected(
    db: &PgPool,
    request: &LeaveRequest,
    approver: Option<UserId>,
) -> bool {
    match notify_leave_rejected(db, request, approver).await {
        Ok(sent) => sent,
        Err(e) => {
            metrics::track_notification_failure();
            warn!(error = %e.error, "Failed to deliver leave rejection notification");
            false
        }
    }
}

async fn notify_leave_rejected(
    db: &PgPool,
    request: &LeaveRequest,
    approver: Option<UserId>,
) -> Result<bool, AppError> {
    let Some(recipient_id) = student_login(db, request).await? else {
        return Ok(false);
    };

    let mut message = format!(
        "Your leave from {} to {} has been rejected.",
        request.start_date.format(DATE_FORMAT),
        request.end_date.format(DATE_FORMAT)
    );
    if let Some(reason) = request.rejection_reason.as_deref() {
        message.push_str(" Reason: ");
        message.push_str(reason);
    }

    let notification = NewNotification {
        recipient_id,
        sender_id: approver,
        kind: NotificationKind::LeaveRejected,
        title: "Leave request rejected".to_string(),
        message,
        student_id: Some(request.student_id),
        leave_request_id: Some(request.id),
    };

    NotificationService::create(db, &notification).await?;
    metrics::track_notification_sent(NotificationKind::LeaveRejected.as_str());
    Ok(true)
}
