use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use attendly_core::AppError;
use attendly_models::AttendanceId;

use crate::middleware::auth::CurrentProfile;
use crate::modules::attendance::model::{
    AmendAttendanceDto, AmendManyDto, AmendManyOutcome, AmendOutcome, AttendanceAuditEntry,
    AttendanceListParams, AttendanceRecordDetail, BulkMarkDto, BulkMarkOutcome, HistoryParams,
    PaginatedAttendanceResponse,
};
use crate::modules::attendance::service::AttendanceService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// Marks a lecture's roster. Re-submitting the same roster changes nothing:
/// already-marked students come back in `skipped`.
#[utoipa::path(
    post,
    path = "/api/attendance/bulk",
    request_body = BulkMarkDto,
    responses(
        (status = 201, description = "Roster processed; see created and skipped", body = BulkMarkOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only staff and the lesson's teacher can mark attendance"),
        (status = 404, description = "Schedule slot not found or retired"),
        (status = 422, description = "Date does not fall on the lesson's weekday")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn mark_bulk_attendance(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    ValidatedJson(dto): ValidatedJson<BulkMarkDto>,
) -> Result<(StatusCode, Json<BulkMarkOutcome>), AppError> {
    let today = state.attendance_config.today();
    let outcome = AttendanceService::mark_bulk(&state.db, &profile, dto, today).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/attendance/{id}/amend",
    params(
        ("id" = Uuid, Path, description = "Attendance record ID")
    ),
    request_body = AmendAttendanceDto,
    responses(
        (status = 200, description = "Status changed and audited", body = AmendOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not teach this subject"),
        (status = 404, description = "Attendance record not found"),
        (status = 422, description = "Invalid status or reason")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn amend_attendance(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Path(id): Path<AttendanceId>,
    ValidatedJson(dto): ValidatedJson<AmendAttendanceDto>,
) -> Result<Json<AmendOutcome>, AppError> {
    let outcome = AttendanceService::amend(&state.db, &profile, id, dto).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/attendance/amend-many",
    request_body = AmendManyDto,
    responses(
        (status = 200, description = "Number of records changed", body = AmendManyOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only staff and teachers can change attendance"),
        (status = 422, description = "Invalid ids, status or reason")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn amend_many_attendance(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    ValidatedJson(dto): ValidatedJson<AmendManyDto>,
) -> Result<Json<AmendManyOutcome>, AppError> {
    let outcome = AttendanceService::amend_many(&state.db, &profile, dto).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/api/attendance/history",
    params(HistoryParams),
    responses(
        (status = 200, description = "A student's records, newest first", body = Vec<AttendanceRecordDetail>),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "No student given and the caller is not a student")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_attendance_history(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<AttendanceRecordDetail>>, AppError> {
    let records = AttendanceService::history(&state.db, &profile, params).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceListParams),
    responses(
        (status = 200, description = "Visible attendance records, newest first", body = PaginatedAttendanceResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_attendance(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Query(params): Query<AttendanceListParams>,
) -> Result<Json<PaginatedAttendanceResponse>, AppError> {
    let records = AttendanceService::list(&state.db, &profile, params).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/attendance/{id}/audit",
    params(
        ("id" = Uuid, Path, description = "Attendance record ID")
    ),
    responses(
        (status = 200, description = "Change log, oldest first", body = Vec<AttendanceAuditEntry>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller does not teach this subject"),
        (status = 404, description = "Attendance record not found")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_attendance_audit(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Path(id): Path<AttendanceId>,
) -> Result<Json<Vec<AttendanceAuditEntry>>, AppError> {
    let entries = AttendanceService::audit_trail(&state.db, &profile, id).await?;
    Ok(Json(entries))
}
