use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use attendly_core::AppError;
use attendly_models::{ScheduleSlotId, Weekday};

use crate::middleware::auth::CurrentProfile;
use crate::middleware::role::RequireStaff;
use crate::modules::schedule::model::{
    DayParams, RosterParams, RosterResponse, ScheduleFilterParams, ScheduleSlotDetail,
    SlotActivationResponse, UpsertScheduleSlotDto,
};
use crate::modules::schedule::service::ScheduleService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    get,
    path = "/api/schedule",
    params(ScheduleFilterParams),
    responses(
        (status = 200, description = "Visible schedule slots ordered by weekday and period", body = Vec<ScheduleSlotDetail>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_schedule(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Query(filters): Query<ScheduleFilterParams>,
) -> Result<Json<Vec<ScheduleSlotDetail>>, AppError> {
    let slots = ScheduleService::list(&state.db, &profile, &filters).await?;
    Ok(Json(slots))
}

#[utoipa::path(
    get,
    path = "/api/schedule/mine",
    params(DayParams),
    responses(
        (status = 200, description = "The caller's own timetable", body = Vec<ScheduleSlotDetail>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_my_schedule(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Query(params): Query<DayParams>,
) -> Result<Json<Vec<ScheduleSlotDetail>>, AppError> {
    let slots = ScheduleService::mine(&state.db, &profile, params.day).await?;
    Ok(Json(slots))
}

#[utoipa::path(
    get,
    path = "/api/schedule/today",
    responses(
        (status = 200, description = "The caller's lessons for today's weekday", body = Vec<ScheduleSlotDetail>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_today_schedule(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
) -> Result<Json<Vec<ScheduleSlotDetail>>, AppError> {
    let today = Weekday::of(state.attendance_config.today());
    let slots = ScheduleService::mine(&state.db, &profile, Some(today)).await?;
    Ok(Json(slots))
}

#[utoipa::path(
    get,
    path = "/api/schedule/{id}",
    params(
        ("id" = Uuid, Path, description = "Schedule slot ID")
    ),
    responses(
        (status = 200, description = "Schedule slot", body = ScheduleSlotDetail),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Schedule slot not found")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_schedule_slot(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Path(id): Path<ScheduleSlotId>,
) -> Result<Json<ScheduleSlotDetail>, AppError> {
    let slot = ScheduleService::get_visible(&state.db, &profile, id).await?;
    Ok(Json(slot))
}

#[utoipa::path(
    post,
    path = "/api/schedule",
    request_body = UpsertScheduleSlotDto,
    responses(
        (status = 201, description = "Schedule slot created", body = ScheduleSlotDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator or manager privileges required"),
        (status = 404, description = "Subject, teacher, group or time slot not found"),
        (status = 409, description = "The group already has an active lesson in that period")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn create_schedule_slot(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    ValidatedJson(dto): ValidatedJson<UpsertScheduleSlotDto>,
) -> Result<(StatusCode, Json<ScheduleSlotDetail>), AppError> {
    let slot = ScheduleService::upsert(&state.db, None, dto).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

#[utoipa::path(
    put,
    path = "/api/schedule/{id}",
    params(
        ("id" = Uuid, Path, description = "Schedule slot ID")
    ),
    request_body = UpsertScheduleSlotDto,
    responses(
        (status = 200, description = "Schedule slot updated", body = ScheduleSlotDetail),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator or manager privileges required"),
        (status = 404, description = "Schedule slot or a referenced entity not found"),
        (status = 409, description = "The group already has an active lesson in that period")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_schedule_slot(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<ScheduleSlotId>,
    ValidatedJson(dto): ValidatedJson<UpsertScheduleSlotDto>,
) -> Result<Json<ScheduleSlotDetail>, AppError> {
    let slot = ScheduleService::upsert(&state.db, Some(id), dto).await?;
    Ok(Json(slot))
}

#[utoipa::path(
    post,
    path = "/api/schedule/{id}/retire",
    params(
        ("id" = Uuid, Path, description = "Schedule slot ID")
    ),
    responses(
        (status = 200, description = "Slot retired; its attendance is kept", body = SlotActivationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator or manager privileges required"),
        (status = 404, description = "Schedule slot not found")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn retire_schedule_slot(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<ScheduleSlotId>,
) -> Result<Json<SlotActivationResponse>, AppError> {
    let response = ScheduleService::retire(&state.db, id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/schedule/{id}/reactivate",
    params(
        ("id" = Uuid, Path, description = "Schedule slot ID")
    ),
    responses(
        (status = 200, description = "Slot active again", body = SlotActivationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator or manager privileges required"),
        (status = 404, description = "Schedule slot not found"),
        (status = 409, description = "Another active slot occupies the same group and period")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn reactivate_schedule_slot(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<ScheduleSlotId>,
) -> Result<Json<SlotActivationResponse>, AppError> {
    let response = ScheduleService::reactivate(&state.db, id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/schedule/{id}/roster",
    params(
        ("id" = Uuid, Path, description = "Schedule slot ID"),
        RosterParams
    ),
    responses(
        (status = 200, description = "Combined roster of the lecture with each student's mark", body = RosterResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only staff and the lesson's teacher can view the roster"),
        (status = 404, description = "Schedule slot not found")
    ),
    tag = "Schedule",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_roster(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Path(id): Path<ScheduleSlotId>,
    Query(params): Query<RosterParams>,
) -> Result<Json<RosterResponse>, AppError> {
    let date = params.date.unwrap_or_else(|| state.attendance_config.today());
    let roster = ScheduleService::roster(&state.db, &profile, id, date).await?;
    Ok(Json(roster))
}
