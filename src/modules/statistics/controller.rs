use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use attendly_core::AppError;
use attendly_models::GroupId;

use crate::middleware::auth::CurrentProfile;
use crate::middleware::role::RequireStaff;
use crate::modules::statistics::model::{
    DashboardResponse, GroupStat, StatsFilterParams, StatsReport,
};
use crate::modules::statistics::service::StatisticsService;
use crate::policy::resolve_profile;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/stats",
    params(StatsFilterParams),
    responses(
        (status = 200, description = "Attendance report scoped to the caller", body = StatsReport),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "from is after to")
    ),
    tag = "Statistics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Query(filters): Query<StatsFilterParams>,
) -> Result<Json<StatsReport>, AppError> {
    let report = StatisticsService::compute_stats(
        &state.db,
        &profile,
        &filters,
        state.attendance_config.today(),
        state.attendance_config.top_absent_limit,
    )
    .await?;
    Ok(Json(report))
}

#[utoipa::path(
    get,
    path = "/api/stats/dashboard",
    params(StatsFilterParams),
    responses(
        (status = 200, description = "Role-specific dashboard", body = DashboardResponse),
        (status = 401, description = "Unauthorized"),
        (status = 422, description = "from is after to")
    ),
    tag = "Statistics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Query(filters): Query<StatsFilterParams>,
) -> Result<Json<DashboardResponse>, AppError> {
    let dashboard = StatisticsService::dashboard(
        &state.db,
        &profile,
        &filters,
        state.attendance_config.today(),
        state.attendance_config.top_absent_limit,
    )
    .await?;
    Ok(Json(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/stats/groups/{id}",
    params(
        ("id" = Uuid, Path, description = "Group ID"),
        StatsFilterParams
    ),
    responses(
        (status = 200, description = "One group's attendance rate", body = GroupStat),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator or manager privileges required"),
        (status = 404, description = "Group not found")
    ),
    tag = "Statistics",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_group_stats(
    State(state): State<AppState>,
    RequireStaff(auth_user): RequireStaff,
    Path(id): Path<GroupId>,
    Query(filters): Query<StatsFilterParams>,
) -> Result<Json<GroupStat>, AppError> {
    let profile = resolve_profile(&state.db, auth_user.user_id()?).await?;
    let stat = StatisticsService::group_stats(&state.db, &profile, id, &filters).await?;
    Ok(Json(stat))
}
