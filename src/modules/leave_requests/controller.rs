use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use attendly_core::AppError;
use attendly_models::LeaveRequestId;

use crate::events;
use crate::middleware::auth::CurrentProfile;
use crate::middleware::role::RequireStaff;
use crate::modules::leave_requests::model::{
    CreateLeaveRequestDto, DecideLeaveRequestDto, LeaveDecisionResponse, LeaveRequest,
    LeaveRequestFilterParams,
};
use crate::modules::leave_requests::planning::LeaveTransition;
use crate::modules::leave_requests::service::LeaveRequestService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

#[utoipa::path(
    post,
    path = "/api/leave-requests",
    request_body = CreateLeaveRequestDto,
    responses(
        (status = 201, description = "Leave request filed", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller cannot file leave requests"),
        (status = 404, description = "Student not found"),
        (status = 422, description = "Invalid date range or missing reason")
    ),
    tag = "Leave Requests",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn create_leave_request(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    ValidatedJson(dto): ValidatedJson<CreateLeaveRequestDto>,
) -> Result<(StatusCode, Json<LeaveRequest>), AppError> {
    let request = LeaveRequestService::create(&state.db, &profile, dto).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/leave-requests",
    params(LeaveRequestFilterParams),
    responses(
        (status = 200, description = "Leave requests visible to the caller, newest first", body = Vec<LeaveRequest>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Leave Requests",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_leave_requests(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Query(filters): Query<LeaveRequestFilterParams>,
) -> Result<Json<Vec<LeaveRequest>>, AppError> {
    let requests = LeaveRequestService::list(&state.db, &profile, filters).await?;
    Ok(Json(requests))
}

#[utoipa::path(
    get,
    path = "/api/leave-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Leave request ID")
    ),
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave Requests",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_leave_request(
    State(state): State<AppState>,
    CurrentProfile(_caller, profile): CurrentProfile,
    Path(id): Path<LeaveRequestId>,
) -> Result<Json<LeaveRequest>, AppError> {
    let request = LeaveRequestService::get_visible(&state.db, &profile, id).await?;
    Ok(Json(request))
}

/// Approving propagates Excused attendance over the request's range and
/// notifies the student once. Re-approving returns the stored request and
/// touches no attendance, so amendments made after approval stand.
#[utoipa::path(
    patch,
    path = "/api/leave-requests/{id}",
    params(
        ("id" = Uuid, Path, description = "Leave request ID")
    ),
    request_body = DecideLeaveRequestDto,
    responses(
        (status = 200, description = "Decision recorded", body = LeaveDecisionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator or manager privileges required"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Request already decided the other way"),
        (status = 422, description = "Invalid decision")
    ),
    tag = "Leave Requests",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn decide_leave_request(
    State(state): State<AppState>,
    RequireStaff(auth_user): RequireStaff,
    Path(id): Path<LeaveRequestId>,
    ValidatedJson(dto): ValidatedJson<DecideLeaveRequestDto>,
) -> Result<Json<LeaveDecisionResponse>, AppError> {
    let decided_by = auth_user.user_id()?;
    let applied = LeaveRequestService::decide(&state.db, id, &dto, decided_by).await?;

    let response = match applied.transition {
        LeaveTransition::Approve => {
            let approval =
                events::on_leave_approved(&state.db, &applied.request, Some(decided_by)).await?;
            info!(
                leave_request = %id,
                created = approval.propagation.created,
                overwritten = approval.propagation.overwritten,
                failed = approval.propagation.failed,
                "Leave approved"
            );
            // Reload so approval_notified_at reflects the notification gate.
            let request = LeaveRequestService::find_by_id(&state.db, id).await?;
            LeaveDecisionResponse {
                request,
                propagation: Some(approval.propagation),
                notified: approval.notified,
            }
        }
        LeaveTransition::Reapprove => LeaveDecisionResponse {
            request: applied.request,
            propagation: None,
            notified: false,
        },
        LeaveTransition::Reject => {
            let notified =
                events::on_leave_rejected(&state.db, &applied.request, Some(decided_by)).await;
            LeaveDecisionResponse {
                request: applied.request,
                propagation: None,
                notified,
            }
        }
        LeaveTransition::UpdateRejection => LeaveDecisionResponse {
            request: applied.request,
            propagation: None,
            notified: false,
        },
    };

    Ok(Json(response))
}
