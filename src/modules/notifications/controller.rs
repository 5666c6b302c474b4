use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::instrument;

use attendly_core::AppError;
use attendly_models::NotificationId;

use crate::middleware::auth::AuthUser;
use crate::modules::notifications::model::{
    MarkAllReadResponse, Notification, NotificationFilterParams, PaginatedNotificationsResponse,
};
use crate::modules::notifications::service::NotificationService;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/notifications",
    params(NotificationFilterParams),
    responses(
        (status = 200, description = "Caller's notifications, newest first", body = PaginatedNotificationsResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_notifications(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<NotificationFilterParams>,
) -> Result<Json<PaginatedNotificationsResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    let notifications = NotificationService::list(&state.db, user_id, filters).await?;
    Ok(Json(notifications))
}

#[utoipa::path(
    post,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked as read", body = Notification),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<Json<Notification>, AppError> {
    let user_id = auth_user.user_id()?;
    let notification = NotificationService::mark_read(&state.db, user_id, id).await?;
    Ok(Json(notification))
}

#[utoipa::path(
    post,
    path = "/api/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked as read", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MarkAllReadResponse>, AppError> {
    let user_id = auth_user.user_id()?;
    let response = NotificationService::mark_all_read(&state.db, user_id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 204, description = "Notification deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Notification not found")
    ),
    tag = "Notifications",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn delete_notification(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode, AppError> {
    let user_id = auth_user.user_id()?;
    NotificationService::delete(&state.db, user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
