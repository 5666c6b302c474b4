use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::instrument;

use attendly_core::AppError;
use attendly_models::UserId;

use crate::middleware::auth::AuthUser;
use crate::middleware::role::RequireStaff;
use crate::modules::users::model::{
    AssignRoleDto, ChangePasswordDto, ChangeUsernameDto, MessageResponse,
    PaginatedUsersResponse, RoleAssignmentResponse, UpdateProfileDto, User, UserFilterParams,
    UserProfile,
};
use crate::modules::users::service::UserService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

/// List identities, optionally by role
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilterParams),
    responses(
        (status = 200, description = "Users", body = PaginatedUsersResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Administrator or manager required")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_users(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(filters): Query<UserFilterParams>,
) -> Result<Json<PaginatedUsersResponse>, AppError> {
    let users = UserService::get_users(&state.db, filters).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = UserId, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 403, description = "Administrator or manager required"),
        (status = 404, description = "User not found")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<UserId>,
) -> Result<Json<User>, AppError> {
    let user = UserService::get_user(&state.db, id).await?;
    Ok(Json(user))
}

/// Assign a role to an identity
///
/// The first role written wins. Assigning the role the identity already has
/// succeeds with `changed = false`; assigning a different one is a conflict.
#[utoipa::path(
    patch,
    path = "/api/users/{id}/role",
    params(("id" = UserId, Path, description = "User ID")),
    request_body = AssignRoleDto,
    responses(
        (status = 200, description = "Role assigned", body = RoleAssignmentResponse),
        (status = 403, description = "Administrator or manager required"),
        (status = 404, description = "User, group or child not found"),
        (status = 409, description = "User already has a different role")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn assign_role(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<UserId>,
    ValidatedJson(dto): ValidatedJson<AssignRoleDto>,
) -> Result<Json<RoleAssignmentResponse>, AppError> {
    let response = UserService::assign_role(&state.db, id, dto).await?;
    Ok(Json(response))
}

/// Get the caller's own profile
#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "User profile", body = UserProfile),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let profile = UserService::get_profile(&state.db, auth_user.user_id()?).await?;
    Ok(Json(profile))
}

/// Update the caller's names and contact details
#[utoipa::path(
    patch,
    path = "/api/users/profile",
    request_body = UpdateProfileDto,
    responses(
        (status = 200, description = "Profile updated", body = UserProfile),
        (status = 400, description = "Invalid field"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<UpdateProfileDto>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = UserService::update_profile(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    post,
    path = "/api/users/profile/change-password",
    request_body = ChangePasswordDto,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Current password is incorrect"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangePasswordDto>,
) -> Result<Json<MessageResponse>, AppError> {
    UserService::change_password(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(MessageResponse {
        message: "Password changed".to_string(),
    }))
}

/// Rename the caller's account
#[utoipa::path(
    post,
    path = "/api/users/profile/change-username",
    request_body = ChangeUsernameDto,
    responses(
        (status = 200, description = "Username changed", body = UserProfile),
        (status = 400, description = "Password is incorrect"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Username is already taken")
    ),
    tag = "Users",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state, dto))]
pub async fn change_username(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(dto): ValidatedJson<ChangeUsernameDto>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = UserService::change_username(&state.db, auth_user.user_id()?, dto).await?;
    Ok(Json(profile))
}
