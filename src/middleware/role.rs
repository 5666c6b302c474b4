//! Role-based authorization.
//!
//! Two ways to gate access on the role carried by the token:
//! 1. Layer-based middleware: [`require_staff`] with `from_fn_with_state`
//! 2. Extractor-based: [`RequireStaff`] in the handler signature
//!
//! Plus [`check_role`] / [`check_any_role`] for checks inside handlers.
//! A token without a recognised role never passes a gate.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};

use attendly_core::AppError;
use attendly_models::Role;

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub const STAFF_ROLES: [Role; 2] = [Role::Admin, Role::Manager];

/// Middleware that lets the request through only for the listed roles.
///
/// ```rust,ignore
/// let routes = Router::new()
///     .route("/reports", get(handler))
///     .layer(middleware::from_fn_with_state(state.clone(), |state, req, next| {
///         require_roles(state, req, next, vec![Role::Admin])
///     }));
/// ```
pub async fn require_roles(
    State(state): State<AppState>,
    req: Request,
    next: Next,
    allowed_roles: Vec<Role>,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await?;

    check_any_role(&auth_user, &allowed_roles)?;

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Admins and managers only.
pub async fn require_staff(State(state): State<AppState>, req: Request, next: Next) -> Response {
    match require_roles(State(state), req, next, STAFF_ROLES.to_vec()).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Extractor for admin or manager access.
#[derive(Debug, Clone)]
pub struct RequireStaff(pub AuthUser);

impl FromRequestParts<AppState> for RequireStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        if !auth_user.role().is_some_and(|r| r.is_staff()) {
            tracing::warn!(user = %auth_user.username(), "Staff-only access denied");
            return Err(AppError::forbidden(
                "Access denied. Administrator or manager privileges required.".to_string(),
            ));
        }

        Ok(RequireStaff(auth_user))
    }
}

pub fn check_role(auth_user: &AuthUser, required_role: Role) -> Result<(), AppError> {
    check_any_role(auth_user, &[required_role])
}

pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[Role]) -> Result<(), AppError> {
    match auth_user.role() {
        Some(role) if allowed_roles.contains(&role) => Ok(()),
        Some(role) => {
            tracing::warn!(user = %auth_user.username(), %role, "Role check failed");
            Err(AppError::forbidden(format!(
                "Access denied. Required roles: {}, but user has role: {}",
                format_roles(allowed_roles),
                role
            )))
        }
        None => Err(AppError::forbidden(
            "Access denied. No role has been assigned to this account.".to_string(),
        )),
    }
}

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
