use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use attendly_auth::verify_token;
use attendly_core::AppError;
use attendly_models::{Claims, Role, UserId};

use crate::policy::{Profile, resolve_profile};
use crate::state::AppState;

/// Extractor that validates the bearer token and provides its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0
            .sub
            .parse::<UserId>()
            .map_err(|_| AppError::unauthorized("Invalid user ID in token".to_string()))
    }

    /// The role carried by the token. Unknown or missing tags read as `None`.
    pub fn role(&self) -> Option<Role> {
        self.0.role.as_deref().and_then(|r| r.parse().ok())
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// Authenticated caller together with their resolved [`Profile`].
#[derive(Debug, Clone)]
pub struct CurrentProfile(pub AuthUser, pub Profile);

impl FromRequestParts<AppState> for CurrentProfile {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        let profile = resolve_profile(&state.db, auth_user.user_id()?).await?;
        Ok(CurrentProfile(auth_user, profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims(role: Option<&str>) -> Claims {
        Claims {
            sub: Uuid::new_v4().to_string(),
            username: "someone".to_string(),
            role: role.map(str::to_string),
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_user_id() {
        let user_id = Uuid::new_v4();
        let auth_user = AuthUser(Claims {
            sub: user_id.to_string(),
            ..claims(None)
        });
        assert_eq!(auth_user.user_id().unwrap(), UserId::from(user_id));
    }

    #[test]
    fn test_invalid_subject_is_unauthorized() {
        let auth_user = AuthUser(Claims {
            sub: "not-a-uuid".to_string(),
            ..claims(None)
        });
        assert_eq!(auth_user.user_id().unwrap_err().status.as_u16(), 401);
    }

    #[test]
    fn test_role_parsing_fails_closed() {
        assert_eq!(AuthUser(claims(Some("Manager"))).role(), Some(Role::Manager));
        assert_eq!(AuthUser(claims(Some("system_admin"))).role(), None);
        assert_eq!(AuthUser(claims(None)).role(), None);
    }
}
