use attendly_auth::create_access_token;
use attendly_config::JwtConfig;
use attendly_core::AppError;
use attendly_core::password::verify_password;
use attendly_models::{User, UserCredentials, UserId};
use sqlx::PgPool;
use tracing::{instrument, warn};

use crate::metrics;
use crate::modules::auth::model::{LoginRequest, LoginResponse, LoginUser, MeResponse};
use crate::policy::Profile;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub struct AuthService;

impl AuthService {
    #[instrument(skip(db, dto, jwt_config), fields(username = %dto.username))]
    pub async fn login_user(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<LoginResponse, AppError> {
        let Some(credentials) = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, password, role FROM users WHERE username = $1",
        )
        .bind(dto.username.trim())
        .fetch_optional(db)
        .await?
        else {
            metrics::track_user_login_failure("unknown_user");
            warn!("Login failed: unknown username");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(&dto.password, &credentials.password)? {
            metrics::track_user_login_failure("invalid_password");
            warn!(user = %credentials.id, "Login failed: wrong password");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let role = credentials.role.map(|r| r.as_str());
        let access_token = create_access_token(
            credentials.id.into_inner(),
            &credentials.username,
            role,
            jwt_config,
        )?;

        metrics::track_jwt_issued();
        metrics::track_user_login_success(role.unwrap_or("unassigned"));

        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt_config.access_token_expiry,
            user: LoginUser {
                id: credentials.id,
                username: credentials.username,
                role: credentials.role,
            },
        })
    }

    #[instrument(skip(db))]
    pub async fn find_user(db: &PgPool, id: UserId) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            "SELECT id, username, first_name, last_name, email, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow::anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn me(db: &PgPool, profile: &Profile) -> Result<MeResponse, AppError> {
        let user = Self::find_user(db, profile.user_id()).await?;
        Ok(MeResponse::new(user, profile))
    }
}
