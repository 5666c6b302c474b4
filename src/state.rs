use attendly_config::{AttendanceConfig, CorsConfig, DatabaseConfig, JwtConfig};
use sqlx::PgPool;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub attendance_config: AttendanceConfig,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            jwt_config: JwtConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            attendance_config: AttendanceConfig::from_env(),
        }
    }
}

/// Connects to the database named by `DATABASE_URL`, applies migrations and
/// loads the remaining configuration from the environment.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db_config = DatabaseConfig::from_env()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;
    let db = attendly_db::init_db_pool(&db_config).await?;
    attendly_db::run_migrations(&db).await?;

    Ok(AppState::new(db))
}
