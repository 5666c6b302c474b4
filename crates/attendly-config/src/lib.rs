//! # Attendly Config
//!
//! Configuration structures loaded from environment variables. Every loader
//! falls back to a development default so the server starts with only
//! `DATABASE_URL` set.
//!
//! - [`jwt`]: token signing secret and lifetime
//! - [`cors`]: allowed browser origins
//! - [`database`]: connection string and pool size
//! - [`server`]: listen addresses for the API and the metrics endpoint
//! - [`attendance`]: institution-local calendar settings

pub mod attendance;
pub mod cors;
pub mod database;
pub mod jwt;
pub mod server;

pub use attendance::AttendanceConfig;
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;

/// Reads and parses an environment variable, returning `None` when it is
/// unset or malformed.
pub(crate) fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring malformed environment variable");
            None
        }
    }
}
