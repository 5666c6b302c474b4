use std::env;

use crate::env_parse;

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Access token lifetime in seconds.
    pub access_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            access_token_expiry: env_parse("JWT_ACCESS_EXPIRY").unwrap_or(3600),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "test-secret".to_string(),
            access_token_expiry: 3600,
        }
    }
}
