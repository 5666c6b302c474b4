use std::env;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: String,
    pub metrics_addr: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            metrics_addr: env::var("METRICS_ADDR").unwrap_or_else(|_| "0.0.0.0:9090".to_string()),
        }
    }
}
