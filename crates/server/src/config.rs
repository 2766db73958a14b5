//! Server configuration from environment variables.

use crate::rooms::DEFAULT_MAX_ROOMS;

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Ceiling on simultaneously active rooms; creates beyond it fail
    /// with a capacity error.
    pub max_rooms: usize,
    /// Comma-separated allowed CORS origins, or `*`. None disables the
    /// CORS layer entirely.
    pub cors_allowed_origins: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let host = std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("SERVER_PORT")
            .or_else(|_| std::env::var("PORT"))
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .unwrap_or(3000);
        let max_rooms: usize = std::env::var("MAX_ROOMS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_ROOMS);
        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            host,
            port,
            max_rooms,
            cors_allowed_origins,
        }
    }
}
