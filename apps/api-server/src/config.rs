//! Application configuration loaded from environment variables.

use std::env;

use folio_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// None when DATABASE_URL is not set; the server then runs on the
    /// in-memory repositories.
    pub database: Option<DatabaseConfig>,
    /// None when REDIS_URL is not set; cache and job queue then run
    /// in-memory.
    pub redis_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            redis_url: env::var("REDIS_URL").ok(),
        }
    }
}
