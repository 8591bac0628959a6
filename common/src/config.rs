//! Service configuration.
//!
//! All settings come from environment variables with sensible defaults,
//! so a service can run locally with nothing but a reachable MongoDB.

use std::path::PathBuf;

/// Application configuration shared by all services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Name of the service this config was loaded for.
    pub service_name: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// MongoDB connection string.
    pub database_url: String,
    /// MongoDB database name.
    pub database_name: String,
    /// Directory holding backup artifacts.
    pub backup_dir: PathBuf,
    /// Connection timeout in seconds for the database client.
    pub connect_timeout_secs: u64,
    /// Minimum pooled connections kept open.
    pub min_pool_size: u32,
    /// Maximum pooled connections.
    pub max_pool_size: u32,
    /// External connection quota granted by the database provider.
    pub connection_limit: u32,
}

impl AppConfig {
    /// Loads configuration from the environment for the given service.
    pub fn load_with_service(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: env_parse("SERVER_PORT", 8080),
            database_url: env_or("MONGODB_URI", "mongodb://localhost:27017"),
            database_name: env_or("MONGODB_DATABASE", "chapter_portal"),
            backup_dir: PathBuf::from(env_or("BACKUP_DIR", "backups")),
            connect_timeout_secs: env_parse("DB_CONNECT_TIMEOUT_SECS", 10),
            min_pool_size: env_parse("DB_MIN_POOL_SIZE", 2),
            max_pool_size: env_parse("DB_MAX_POOL_SIZE", 10),
            connection_limit: env_parse("DB_CONNECTION_LIMIT", 500),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Loads a `.env` file from the working directory (best-effort, silent if missing).
///
/// Values already present in the environment take precedence.
pub fn load_dotenv() {
    let Ok(content) = std::fs::read_to_string(".env") else {
        return;
    };
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let (key, value) = (key.trim(), value.trim());
            if std::env::var(key).is_err() {
                std::env::set_var(key, value);
            }
        }
    }
}
