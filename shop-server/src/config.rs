//! Shop server configuration

use crate::BoxError;

/// Storage backend selected at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown STORAGE_BACKEND: {other}")),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Shop server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL (postgres backend only)
    pub database_url: Option<String>,
    pub storage_backend: StorageBackend,
    /// HTTP port
    pub http_port: u16,
    /// Pool size for the postgres backend
    pub db_max_connections: u32,
    /// Environment: development | staging | production
    pub environment: String,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable source
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let environment = get("ENVIRONMENT").unwrap_or_else(|| "development".into());

        let storage_backend = match get("STORAGE_BACKEND") {
            Some(v) => v.parse::<StorageBackend>()?,
            None => StorageBackend::Postgres,
        };

        let database_url = get("DATABASE_URL").filter(|s| !s.is_empty());
        match storage_backend {
            StorageBackend::Postgres if database_url.is_none() => {
                return Err("DATABASE_URL must be set".into());
            }
            StorageBackend::Memory if environment != "development" => {
                return Err(
                    format!("memory storage is not allowed in {environment} environment").into(),
                );
            }
            _ => {}
        }

        let log_format = match get("LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            database_url,
            storage_backend,
            http_port: get("HTTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            db_max_connections: get("DB_MAX_CONNECTIONS")
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
            environment,
            log_format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, BoxError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/shop")]).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Postgres);
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.environment, "development");
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert!(load(&[]).is_err());
        assert!(load(&[("DATABASE_URL", "")]).is_err());
    }

    #[test]
    fn test_memory_backend_only_in_development() {
        let config = load(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Memory);
        assert!(config.database_url.is_none());

        assert!(load(&[("STORAGE_BACKEND", "memory"), ("ENVIRONMENT", "production")]).is_err());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://db/shop"),
            ("HTTP_PORT", "9000"),
            ("DB_MAX_CONNECTIONS", "3"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.http_port, 9000);
        assert_eq!(config.db_max_connections, 3);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_backend() {
        assert!(load(&[("STORAGE_BACKEND", "redis")]).is_err());
    }
}
