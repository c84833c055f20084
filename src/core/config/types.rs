use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Settings {
    pub(super) runtime: RuntimeSettings,
    pub(super) draft: DraftSettings,
    pub(super) store: StoreSettings,
    pub(super) redis: RedisSettings,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub struct DraftSettings {
    pub storage_key: String,
    pub autosave_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub db: u16,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct TelemetrySettings {
    pub log_level: String,
    pub json: bool,
    pub prometheus_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub environment: Environment,
    pub strict_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Staging,
    Test,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Test => "test",
        }
    }

    pub(super) fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Where draft snapshots are kept between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Process-local map; drafts vanish with the process.
    Memory,
    /// One JSON file per key under `data_dir`.
    File,
    Redis,
}

impl StoreBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Redis => "redis",
        }
    }

    pub fn is_durable(self) -> bool {
        !matches!(self, Self::Memory)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("missing required secret for {0}")]
    MissingSecret(&'static str),
}

impl RedisSettings {
    pub fn redis_url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/{}", self.host, self.port, self.db)
        } else {
            format!("redis://:{}@{}:{}/{}", self.password, self.host, self.port, self.db)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_url_includes_password_when_set() {
        let mut redis = RedisSettings {
            host: "cache".to_string(),
            port: 6380,
            db: 2,
            password: String::new(),
        };
        assert_eq!(redis.redis_url(), "redis://cache:6380/2");

        redis.password = "hunter2".to_string();
        assert_eq!(redis.redis_url(), "redis://:hunter2@cache:6380/2");
    }

    #[test]
    fn only_memory_backend_is_volatile() {
        assert!(!StoreBackend::Memory.is_durable());
        assert!(StoreBackend::File.is_durable());
        assert!(StoreBackend::Redis.is_durable());
    }
}
