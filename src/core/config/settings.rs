use std::path::PathBuf;
use std::time::Duration;

use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_environment, parse_positive_u64,
    parse_store_backend, parse_u16,
};
use super::types::{
    ConfigError, DraftSettings, RedisSettings, RuntimeSettings, Settings, StoreBackend,
    StoreSettings, TelemetrySettings,
};

pub const DEFAULT_STORAGE_KEY: &str = "exam-draft";
const DEFAULT_AUTOSAVE_SECONDS: &str = "30";

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let environment = parse_environment(
            env_optional("EXAM_DRAFT_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("EXAM_DRAFT_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let storage_key = env_or_default("EXAM_DRAFT_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        let autosave_seconds = parse_positive_u64(
            "EXAM_DRAFT_AUTOSAVE_SECONDS",
            env_or_default("EXAM_DRAFT_AUTOSAVE_SECONDS", DEFAULT_AUTOSAVE_SECONDS),
        )?;

        let backend =
            parse_store_backend("EXAM_DRAFT_STORE", env_or_default("EXAM_DRAFT_STORE", "file"))?;
        let data_dir = PathBuf::from(env_or_default("EXAM_DRAFT_DATA_DIR", ".exam-drafts"));

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let log_level = env_or_default("EXAM_DRAFT_LOG_LEVEL", "info");
        let json =
            env_optional("EXAM_DRAFT_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            runtime: RuntimeSettings { environment, strict_config },
            draft: DraftSettings {
                storage_key,
                autosave_delay: Duration::from_secs(autosave_seconds),
            },
            store: StoreSettings { backend, data_dir },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;

        Ok(settings)
    }

    pub fn draft(&self) -> &DraftSettings {
        &self.draft
    }

    pub fn store(&self) -> &StoreSettings {
        &self.store
    }

    pub fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.draft.storage_key.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                field: "EXAM_DRAFT_STORAGE_KEY",
                value: self.draft.storage_key.clone(),
            });
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if !self.store.backend.is_durable() {
            return Err(ConfigError::InvalidValue {
                field: "EXAM_DRAFT_STORE",
                value: self.store.backend.as_str().to_string(),
            });
        }

        if self.store.backend == StoreBackend::Redis && self.redis.password.is_empty() {
            return Err(ConfigError::MissingSecret("REDIS_PASSWORD"));
        }

        Ok(())
    }
}
