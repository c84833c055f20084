use std::env;

use super::types::{ConfigError, Environment, StoreBackend};

pub(super) fn env_optional(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

pub(super) fn env_or_default(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

pub(super) fn parse_u16(field: &'static str, value: String) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidValue { field, value })
}

pub(super) fn parse_positive_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    match parse_u64(field, value.clone())? {
        0 => Err(ConfigError::InvalidValue { field, value }),
        parsed => Ok(parsed),
    }
}

pub(super) fn parse_bool(value: &str) -> bool {
    matches!(value, "1" | "true" | "TRUE" | "yes" | "YES" | "on" | "ON")
}

pub(super) fn parse_environment(value: Option<String>) -> Environment {
    match value.as_deref().map(|item| item.to_lowercase()) {
        Some(ref val) if val == "production" || val == "prod" => Environment::Production,
        Some(ref val) if val == "staging" => Environment::Staging,
        Some(ref val) if val == "test" || val == "testing" => Environment::Test,
        _ => Environment::Development,
    }
}

pub(super) fn parse_store_backend(
    field: &'static str,
    value: String,
) -> Result<StoreBackend, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "memory" | "mem" => Ok(StoreBackend::Memory),
        "file" | "fs" => Ok(StoreBackend::File),
        "redis" => Ok(StoreBackend::Redis),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_variants() {
        assert!(parse_bool("1"));
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
    }

    #[test]
    fn parse_environment_variants() {
        assert_eq!(parse_environment(Some("prod".to_string())), Environment::Production);
        assert_eq!(parse_environment(Some("production".to_string())), Environment::Production);
        assert_eq!(parse_environment(Some("staging".to_string())), Environment::Staging);
        assert_eq!(parse_environment(Some("testing".to_string())), Environment::Test);
        assert_eq!(parse_environment(None), Environment::Development);
    }

    #[test]
    fn parse_store_backend_accepts_aliases() {
        assert_eq!(parse_store_backend("S", "Redis".to_string()).unwrap(), StoreBackend::Redis);
        assert_eq!(parse_store_backend("S", "fs".to_string()).unwrap(), StoreBackend::File);
        assert_eq!(parse_store_backend("S", "mem".to_string()).unwrap(), StoreBackend::Memory);
        assert!(parse_store_backend("S", "sqlite".to_string()).is_err());
    }

    #[test]
    fn parse_positive_rejects_zero() {
        assert_eq!(parse_positive_u64("N", "30".to_string()).unwrap(), 30);
        assert!(matches!(
            parse_positive_u64("N", "0".to_string()),
            Err(ConfigError::InvalidValue { field: "N", .. })
        ));
        assert!(parse_positive_u64("N", "-1".to_string()).is_err());
    }
}
