mod parsing;
mod settings;
mod types;

pub use settings::DEFAULT_STORAGE_KEY;
pub use types::{
    ConfigError, DraftSettings, Environment, RedisSettings, RuntimeSettings, Settings,
    StoreBackend, StoreSettings, TelemetrySettings,
};
