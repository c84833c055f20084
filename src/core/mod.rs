pub mod clock;
pub mod config;
pub mod metrics;
pub mod redis;
pub mod telemetry;
pub mod time;
