use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

pub(crate) const DRAFT_SAVES_TOTAL: &str = "draft_saves_total";
pub(crate) const DRAFT_SAVE_FAILURES_TOTAL: &str = "draft_save_failures_total";
pub(crate) const DRAFT_RESTORES_TOTAL: &str = "draft_restores_total";
pub(crate) const EXAMS_PUBLISHED_TOTAL: &str = "exams_published_total";

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    describe();
    Ok(())
}

/// Prometheus text exposition, when the recorder was installed by [`init`].
pub fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

fn describe() {
    metrics::describe_counter!(DRAFT_SAVES_TOTAL, "Draft snapshots written, by trigger");
    metrics::describe_counter!(DRAFT_SAVE_FAILURES_TOTAL, "Draft snapshot writes that failed");
    metrics::describe_counter!(DRAFT_RESTORES_TOTAL, "Session starts, by restore outcome");
    metrics::describe_counter!(EXAMS_PUBLISHED_TOTAL, "Drafts completed through publish");
}
