pub mod core;
pub mod schemas;
pub mod services;
pub mod store;
pub(crate) mod tasks;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::core::clock::SystemClock;
use crate::core::{config::Settings, telemetry};
use crate::store::DraftSlot;

pub use crate::schemas::exam::{ConfigMap, ExamMeta};
pub use crate::schemas::question::{Question, QuestionBody, QuestionId, QuestionType};
pub use crate::schemas::snapshot::DraftSnapshot;
pub use crate::services::question_bank::{BankQuery, QuestionBank};
pub use crate::services::session::{DraftSession, PublishError, PublishRejected, PublishedExam};
pub use crate::services::summary::DraftSummary;
pub use crate::services::validation::ValidationErrors;
pub use crate::services::wizard::{DraftWizard, Step, Transition, WizardEvent, WizardState};
pub use crate::store::{DraftStore, StoreError};

/// Reads `.env` and the process environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    dotenvy::dotenv().ok();
    Ok(Settings::load()?)
}

/// Installs tracing and, when enabled, the Prometheus recorder. Call once per process.
pub fn init(settings: &Settings) -> anyhow::Result<()> {
    telemetry::init_tracing(settings)?;
    core::metrics::init(settings)?;
    Ok(())
}

/// Opens the configured store and starts a session on the configured draft key.
pub async fn open_session(settings: &Settings) -> anyhow::Result<DraftSession> {
    let store = store::open_store(settings).await?;
    let slot = DraftSlot::new(store, settings.draft().storage_key.clone(), Arc::new(SystemClock));
    let session = DraftSession::start(slot, settings.draft().autosave_delay).await;

    tracing::info!(
        session_id = %session.id(),
        environment = %settings.runtime().environment.as_str(),
        store = %settings.store().backend.as_str(),
        restored = session.was_restored(),
        "Draft session started"
    );

    Ok(session)
}
