//! One authoring session: a [`DraftWizard`] bound to a draft slot.
//!
//! Starting a session loads the saved draft before anything else happens, and only then
//! arms auto-save. Every event that changes persisted state is forwarded to the auto-save
//! task; publishing stops that task and clears the slot.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use uuid::Uuid;

use crate::core::metrics::EXAMS_PUBLISHED_TOTAL;
use crate::core::time::format_offset;
use crate::schemas::exam::{ConfigMap, ExamMeta};
use crate::schemas::question::Question;
use crate::schemas::snapshot::DraftSnapshot;
use crate::services::validation::ValidationErrors;
use crate::services::wizard::{DraftWizard, Transition, WizardEvent, WizardState};
use crate::store::{DraftSlot, SaveTrigger, StoreError};
use crate::tasks::autosave::AutoSave;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("exam is not ready to publish: {0}")]
    Invalid(ValidationErrors),
    #[error("failed to clear saved draft: {0}")]
    Store(#[from] StoreError),
}

/// A refused publish. The session is handed back so the author can keep editing.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PublishRejected {
    pub session: Box<DraftSession>,
    #[source]
    pub error: PublishError,
}

impl PublishRejected {
    fn new(session: DraftSession, error: PublishError) -> Self {
        Self { session: Box::new(session), error }
    }

    pub fn into_session(self) -> DraftSession {
        *self.session
    }
}

/// The finished exam handed to whoever consumes a publish.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedExam {
    pub exam: ExamMeta,
    pub questions: Vec<Question>,
    pub security: ConfigMap,
    pub advanced: ConfigMap,
    pub published_at: String,
}

pub struct DraftSession {
    id: Uuid,
    wizard: DraftWizard,
    slot: DraftSlot,
    autosave: Option<AutoSave>,
    autosave_delay: Duration,
    last_saved: Arc<watch::Sender<Option<String>>>,
    restored: bool,
}

impl DraftSession {
    pub async fn start(slot: DraftSlot, autosave_delay: Duration) -> Self {
        let id = Uuid::new_v4();
        let mut wizard = DraftWizard::new(slot.clock());

        let snapshot = slot.load().await;
        let restored = snapshot.is_some();
        let mut saved_at = None;
        if let Some(snapshot) = snapshot {
            saved_at = snapshot.last_saved.clone();
            wizard.restore(snapshot);
            tracing::info!(
                session_id = %id,
                key = slot.key(),
                last_saved = saved_at.as_deref().unwrap_or("unknown"),
                questions = wizard.state().questions().len(),
                step = wizard.step().index(),
                "Restored saved draft"
            );
        } else {
            tracing::debug!(session_id = %id, key = slot.key(), "Starting a new draft");
        }

        let baseline = if restored {
            wizard
                .state()
                .draft()
                .fingerprint()
                .map_err(|err| {
                    tracing::warn!(session_id = %id, error = %err, "Failed to fingerprint draft");
                })
                .ok()
        } else {
            None
        };
        let last_saved = Arc::new(watch::channel(saved_at).0);
        let autosave =
            AutoSave::spawn(slot.clone(), autosave_delay, baseline, Arc::clone(&last_saved));

        Self {
            id,
            wizard,
            slot,
            autosave: Some(autosave),
            autosave_delay,
            last_saved,
            restored,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn wizard(&self) -> &DraftWizard {
        &self.wizard
    }

    pub fn state(&self) -> &WizardState {
        self.wizard.state()
    }

    /// Whether a saved draft was found when the session started.
    pub fn was_restored(&self) -> bool {
        self.restored
    }

    /// RFC 3339 time of the most recent successful write, or of the restored draft.
    pub fn last_saved(&self) -> Option<String> {
        self.last_saved.borrow().clone()
    }

    pub fn apply(&mut self, event: WizardEvent) -> Transition {
        let transition = self.wizard.apply(event);
        if transition.changes_draft() {
            self.schedule_save();
        }
        transition
    }

    /// Writes the current draft immediately. A pending auto-save is left in place.
    pub async fn save_now(&self) -> Result<DraftSnapshot, StoreError> {
        let snapshot = self.slot.save(&self.wizard.state().draft(), SaveTrigger::Manual).await?;
        self.last_saved.send_replace(snapshot.last_saved.clone());
        Ok(snapshot)
    }

    pub async fn publish(mut self) -> Result<PublishedExam, PublishRejected> {
        if let Err(errors) = self.wizard.check_publish() {
            tracing::info!(session_id = %self.id, errors = %errors, "Publish blocked");
            return Err(PublishRejected::new(self, PublishError::Invalid(errors)));
        }

        if let Some(autosave) = self.autosave.take() {
            autosave.stop().await;
        }

        if let Err(err) = self.slot.clear().await {
            tracing::error!(
                session_id = %self.id,
                key = self.slot.key(),
                error = %err,
                "Failed to clear saved draft on publish"
            );
            self.autosave = Some(AutoSave::spawn(
                self.slot.clone(),
                self.autosave_delay,
                None,
                Arc::clone(&self.last_saved),
            ));
            self.schedule_save();
            return Err(PublishRejected::new(self, err.into()));
        }

        let state = self.wizard.state();
        metrics::counter!(EXAMS_PUBLISHED_TOTAL).increment(1);
        tracing::info!(
            session_id = %self.id,
            title = %state.exam().title,
            questions = state.questions().len(),
            "Exam published"
        );

        Ok(PublishedExam {
            exam: state.exam().clone(),
            questions: state.questions().to_vec(),
            security: state.security().clone(),
            advanced: state.advanced().clone(),
            published_at: format_offset(self.slot.clock().now_utc()),
        })
    }

    /// Ends the session. Changes still waiting for the auto-save delay are discarded.
    pub async fn close(mut self) {
        if let Some(autosave) = self.autosave.take() {
            autosave.stop().await;
        }
        tracing::debug!(session_id = %self.id, "Draft session closed");
    }

    fn schedule_save(&self) {
        if let Some(autosave) = &self.autosave {
            autosave.notify(self.wizard.state().draft());
        }
    }
}

impl fmt::Debug for DraftSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftSession")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("step", &self.wizard.step())
            .field("questions", &self.wizard.state().questions().len())
            .field("restored", &self.restored)
            .finish_non_exhaustive()
    }
}
