use std::fmt;
use std::sync::Arc;

use super::{DraftStore, StoreError};
use crate::core::clock::Clock;
use crate::core::metrics::{DRAFT_RESTORES_TOTAL, DRAFT_SAVES_TOTAL, DRAFT_SAVE_FAILURES_TOTAL};
use crate::schemas::snapshot::{Draft, DraftSnapshot};

/// What triggered a snapshot write; used as a metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTrigger {
    Auto,
    Manual,
}

impl SaveTrigger {
    fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
        }
    }
}

/// The single fixed key a draft lives under, together with the store and clock used to
/// read, stamp and write it.
#[derive(Clone)]
pub struct DraftSlot {
    store: Arc<dyn DraftStore>,
    key: String,
    clock: Arc<dyn Clock>,
}

impl DraftSlot {
    pub fn new(store: Arc<dyn DraftStore>, key: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self { store, key: key.into(), clock }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Reads the stored snapshot. Read failures and undecodable contents are logged and
    /// reported as "no draft".
    pub async fn load(&self) -> Option<DraftSnapshot> {
        let raw = match self.store.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                metrics::counter!(DRAFT_RESTORES_TOTAL, "outcome" => "empty").increment(1);
                return None;
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Failed to read saved draft");
                metrics::counter!(DRAFT_RESTORES_TOTAL, "outcome" => "unavailable").increment(1);
                return None;
            }
        };

        match DraftSnapshot::decode(&raw) {
            Ok(snapshot) => {
                metrics::counter!(DRAFT_RESTORES_TOTAL, "outcome" => "restored").increment(1);
                Some(snapshot)
            }
            Err(err) => {
                tracing::warn!(key = %self.key, error = %err, "Ignoring unreadable saved draft");
                metrics::counter!(DRAFT_RESTORES_TOTAL, "outcome" => "corrupt").increment(1);
                None
            }
        }
    }

    pub(crate) async fn save(
        &self,
        draft: &Draft,
        trigger: SaveTrigger,
    ) -> Result<DraftSnapshot, StoreError> {
        let snapshot = DraftSnapshot::stamped(draft, self.clock.now_utc());
        let result = match snapshot.encode() {
            Ok(encoded) => self.store.set(&self.key, &encoded).await,
            Err(err) => Err(err.into()),
        };

        match result {
            Ok(()) => {
                metrics::counter!(DRAFT_SAVES_TOTAL, "trigger" => trigger.as_str()).increment(1);
                tracing::debug!(
                    key = %self.key,
                    trigger = trigger.as_str(),
                    questions = draft.questions.len(),
                    step = draft.current_step,
                    "Draft saved"
                );
                Ok(snapshot)
            }
            Err(err) => {
                metrics::counter!(DRAFT_SAVE_FAILURES_TOTAL).increment(1);
                Err(err)
            }
        }
    }

    pub(crate) async fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key).await
    }
}

impl fmt::Debug for DraftSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DraftSlot").field("key", &self.key).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::exam::{default_advanced_config, default_security_config, ExamMeta};
    use crate::store::MemoryStore;
    use crate::test_support;

    fn slot(store: &MemoryStore) -> DraftSlot {
        DraftSlot::new(Arc::new(store.clone()), "exam-draft", test_support::clock())
    }

    fn draft() -> Draft {
        Draft {
            exam_data: ExamMeta { title: "Final".to_string(), ..ExamMeta::default() },
            questions: Vec::new(),
            security_config: default_security_config(),
            advanced_config: default_advanced_config(),
            current_step: 0,
        }
    }

    #[tokio::test]
    async fn save_then_load_returns_stamped_snapshot() {
        let store = MemoryStore::new();
        let slot = slot(&store);

        let written = slot.save(&draft(), SaveTrigger::Manual).await.expect("save");
        assert_eq!(written.last_saved.as_deref(), Some("2025-03-01T08:00:00Z"));

        let loaded = slot.load().await.expect("snapshot");
        assert_eq!(loaded, written);
    }

    #[tokio::test]
    async fn load_treats_garbage_as_absent() {
        let store = MemoryStore::new();
        store.set("exam-draft", "{not json").await.unwrap();
        assert!(slot(&store).load().await.is_none());
    }

    #[tokio::test]
    async fn load_treats_store_failure_as_absent() {
        let store = test_support::RecordingStore::new();
        store.fail_all(true);
        let slot = DraftSlot::new(Arc::new(store.clone()), "exam-draft", test_support::clock());
        assert!(slot.load().await.is_none());
    }

    #[tokio::test]
    async fn clear_removes_the_key() {
        let store = MemoryStore::new();
        let slot = slot(&store);
        slot.save(&draft(), SaveTrigger::Auto).await.expect("save");
        slot.clear().await.expect("clear");
        assert!(store.is_empty().await);
        assert!(slot.load().await.is_none());
    }
}
