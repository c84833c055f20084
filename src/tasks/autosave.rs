use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

use crate::schemas::snapshot::Draft;
use crate::store::{DraftSlot, SaveTrigger};

/// Debounced background writer for a single draft slot.
///
/// Every [`notify`](Self::notify) restarts the quiet period; the latest draft is written
/// once the period elapses without further changes. Dropping the handle cancels a pending
/// write.
pub(crate) struct AutoSave {
    changes: watch::Sender<Option<Draft>>,
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl AutoSave {
    /// `baseline` is the fingerprint of what the slot already holds, if anything.
    pub(crate) fn spawn(
        slot: DraftSlot,
        delay: Duration,
        baseline: Option<String>,
        saved_at: Arc<watch::Sender<Option<String>>>,
    ) -> Self {
        let (changes, changes_rx) = watch::channel(None);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle =
            tokio::spawn(debounce_loop(slot, delay, baseline, saved_at, changes_rx, shutdown_rx));

        Self { changes, shutdown, handle: Some(handle) }
    }

    pub(crate) fn notify(&self, draft: Draft) {
        self.changes.send_replace(Some(draft));
    }

    /// Cancels any pending write and waits for an in-flight one to finish.
    pub(crate) async fn stop(mut self) {
        if self.shutdown.send(true).is_err() {
            tracing::debug!("Auto-save task already finished");
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "Auto-save task join failed");
            }
        }
    }
}

impl Drop for AutoSave {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn debounce_loop(
    slot: DraftSlot,
    delay: Duration,
    mut last_written: Option<String>,
    saved_at: Arc<watch::Sender<Option<String>>>,
    mut changes: watch::Receiver<Option<Draft>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }

        if !quiet_period(delay, &mut changes, &mut shutdown).await {
            break;
        }

        let latest = changes.borrow_and_update().clone();
        let Some(draft) = latest else {
            continue;
        };

        let fingerprint = match draft.fingerprint() {
            Ok(fingerprint) => Some(fingerprint),
            Err(err) => {
                tracing::warn!(key = slot.key(), error = %err, "Failed to fingerprint draft");
                None
            }
        };
        if fingerprint.is_some() && last_written == fingerprint {
            tracing::trace!(key = slot.key(), "Draft unchanged since last write; skipping");
            continue;
        }

        match slot.save(&draft, SaveTrigger::Auto).await {
            Ok(snapshot) => {
                last_written = fingerprint;
                saved_at.send_replace(snapshot.last_saved);
            }
            Err(err) => {
                tracing::warn!(
                    key = slot.key(),
                    error = %err,
                    "Auto-save failed; will retry on next change"
                );
            }
        }
    }

    tracing::debug!(key = slot.key(), "Auto-save task stopped");
}

/// Waits until `delay` passes with no new change. Returns `false` on shutdown.
async fn quiet_period(
    delay: Duration,
    changes: &mut watch::Receiver<Option<Draft>>,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => return false,
            changed = changes.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
            _ = sleep(delay) => return true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::exam::{default_advanced_config, default_security_config, ExamMeta};
    use crate::schemas::snapshot::DraftSnapshot;
    use crate::store::DraftStore;
    use crate::test_support::{self, RecordingStore};

    const DELAY: Duration = Duration::from_secs(30);

    fn draft(title: &str) -> Draft {
        Draft {
            exam_data: ExamMeta { title: title.to_string(), ..ExamMeta::default() },
            questions: Vec::new(),
            security_config: default_security_config(),
            advanced_config: default_advanced_config(),
            current_step: 0,
        }
    }

    fn spawn(
        store: &RecordingStore,
        baseline: Option<String>,
    ) -> (AutoSave, Arc<watch::Sender<Option<String>>>) {
        let saved_at = Arc::new(watch::channel(None).0);
        let slot = DraftSlot::new(store.shared(), "exam-draft", test_support::clock());
        (AutoSave::spawn(slot, DELAY, baseline, Arc::clone(&saved_at)), saved_at)
    }

    fn titles(store: &RecordingStore) -> Vec<String> {
        store
            .writes()
            .iter()
            .map(|raw| {
                let snapshot = DraftSnapshot::decode(raw).expect("snapshot");
                snapshot.exam_data.expect("exam data").title
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_changes_is_written_once() {
        let store = RecordingStore::new();
        let (autosave, saved_at) = spawn(&store, None);

        for title in ["M", "Mi", "Mid", "Midterm"] {
            autosave.notify(draft(title));
            sleep(Duration::from_secs(5)).await;
        }
        assert!(store.writes().is_empty());

        sleep(DELAY).await;
        assert_eq!(titles(&store), vec!["Midterm".to_string()]);
        assert_eq!(saved_at.borrow().as_deref(), Some("2025-03-01T08:00:00Z"));

        autosave.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn each_quiet_period_gets_its_own_write() {
        let store = RecordingStore::new();
        let (autosave, _) = spawn(&store, None);

        autosave.notify(draft("first"));
        sleep(DELAY + Duration::from_secs(1)).await;
        autosave.notify(draft("second"));
        sleep(DELAY + Duration::from_secs(1)).await;

        assert_eq!(titles(&store), vec!["first".to_string(), "second".to_string()]);
        autosave.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn idle_task_never_writes() {
        let store = RecordingStore::new();
        let (autosave, _) = spawn(&store, None);

        sleep(DELAY * 4).await;
        assert!(store.ops().is_empty());
        autosave.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn content_matching_baseline_is_not_rewritten() {
        let store = RecordingStore::new();
        let stored = draft("Restored");
        let (autosave, _) = spawn(&store, Some(stored.fingerprint().expect("fingerprint")));

        autosave.notify(draft("Restored, edited"));
        autosave.notify(stored);
        sleep(DELAY * 2).await;

        assert!(store.writes().is_empty());
        autosave.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_write() {
        let store = RecordingStore::new();
        let (autosave, _) = spawn(&store, None);

        autosave.notify(draft("unsaved"));
        sleep(Duration::from_secs(10)).await;
        autosave.stop().await;
        sleep(DELAY * 2).await;

        assert!(store.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending_write() {
        let store = RecordingStore::new();
        let (autosave, _) = spawn(&store, None);

        autosave.notify(draft("unsaved"));
        drop(autosave);
        sleep(DELAY * 2).await;

        assert!(store.writes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_write_is_retried_on_next_change() {
        let store = RecordingStore::new();
        let (autosave, saved_at) = spawn(&store, None);

        store.fail_all(true);
        autosave.notify(draft("Final"));
        sleep(DELAY + Duration::from_secs(1)).await;
        assert!(store.writes().is_empty());
        assert_eq!(*saved_at.borrow(), None);

        store.fail_all(false);
        autosave.notify(draft("Final"));
        sleep(DELAY + Duration::from_secs(1)).await;
        assert_eq!(titles(&store), vec!["Final".to_string()]);
        assert!(store.inner().get("exam-draft").await.expect("get").is_some());

        autosave.stop().await;
    }
}
