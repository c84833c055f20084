use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use async_trait::async_trait;
use time::macros::datetime;

use crate::core::clock::{Clock, ManualClock};
use crate::schemas::exam::ExamMeta;
use crate::schemas::question::{MatchPair, Question, QuestionBody, QuestionId};
use crate::store::{DraftStore, MemoryStore, StoreError};

const TEST_REDIS_DB: &str = "1";

pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn set_test_env() {
    std::env::set_var("EXAM_DRAFT_ENV", "test");
    std::env::set_var("EXAM_DRAFT_STRICT_CONFIG", "0");
    std::env::remove_var("EXAM_DRAFT_STORAGE_KEY");
    std::env::remove_var("EXAM_DRAFT_STORE");
    std::env::remove_var("EXAM_DRAFT_AUTOSAVE_SECONDS");
    std::env::remove_var("EXAM_DRAFT_DATA_DIR");
    std::env::set_var("REDIS_HOST", "127.0.0.1");
    std::env::set_var("REDIS_PORT", "6379");
    std::env::set_var("REDIS_DB", TEST_REDIS_DB);
    std::env::remove_var("REDIS_PASSWORD");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
}

/// Frozen at 2025-03-01T08:00:00Z.
pub(crate) fn clock() -> Arc<dyn Clock> {
    Arc::new(ManualClock::new(datetime!(2025-03-01 08:00:00 UTC)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreOp {
    Get,
    Set(String),
    Remove,
}

/// In-memory store that logs every call and can be switched into failing mode.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingStore {
    inner: MemoryStore,
    ops: Arc<Mutex<Vec<StoreOp>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn shared(&self) -> Arc<dyn DraftStore> {
        Arc::new(self.clone())
    }

    pub(crate) fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub(crate) fn fail_all(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Values of the writes that reached the inner store.
    pub(crate) fn writes(&self) -> Vec<String> {
        self.ops
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|op| match op {
                StoreOp::Set(value) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, op: StoreOp) {
        self.ops.lock().unwrap_or_else(PoisonError::into_inner).push(op);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Disconnected)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DraftStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check()?;
        self.record(StoreOp::Get);
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check()?;
        self.record(StoreOp::Set(value.to_string()));
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.check()?;
        self.record(StoreOp::Remove);
        self.inner.remove(key).await
    }
}

/// Every required basic-info field filled, optional ones left blank.
pub(crate) fn complete_exam() -> ExamMeta {
    ExamMeta {
        title: "Database Systems Midterm".to_string(),
        subject: "cs301".to_string(),
        duration: "90".to_string(),
        start_date_time: "2025-09-15T09:00".to_string(),
        end_date_time: "2025-09-15T10:30".to_string(),
        passing_criteria: "60".to_string(),
        ..ExamMeta::default()
    }
}

pub(crate) fn bank_questions() -> Vec<Question> {
    vec![
        Question {
            id: QuestionId(101),
            prompt: "Which normal form removes transitive dependencies?".to_string(),
            marks: 2,
            explanation: String::new(),
            body: QuestionBody::SingleChoice {
                options: vec!["1NF".to_string(), "2NF".to_string(), "3NF".to_string()],
                correct_answer: "3NF".to_string(),
            },
        },
        Question {
            id: QuestionId(102),
            prompt: "Match each isolation level to the anomaly it prevents.".to_string(),
            marks: 4,
            explanation: String::new(),
            body: QuestionBody::Matching {
                pairs: vec![
                    MatchPair {
                        left: "Read committed".to_string(),
                        right: "Dirty reads".to_string(),
                    },
                    MatchPair {
                        left: "Serializable".to_string(),
                        right: "Phantoms".to_string(),
                    },
                ],
            },
        },
    ]
}
