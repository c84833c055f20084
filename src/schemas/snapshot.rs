use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::core::time::format_offset;
use crate::schemas::exam::{ConfigMap, ExamMeta};
use crate::schemas::question::Question;

/// The persisted part of the wizard state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub exam_data: ExamMeta,
    pub questions: Vec<Question>,
    pub security_config: ConfigMap,
    pub advanced_config: ConfigMap,
    pub current_step: usize,
}

impl Draft {
    /// Hex SHA-256 over the persisted fields. Two drafts with equal content share a fingerprint.
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let encoded = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&encoded)))
    }
}

/// A draft as it sits in the key-value store.
///
/// Every field is optional on the way in: snapshots written before a field existed
/// restore what they have and leave the rest at session defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exam_data: Option<ExamMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub questions: Option<Vec<Question>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_config: Option<ConfigMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_config: Option<ConfigMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved: Option<String>,
}

impl DraftSnapshot {
    pub fn stamped(draft: &Draft, saved_at: OffsetDateTime) -> Self {
        Self {
            exam_data: Some(draft.exam_data.clone()),
            questions: Some(draft.questions.clone()),
            security_config: Some(draft.security_config.clone()),
            advanced_config: Some(draft.advanced_config.clone()),
            current_step: i64::try_from(draft.current_step).ok(),
            last_saved: Some(format_offset(saved_at)),
        }
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Only input that is not a JSON object fails. A section with the wrong shape is
    /// logged and left out, the rest still restore.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        let mut sections: Map<String, Value> = serde_json::from_str(raw)?;
        Ok(Self {
            exam_data: take_section(&mut sections, "examData"),
            questions: take_section(&mut sections, "questions"),
            security_config: take_section(&mut sections, "securityConfig"),
            advanced_config: take_section(&mut sections, "advancedConfig"),
            current_step: take_section(&mut sections, "currentStep"),
            last_saved: take_section(&mut sections, "lastSaved"),
        })
    }
}

fn take_section<T: DeserializeOwned>(sections: &mut Map<String, Value>, name: &str) -> Option<T> {
    match sections.remove(name)? {
        Value::Null => None,
        value => match serde_json::from_value(value) {
            Ok(section) => Some(section),
            Err(err) => {
                tracing::warn!(section = name, error = %err, "Skipping unreadable draft section");
                None
            }
        },
    }
}
