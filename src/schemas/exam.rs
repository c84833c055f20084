use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::parse_datetime_flexible;

/// Flat name -> scalar settings map, carried through the wizard untouched.
pub type ConfigMap = serde_json::Map<String, Value>;

/// Basic exam properties as entered on the first wizard step.
///
/// Every field stays a string until validation: the form hands back text for numbers
/// and dates alike, and drafts written by older sessions must load as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamMeta {
    #[validate(length(min = 1, message = "Exam title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    pub difficulty: String,
    #[validate(length(min = 1, message = "Duration is required"))]
    pub duration: String,
    pub total_marks: String,
    #[validate(length(min = 1, message = "Start date is required"))]
    pub start_date_time: String,
    #[validate(length(min = 1, message = "End date is required"))]
    pub end_date_time: String,
    pub attempts: String,
    pub instructions: String,
    #[validate(length(min = 1, message = "Passing criteria is required"))]
    pub passing_criteria: String,
}

impl ExamMeta {
    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration.trim().parse().ok()
    }

    pub fn starts_at(&self) -> Option<OffsetDateTime> {
        parse_datetime_flexible(&self.start_date_time)
    }

    pub fn ends_at(&self) -> Option<OffsetDateTime> {
        parse_datetime_flexible(&self.end_date_time)
    }

    /// `None` for "unlimited" or anything that is not a count.
    pub fn attempt_limit(&self) -> Option<u32> {
        self.attempts.trim().parse().ok()
    }
}

pub fn default_security_config() -> ConfigMap {
    config_map([
        ("proctoringLevel", json!("basic")),
        ("browserLockdown", json!(true)),
        ("disableRightClick", json!(true)),
        ("fullScreenMode", json!(true)),
        ("webcamMonitoring", json!(false)),
        ("screenRecording", json!(false)),
        ("allowedIPs", json!("")),
        ("geofenceRadius", json!("")),
        ("sessionTimeout", json!("30")),
        ("warningThreshold", json!("3")),
        ("autoSubmitOnViolation", json!(true)),
        ("sendAlerts", json!(true)),
        ("requireIdVerification", json!(false)),
    ])
}

pub fn default_advanced_config() -> ConfigMap {
    config_map([
        ("randomization", json!("none")),
        ("questionsPerPage", json!("1")),
        ("navigationMode", json!("free")),
        ("timePerQuestion", json!("")),
        ("gradingMode", json!("immediate")),
        ("showQuestionNumbers", json!(true)),
        ("showProgressBar", json!(true)),
        ("showTimeRemaining", json!(true)),
        ("warningBeforeTimeout", json!("5")),
        ("showCorrectAnswers", json!(false)),
        ("showScoreBreakdown", json!(true)),
        ("allowResultsDownload", json!(false)),
        ("requireAllAnswers", json!(false)),
        ("confirmBeforeSubmit", json!(true)),
        ("autoSubmitOnTimeout", json!(true)),
        ("allowLateSubmission", json!(false)),
        ("welcomeMessage", json!("")),
        ("completionMessage", json!("")),
    ])
}

fn config_map<const N: usize>(entries: [(&str, Value); N]) -> ConfigMap {
    entries.into_iter().map(|(key, value)| (key.to_string(), value)).collect()
}
