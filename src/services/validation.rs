use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use validator::Validate;

use crate::schemas::exam::ExamMeta;
use crate::schemas::question::Question;
use crate::services::wizard::Step;

pub const QUESTIONS_REQUIRED: &str = "At least one question is required";

/// Field name -> message for the problems found on a step. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(field, message)| (field.as_str(), message.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl From<validator::ValidationErrors> for ValidationErrors {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = Self::default();
        for (field, field_errors) in errors.field_errors() {
            let Some(first) = field_errors.first() else {
                continue;
            };
            let message = first
                .message
                .as_ref()
                .map(|message| message.to_string())
                .unwrap_or_else(|| format!("{field} is invalid"));
            out.insert(field.to_string(), message);
        }
        out
    }
}

/// Checks a single step. Steps past the question list carry no rules.
pub fn validate_step(exam: &ExamMeta, questions: &[Question], step: Step) -> ValidationErrors {
    match step {
        Step::BasicInfo => match exam.validate() {
            Ok(()) => ValidationErrors::default(),
            Err(errors) => errors.into(),
        },
        Step::Questions => validate_questions(questions),
        Step::Security | Step::Advanced | Step::Preview => ValidationErrors::default(),
    }
}

/// Publishing needs the current step to pass and at least one question, whatever step
/// the author is on.
pub fn validate_publish(
    exam: &ExamMeta,
    questions: &[Question],
    current: Step,
) -> ValidationErrors {
    let mut errors = validate_step(exam, questions, current);
    if questions.is_empty() {
        errors.insert("questions", QUESTIONS_REQUIRED);
    }
    errors
}

fn validate_questions(questions: &[Question]) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if questions.is_empty() {
        errors.insert("questions", QUESTIONS_REQUIRED);
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::question::{QuestionId, QuestionType};
    use crate::test_support;

    #[test]
    fn empty_basic_info_reports_every_required_field() {
        let errors = validate_step(&ExamMeta::default(), &[], Step::BasicInfo);
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec![
                "duration",
                "end_date_time",
                "passing_criteria",
                "start_date_time",
                "subject",
                "title"
            ]
        );
        assert_eq!(errors.get("title"), Some("Exam title is required"));
        assert_eq!(errors.get("end_date_time"), Some("End date is required"));
    }

    #[test]
    fn optional_fields_are_not_checked() {
        let exam = test_support::complete_exam();
        assert!(exam.difficulty.is_empty());
        assert!(validate_step(&exam, &[], Step::BasicInfo).is_empty());
    }

    #[test]
    fn end_before_start_is_accepted() {
        let mut exam = test_support::complete_exam();
        exam.start_date_time = "2025-09-20T10:00".to_string();
        exam.end_date_time = "2025-09-01T10:00".to_string();
        assert!(validate_step(&exam, &[], Step::BasicInfo).is_empty());
    }

    #[test]
    fn question_step_requires_one_question() {
        let errors = validate_step(&ExamMeta::default(), &[], Step::Questions);
        assert_eq!(errors.get("questions"), Some(QUESTIONS_REQUIRED));

        let questions = vec![Question::new(QuestionId(1), QuestionType::Essay)];
        assert!(validate_step(&ExamMeta::default(), &questions, Step::Questions).is_empty());
    }

    #[test]
    fn later_steps_have_no_rules() {
        for step in [Step::Security, Step::Advanced, Step::Preview] {
            assert!(validate_step(&ExamMeta::default(), &[], step).is_empty(), "{step:?}");
        }
    }

    #[test]
    fn publish_adds_question_requirement_on_any_step() {
        let errors = validate_publish(&ExamMeta::default(), &[], Step::Preview);
        assert_eq!(errors.len(), 1);
        assert!(errors.contains("questions"));
    }

    #[test]
    fn display_joins_fields_in_order() {
        let mut errors = ValidationErrors::default();
        errors.insert("title", "Exam title is required");
        errors.insert("questions", QUESTIONS_REQUIRED);
        assert_eq!(
            errors.to_string(),
            "questions: At least one question is required; title: Exam title is required"
        );
    }
}
