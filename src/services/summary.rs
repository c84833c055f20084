use std::collections::BTreeMap;

use serde::Serialize;

use crate::schemas::question::QuestionType;
use crate::services::wizard::{Step, WizardState};

/// Figures shown alongside the question list and on the preview step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSummary {
    pub question_count: usize,
    pub total_marks: u32,
    pub by_type: BTreeMap<QuestionType, usize>,
    pub duration_minutes: Option<u32>,
    pub step_number: usize,
    pub progress_percent: u8,
}

impl DraftSummary {
    pub fn of(state: &WizardState) -> Self {
        let questions = state.questions();
        let mut by_type = BTreeMap::new();
        for question in questions {
            *by_type.entry(question.kind()).or_insert(0) += 1;
        }

        let step_number = state.step().index() + 1;
        let progress = step_number * 100 / Step::COUNT;

        Self {
            question_count: questions.len(),
            total_marks: questions.iter().map(|question| question.marks).sum(),
            by_type,
            duration_minutes: state.exam().duration_minutes(),
            step_number,
            progress_percent: u8::try_from(progress).unwrap_or(100),
        }
    }
}
