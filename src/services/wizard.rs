//! The exam authoring wizard as a plain state machine.
//!
//! [`DraftWizard`] owns the in-progress exam and the current step. It performs no I/O:
//! persistence and auto-save live in [`crate::services::session`], which drives the wizard
//! through [`DraftWizard::apply`] and watches the returned [`Transition`] to decide when
//! the draft needs saving.

use std::fmt;
use std::sync::Arc;

use crate::core::clock::Clock;
use crate::schemas::exam::{default_advanced_config, default_security_config, ConfigMap, ExamMeta};
use crate::schemas::question::{Question, QuestionId, QuestionType};
use crate::schemas::snapshot::{Draft, DraftSnapshot};
use crate::services::validation::{validate_publish, validate_step, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Step {
    #[default]
    BasicInfo,
    Questions,
    Security,
    Advanced,
    Preview,
}

impl Step {
    pub const ALL: [Step; 5] =
        [Self::BasicInfo, Self::Questions, Self::Security, Self::Advanced, Self::Preview];
    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Maps any stored index onto a real step, saturating at both ends.
    pub fn clamped(index: i64) -> Self {
        let last = Self::COUNT - 1;
        let index = usize::try_from(index.max(0)).unwrap_or(last).min(last);
        Self::ALL[index]
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1).min(Self::COUNT - 1)]
    }

    pub fn previous(self) -> Self {
        Self::ALL[self.index().saturating_sub(1)]
    }

    pub fn is_last(self) -> bool {
        self == Self::Preview
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::BasicInfo => "basic",
            Self::Questions => "questions",
            Self::Security => "security",
            Self::Advanced => "advanced",
            Self::Preview => "preview",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::BasicInfo => "Basic Information",
            Self::Questions => "Questions",
            Self::Security => "Security Settings",
            Self::Advanced => "Advanced Settings",
            Self::Preview => "Preview & Publish",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::BasicInfo => "Exam title, subject, and scheduling",
            Self::Questions => "Add and manage exam questions",
            Self::Security => "Proctoring and anti-cheating measures",
            Self::Advanced => "Navigation, grading, and customization",
            Self::Preview => "Review and publish your exam",
        }
    }

    pub fn status(self, current: Step) -> StepStatus {
        match self.cmp(&current) {
            std::cmp::Ordering::Less => StepStatus::Completed,
            std::cmp::Ordering::Equal => StepStatus::Current,
            std::cmp::Ordering::Greater => StepStatus::Upcoming,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Completed,
    Current,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WizardState {
    exam: ExamMeta,
    questions: Vec<Question>,
    security: ConfigMap,
    advanced: ConfigMap,
    step: Step,
    errors: ValidationErrors,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            exam: ExamMeta::default(),
            questions: Vec::new(),
            security: default_security_config(),
            advanced: default_advanced_config(),
            step: Step::BasicInfo,
            errors: ValidationErrors::default(),
        }
    }
}

impl WizardState {
    pub fn exam(&self) -> &ExamMeta {
        &self.exam
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn security(&self) -> &ConfigMap {
        &self.security
    }

    pub fn advanced(&self) -> &ConfigMap {
        &self.advanced
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Errors from the most recent blocked transition.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn draft(&self) -> Draft {
        Draft {
            exam_data: self.exam.clone(),
            questions: self.questions.clone(),
            security_config: self.security.clone(),
            advanced_config: self.advanced.clone(),
            current_step: self.step.index(),
        }
    }

    fn restore(&mut self, snapshot: DraftSnapshot) {
        if let Some(exam) = snapshot.exam_data {
            self.exam = exam;
        }
        if let Some(questions) = snapshot.questions {
            self.questions = questions;
        }
        if let Some(security) = snapshot.security_config {
            self.security = security;
        }
        if let Some(advanced) = snapshot.advanced_config {
            self.advanced = advanced;
        }
        if let Some(step) = snapshot.current_step {
            self.step = Step::clamped(step);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    Next,
    Previous,
    JumpTo(Step),
    SetExam(ExamMeta),
    SetSecurity(ConfigMap),
    SetAdvanced(ConfigMap),
    AddQuestion(QuestionType),
    ReplaceQuestion { index: usize, question: Question },
    DeleteQuestion(usize),
    DuplicateQuestion(usize),
    ImportQuestions(Vec<Question>),
    ReorderQuestion { from: usize, to: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Moved { from: Step, to: Step },
    Blocked(ValidationErrors),
    Added(QuestionId),
    Edited,
    Unchanged,
}

impl Transition {
    fn moved(from: Step, to: Step) -> Self {
        if from == to {
            Self::Unchanged
        } else {
            Self::Moved { from, to }
        }
    }

    fn edited_if(changed: bool) -> Self {
        if changed {
            Self::Edited
        } else {
            Self::Unchanged
        }
    }

    /// Whether the persisted part of the state may differ afterwards.
    pub fn changes_draft(&self) -> bool {
        matches!(self, Self::Moved { .. } | Self::Added(_) | Self::Edited)
    }
}

/// Hands out strictly increasing, time-derived ids.
#[derive(Debug, Clone)]
struct QuestionIds {
    clock: Arc<dyn Clock>,
    last: u64,
}

impl QuestionIds {
    fn next(&mut self) -> QuestionId {
        let id = self.clock.now_millis().max(self.last.saturating_add(1));
        self.last = id;
        QuestionId(id)
    }

    fn observe(&mut self, questions: &[Question]) {
        if let Some(max) = questions.iter().map(|question| question.id.0).max() {
            self.last = self.last.max(max);
        }
    }
}

#[derive(Debug, Clone)]
pub struct DraftWizard {
    state: WizardState,
    ids: QuestionIds,
}

impl DraftWizard {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { state: WizardState::default(), ids: QuestionIds { clock, last: 0 } }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn step(&self) -> Step {
        self.state.step
    }

    /// Overwrites every section present in `snapshot`; absent sections keep their current
    /// values.
    pub fn restore(&mut self, snapshot: DraftSnapshot) {
        self.state.restore(snapshot);
        self.ids.observe(&self.state.questions);
    }

    pub fn validate(&self, step: Step) -> ValidationErrors {
        validate_step(&self.state.exam, &self.state.questions, step)
    }

    pub fn go_next(&mut self) -> Result<Step, ValidationErrors> {
        self.check_current()?;
        self.state.step = self.state.step.next();
        Ok(self.state.step)
    }

    /// Never validates. Stored errors stay until the next validation, as with `jump_to`.
    pub fn go_previous(&mut self) -> Step {
        self.state.step = self.state.step.previous();
        self.state.step
    }

    /// Moving back or staying put is always allowed. Moving forward only checks the
    /// current step, so a valid first step can jump straight to the preview.
    pub fn jump_to(&mut self, target: Step) -> Result<Step, ValidationErrors> {
        if target > self.state.step {
            self.check_current()?;
        }
        self.state.step = target;
        Ok(target)
    }

    /// Side-effect free version of the [`jump_to`](Self::jump_to) gate.
    pub fn can_jump_to(&self, target: Step) -> bool {
        target <= self.state.step || self.validate(self.state.step).is_empty()
    }

    pub fn steps(&self) -> impl Iterator<Item = (Step, StepStatus)> + '_ {
        Step::ALL.into_iter().map(|step| (step, step.status(self.state.step)))
    }

    /// Records and returns the errors that block publishing, if any.
    pub fn check_publish(&mut self) -> Result<(), ValidationErrors> {
        let errors = validate_publish(&self.state.exam, &self.state.questions, self.state.step);
        self.state.errors = errors.clone();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn set_exam(&mut self, exam: ExamMeta) {
        self.state.exam = exam;
    }

    pub fn set_security(&mut self, security: ConfigMap) {
        self.state.security = security;
    }

    pub fn set_advanced(&mut self, advanced: ConfigMap) {
        self.state.advanced = advanced;
    }

    pub fn add_question(&mut self, kind: QuestionType) -> QuestionId {
        let id = self.ids.next();
        self.state.questions.push(Question::new(id, kind));
        id
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.state.questions.get(index)
    }

    /// Returns `false` and leaves the list alone when `index` is out of range.
    pub fn replace_question(&mut self, index: usize, question: Question) -> bool {
        let Some(slot) = self.state.questions.get_mut(index) else {
            return false;
        };
        self.ids.observe(std::slice::from_ref(&question));
        *slot = question;
        true
    }

    pub fn delete_question(&mut self, index: usize) -> Option<Question> {
        (index < self.state.questions.len()).then(|| self.state.questions.remove(index))
    }

    pub fn duplicate_question(&mut self, index: usize) -> Option<QuestionId> {
        let original = self.state.questions.get(index)?;
        let id = self.ids.next();
        let copy = original.duplicate(id);
        self.state.questions.insert(index + 1, copy);
        Some(id)
    }

    /// Appends as given; ids are trusted.
    pub fn import_questions(&mut self, questions: Vec<Question>) -> usize {
        let count = questions.len();
        self.ids.observe(&questions);
        self.state.questions.extend(questions);
        count
    }

    /// List move: take the question at `from` and reinsert it at `to`. A `to` past the end
    /// lands at the end.
    pub fn reorder_question(&mut self, from: usize, to: usize) -> bool {
        let len = self.state.questions.len();
        if from >= len {
            return false;
        }
        let to = to.min(len - 1);
        if from == to {
            return false;
        }
        let question = self.state.questions.remove(from);
        self.state.questions.insert(to, question);
        true
    }

    pub fn apply(&mut self, event: WizardEvent) -> Transition {
        let from = self.state.step;
        match event {
            WizardEvent::Next => match self.go_next() {
                Ok(to) => Transition::moved(from, to),
                Err(errors) => Transition::Blocked(errors),
            },
            WizardEvent::Previous => Transition::moved(from, self.go_previous()),
            WizardEvent::JumpTo(target) => match self.jump_to(target) {
                Ok(to) => Transition::moved(from, to),
                Err(errors) => Transition::Blocked(errors),
            },
            WizardEvent::SetExam(exam) => {
                self.set_exam(exam);
                Transition::Edited
            }
            WizardEvent::SetSecurity(security) => {
                self.set_security(security);
                Transition::Edited
            }
            WizardEvent::SetAdvanced(advanced) => {
                self.set_advanced(advanced);
                Transition::Edited
            }
            WizardEvent::AddQuestion(kind) => Transition::Added(self.add_question(kind)),
            WizardEvent::ReplaceQuestion { index, question } => {
                Transition::edited_if(self.replace_question(index, question))
            }
            WizardEvent::DeleteQuestion(index) => {
                Transition::edited_if(self.delete_question(index).is_some())
            }
            WizardEvent::DuplicateQuestion(index) => {
                self.duplicate_question(index).map_or(Transition::Unchanged, Transition::Added)
            }
            WizardEvent::ImportQuestions(questions) => {
                Transition::edited_if(self.import_questions(questions) > 0)
            }
            WizardEvent::ReorderQuestion { from, to } => {
                Transition::edited_if(self.reorder_question(from, to))
            }
        }
    }

    fn check_current(&mut self) -> Result<(), ValidationErrors> {
        let errors = self.validate(self.state.step);
        self.state.errors = errors.clone();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
