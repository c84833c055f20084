use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::schemas::question::{Question, QuestionId, QuestionType, UnknownQuestionType};

const BUILTIN_CATALOGUE: &str = include_str!("../../data/question_bank.json");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// A reusable question plus the catalogue bookkeeping around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankEntry {
    #[serde(flatten)]
    pub question: Question,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub usage: u32,
    #[serde(default)]
    pub last_used: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BankQuery {
    /// Case-insensitive substring of the prompt. Empty matches everything.
    pub search: String,
    pub category: Option<String>,
    pub kind: Option<QuestionType>,
}

impl BankQuery {
    /// Sets the type filter from its wire name. `"all"` and the empty string clear it.
    pub fn with_kind(mut self, kind: &str) -> Result<Self, UnknownQuestionType> {
        self.kind = match kind.trim() {
            "" | "all" => None,
            name => Some(name.parse()?),
        };
        Ok(self)
    }

    pub fn matches(&self, entry: &BankEntry) -> bool {
        let search = self.search.trim().to_lowercase();
        let matches_search =
            search.is_empty() || entry.question.prompt.to_lowercase().contains(&search);
        let matches_category =
            self.category.as_deref().map_or(true, |category| entry.category == category);
        let matches_kind = self.kind.map_or(true, |kind| entry.question.kind() == kind);

        matches_search && matches_category && matches_kind
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionBank {
    entries: Vec<BankEntry>,
}

impl QuestionBank {
    pub fn new(entries: Vec<BankEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    /// The catalogue shipped with the crate.
    pub fn builtin() -> Result<Self, serde_json::Error> {
        Self::from_json(BUILTIN_CATALOGUE)
    }

    pub fn entries(&self) -> &[BankEntry] {
        &self.entries
    }

    pub fn filter<'a>(
        &'a self,
        query: &'a BankQuery,
    ) -> impl Iterator<Item = &'a BankEntry> + 'a {
        self.entries.iter().filter(move |entry| query.matches(entry))
    }

    /// Picks the entries with the given ids, in catalogue order, ready to import.
    pub fn select(&self, ids: &[QuestionId]) -> Vec<Question> {
        self.entries
            .iter()
            .filter(|entry| ids.contains(&entry.question.id))
            .map(|entry| entry.question.clone())
            .collect()
    }

    pub fn categories(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .map(|entry| entry.category.as_str())
            .filter(|category| !category.is_empty())
            .collect()
    }
}
