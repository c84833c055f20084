use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub const COPY_SUFFIX: &str = " (Copy)";

const PLACEHOLDER_OPTIONS: [&str; 4] = ["Option A", "Option B", "Option C", "Option D"];

/// Session-unique question identifier, derived from wall-clock milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "mcq")]
    SingleChoice,
    #[serde(rename = "essay")]
    Essay,
    #[serde(rename = "fill-blank")]
    FillBlank,
    #[serde(rename = "matching")]
    Matching,
    #[serde(rename = "true-false")]
    TrueFalse,
}

impl QuestionType {
    pub const ALL: [QuestionType; 5] =
        [Self::SingleChoice, Self::Essay, Self::FillBlank, Self::Matching, Self::TrueFalse];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SingleChoice => "mcq",
            Self::Essay => "essay",
            Self::FillBlank => "fill-blank",
            Self::Matching => "matching",
            Self::TrueFalse => "true-false",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SingleChoice => "Multiple Choice",
            Self::Essay => "Essay",
            Self::FillBlank => "Fill in the Blanks",
            Self::Matching => "Matching",
            Self::TrueFalse => "True/False",
        }
    }

    pub fn default_marks(self) -> u32 {
        match self {
            Self::Essay => 10,
            _ => 2,
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown question type '{0}'")]
pub struct UnknownQuestionType(pub String);

impl FromStr for QuestionType {
    type Err = UnknownQuestionType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownQuestionType(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

/// Type-specific payload, tagged by `type` in the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuestionBody {
    #[serde(rename = "mcq", rename_all = "camelCase")]
    SingleChoice {
        #[serde(default)]
        options: Vec<String>,
        #[serde(default)]
        correct_answer: String,
    },
    #[serde(rename = "essay")]
    Essay {},
    #[serde(rename = "fill-blank")]
    FillBlank {
        /// Accepted answer for each blank, in prompt order.
        #[serde(default)]
        blanks: Vec<String>,
    },
    #[serde(rename = "matching")]
    Matching {
        #[serde(default)]
        pairs: Vec<MatchPair>,
    },
    #[serde(rename = "true-false", rename_all = "camelCase")]
    TrueFalse {
        #[serde(default, deserialize_with = "deserialize_truth")]
        correct_answer: Option<bool>,
    },
}

impl QuestionBody {
    pub fn empty(kind: QuestionType) -> Self {
        match kind {
            QuestionType::SingleChoice => Self::SingleChoice {
                options: PLACEHOLDER_OPTIONS.iter().map(|option| option.to_string()).collect(),
                correct_answer: String::new(),
            },
            QuestionType::Essay => Self::Essay {},
            QuestionType::FillBlank => Self::FillBlank { blanks: Vec::new() },
            QuestionType::Matching => Self::Matching { pairs: Vec::new() },
            QuestionType::TrueFalse => Self::TrueFalse { correct_answer: None },
        }
    }

    pub fn kind(&self) -> QuestionType {
        match self {
            Self::SingleChoice { .. } => QuestionType::SingleChoice,
            Self::Essay {} => QuestionType::Essay,
            Self::FillBlank { .. } => QuestionType::FillBlank,
            Self::Matching { .. } => QuestionType::Matching,
            Self::TrueFalse { .. } => QuestionType::TrueFalse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "question", default)]
    pub prompt: String,
    #[serde(default)]
    pub marks: u32,
    #[serde(default)]
    pub explanation: String,
    #[serde(flatten)]
    pub body: QuestionBody,
}

impl Question {
    /// A blank question of `kind` with the default marks and payload for that kind.
    pub fn new(id: QuestionId, kind: QuestionType) -> Self {
        Self {
            id,
            prompt: String::new(),
            marks: kind.default_marks(),
            explanation: String::new(),
            body: QuestionBody::empty(kind),
        }
    }

    pub fn kind(&self) -> QuestionType {
        self.body.kind()
    }

    pub fn duplicate(&self, id: QuestionId) -> Self {
        let mut copy = self.clone();
        copy.id = id;
        copy.prompt = format!("{}{COPY_SUFFIX}", self.prompt);
        copy
    }
}

/// Accepts `true`/`false`, the strings `"True"`/`"False"` (any case), and empty or null as unset.
fn deserialize_truth<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Truth {
        Flag(bool),
        Text(String),
    }

    match Option::<Truth>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Truth::Flag(value)) => Ok(Some(value)),
        Some(Truth::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(D::Error::custom(format!("invalid true/false answer: {other}"))),
        },
    }
}
