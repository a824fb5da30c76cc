//! Question and difficulty types shared by the content store, the
//! question generator and the assessment sequencer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Difficulty tier requested from the question generator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Difficulty {
    /// Entry level (default).
    #[default]
    Beginner,
    /// Middle tier.
    Intermediate,
    /// Top tier.
    Advanced,
}

impl Difficulty {
    /// Maps a correct-answer streak to a difficulty tier.
    ///
    /// Saturating step function: two or more in a row is `Advanced`,
    /// exactly one is `Intermediate`, anything else is `Beginner`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tutor_engine::Difficulty;
    ///
    /// assert_eq!(Difficulty::from_streak(0), Difficulty::Beginner);
    /// assert_eq!(Difficulty::from_streak(1), Difficulty::Intermediate);
    /// assert_eq!(Difficulty::from_streak(7), Difficulty::Advanced);
    /// ```
    #[must_use]
    pub const fn from_streak(correct_streak: u32) -> Self {
        if correct_streak >= 2 {
            Self::Advanced
        } else if correct_streak == 1 {
            Self::Intermediate
        } else {
            Self::Beginner
        }
    }

    /// Returns the lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parses a string into a `Difficulty`, case-insensitively.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_str_case_insensitive(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "invalid difficulty '{s}': expected one of 'beginner', 'intermediate', 'advanced'"
            ))
        })
    }
}

impl Serialize for Difficulty {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Identifier of a pre-authored question: numeric or textual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionId {
    /// Numeric identifier.
    Number(u64),
    /// Textual identifier.
    Text(String),
}

impl QuestionId {
    /// Compares against a textual id the way URL parameters arrive.
    ///
    /// `7` matches `"7"`; `"q-7"` matches `"q-7"`.
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        match self {
            Self::Number(n) => n.to_string() == raw,
            Self::Text(s) => s == raw,
        }
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// The correct answer of a question: an option index or the option text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CorrectAnswer {
    /// Zero-based index into `options`.
    Index(usize),
    /// The literal text of the correct option.
    Text(String),
}

impl CorrectAnswer {
    /// Resolves the answer to an option index, if it names one of `options`.
    #[must_use]
    pub fn resolve(&self, options: &[String]) -> Option<usize> {
        match self {
            Self::Index(i) => (*i < options.len()).then_some(*i),
            Self::Text(text) => options.iter().position(|o| o == text),
        }
    }
}

/// A multiple-choice question produced by the question generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// The question prompt.
    #[serde(rename = "question")]
    pub text: String,

    /// The answer options, in display order.
    pub options: Vec<String>,

    /// The correct option.
    pub correct_answer: CorrectAnswer,

    /// Difficulty tier the question was generated for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// A pre-authored question exactly as it appears in `questions.json`.
///
/// Only `id`, `domain` and `topic` are ever read. The entry itself is kept
/// as JSON and served unchanged, whatever other fields it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthoredQuestion(Value);

impl AuthoredQuestion {
    /// Wraps a question bank entry.
    #[must_use]
    pub const fn new(entry: Value) -> Self {
        Self(entry)
    }

    /// The entry's `id`, when it is a non-negative integer or a string.
    #[must_use]
    pub fn id(&self) -> Option<QuestionId> {
        match self.0.get("id")? {
            Value::Number(n) => n.as_u64().map(QuestionId::Number),
            Value::String(s) => Some(QuestionId::Text(s.clone())),
            _ => None,
        }
    }

    /// The entry's `domain`, when it is a string.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.0.get("domain").and_then(Value::as_str)
    }

    /// The entry's `topic`, when it is a string.
    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.0.get("topic").and_then(Value::as_str)
    }

    /// The entry as stored.
    #[must_use]
    pub const fn as_value(&self) -> &Value {
        &self.0
    }

    /// Unwraps the entry.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for AuthoredQuestion {
    fn from(entry: Value) -> Self {
        Self(entry)
    }
}

/// Number of options every question must carry.
pub const OPTIONS_PER_QUESTION: usize = 4;
