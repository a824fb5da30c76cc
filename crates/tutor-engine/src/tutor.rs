//! Rule-based tutor responses.
//!
//! Picks a tone from the learner's streak and last answer, composes a short
//! canned message, and attaches a concept hint after a wrong answer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Hint returned when the table has no entry for a (domain, topic, level).
pub const DEFAULT_HINT: &str = "Try revisiting the fundamentals and approaching the problem slowly.";

/// Tip returned when no contextual tip exists for a (domain, level).
pub const DEFAULT_TIP: &str = "Keep practicing and experimenting with the concepts you're learning!";

/// Built-in concept hints: (domain, topic, level, hint).
const DEFAULT_HINTS: &[(&str, &str, &str, &str)] = &[
    (
        "Mathematics",
        "Arithmetic",
        "beginner",
        "Focus on place value and basic operations one step at a time.",
    ),
    (
        "Mathematics",
        "Arithmetic",
        "intermediate",
        "Try rewriting the problem using simpler numbers.",
    ),
    (
        "Mathematics",
        "Arithmetic",
        "advanced",
        "Look for patterns or shortcuts in the operations.",
    ),
    (
        "Programming",
        "Basics",
        "beginner",
        "Think about what each line of code is doing.",
    ),
    (
        "Programming",
        "Basics",
        "intermediate",
        "Trace the program step by step with sample inputs.",
    ),
    (
        "Programming",
        "Basics",
        "advanced",
        "Consider edge cases and performance.",
    ),
];

/// Study tips by (domain, level).
const CONTEXTUAL_TIPS: &[(&str, &str, &str)] = &[
    ("Mathematics", "beginner", "Start with the basics: understand place value and how numbers work together."),
    ("Mathematics", "intermediate", "Look for patterns and relationships between concepts."),
    ("Mathematics", "advanced", "Think about proofs and why these theorems work, not just how to use them."),
    ("Programming", "beginner", "Practice writing simple code first. Syntax errors are learning opportunities!"),
    ("Programming", "intermediate", "Think about code structure and how components communicate."),
    ("Programming", "advanced", "Consider performance, scalability, and edge cases in your design."),
    ("AI & Machine Learning", "beginner", "Understand the problem you're solving before choosing a model."),
    ("AI & Machine Learning", "intermediate", "Explore how different algorithms handle various data patterns."),
    ("AI & Machine Learning", "advanced", "Focus on optimization, interpretability, and real-world constraints."),
    ("Generative AI", "beginner", "Experiment with different prompts to understand model behavior."),
    ("Generative AI", "intermediate", "Learn how to structure prompts for better, more consistent outputs."),
    ("Generative AI", "advanced", "Explore fine-tuning and advanced techniques for production systems."),
];

/// Style of a tutor response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    /// Encouraging, after a mistake.
    Supportive,
    /// Plain progress feedback.
    #[default]
    Neutral,
    /// Pushes the learner further, on a streak.
    Challenging,
}

impl Tone {
    /// Decides the tone for a learner's recent performance.
    ///
    /// An explicit wrong answer makes the tone supportive, then a streak of
    /// two or more makes it challenging. The streak check runs second and
    /// wins when both apply.
    #[must_use]
    pub const fn select(correct_streak: u32, last_answer_correct: Option<bool>) -> Self {
        let mut tone = Self::Neutral;
        if matches!(last_answer_correct, Some(false)) {
            tone = Self::Supportive;
        }
        if correct_streak >= 2 {
            tone = Self::Challenging;
        }
        tone
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Supportive => write!(f, "supportive"),
            Self::Neutral => write!(f, "neutral"),
            Self::Challenging => write!(f, "challenging"),
        }
    }
}

/// What the tutor knows about the learner for one response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorContext {
    /// Domain being studied.
    pub domain: String,
    /// Topic within the domain.
    pub topic: String,
    /// Learner level, used for hint lookup.
    pub level: String,
    /// Consecutive correct answers.
    #[serde(default)]
    pub correct_streak: u32,
    /// Whether the previous answer was correct; `None` when unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_answer_correct: Option<bool>,
}

/// A composed tutor reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TutorResponse {
    /// Text shown to the learner.
    pub message: String,
    /// Style label for the frontend.
    pub tone: Tone,
    /// Concept hint, only after a wrong answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Concept hints keyed by (domain, topic, level), with a single default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintTable {
    entries: HashMap<(String, String, String), String>,
    default_hint: String,
}

impl Default for HintTable {
    fn default() -> Self {
        let mut table = Self::empty(DEFAULT_HINT);
        for (domain, topic, level, hint) in DEFAULT_HINTS {
            table.insert(*domain, *topic, *level, *hint);
        }
        table
    }
}

impl HintTable {
    /// Creates a table with no entries that always answers `default_hint`.
    #[must_use]
    pub fn empty(default_hint: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            default_hint: default_hint.into(),
        }
    }

    /// Adds or replaces the hint for a (domain, topic, level).
    pub fn insert(
        &mut self,
        domain: impl Into<String>,
        topic: impl Into<String>,
        level: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.entries
            .insert((domain.into(), topic.into(), level.into()), hint.into());
    }

    /// Returns the hint for the exact (domain, topic, level), or the default.
    #[must_use]
    pub fn lookup(&self, domain: &str, topic: &str, level: &str) -> &str {
        self.entries
            .get(&(domain.to_string(), topic.to_string(), level.to_string()))
            .map_or(self.default_hint.as_str(), String::as_str)
    }

    /// Returns the fallback hint.
    #[must_use]
    pub fn default_hint(&self) -> &str {
        &self.default_hint
    }

    /// Number of explicit entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table has no explicit entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Composes the tutor's reply to `user_message`.
///
/// A non-empty `user_message` is echoed after the base message as
/// `You asked: "<message>"`.
///
/// # Examples
///
/// ```
/// use tutor_engine::{generate_tutor_response, HintTable, Tone, TutorContext};
///
/// let context = TutorContext {
///     domain: "Programming".into(),
///     topic: "Basics".into(),
///     level: "beginner".into(),
///     correct_streak: 0,
///     last_answer_correct: Some(false),
/// };
/// let reply = generate_tutor_response("", &context, &HintTable::default());
/// assert_eq!(reply.tone, Tone::Supportive);
/// assert_eq!(reply.hint.as_deref(), Some("Think about what each line of code is doing."));
/// ```
#[must_use]
pub fn generate_tutor_response(
    user_message: &str,
    context: &TutorContext,
    hints: &HintTable,
) -> TutorResponse {
    let tone = Tone::select(context.correct_streak, context.last_answer_correct);
    let topic = &context.topic;

    let (mut message, hint) = if context.last_answer_correct == Some(false) {
        (
            format!("Don't worry — mistakes are part of learning {topic}. Let's break it down step by step."),
            Some(
                hints
                    .lookup(&context.domain, topic, &context.level)
                    .to_string(),
            ),
        )
    } else if context.correct_streak >= 2 {
        (
            format!("Great job! You're doing well in {topic}. Ready to try something a bit more challenging?"),
            None,
        )
    } else {
        (format!("You're making progress in {topic}. Keep going!"), None)
    };

    if !user_message.is_empty() {
        message = format!("{message} You asked: \"{user_message}\"");
    }

    TutorResponse {
        message,
        tone,
        hint,
    }
}

/// Returns a study tip for a domain and level, or a generic one.
#[must_use]
pub fn contextual_tip(domain: &str, level: &str) -> &'static str {
    CONTEXTUAL_TIPS
        .iter()
        .find(|(d, l, _)| *d == domain && *l == level)
        .map_or(DEFAULT_TIP, |&(_, _, tip)| tip)
}
