//! Assessment sequencing.
//!
//! Decides which question a learner sees next: the pre-authored questions
//! for a topic are served in order first, after which one question at a
//! time is requested from a [`QuestionGenerator`] at a difficulty derived
//! from the learner's correct-answer streak.
//!
//! The sequencer owns no state. The caller supplies an [`AssessmentState`]
//! on every call and is responsible for advancing and storing it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{GenerationErrorKind, Result, TutorError};
use crate::generator::QuestionGenerator;
use crate::question::{AuthoredQuestion, Difficulty};

/// Termination reason reported once `max_questions` is reached.
pub const REASON_MAX_QUESTIONS: &str = "max_questions_reached";

/// Caller-supplied progress through an assessment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentState {
    /// Domain being assessed (e.g. "Mathematics").
    pub domain: String,
    /// Topic within the domain (e.g. "Arithmetic").
    pub topic: String,
    /// Zero-based position of the question to serve.
    #[serde(default)]
    pub index: usize,
    /// Consecutive correct answers so far.
    #[serde(default)]
    pub correct_streak: u32,
    /// Total assessment length once generated questions are involved.
    ///
    /// `None` generates indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_questions: Option<usize>,
}

impl AssessmentState {
    /// Creates the state for the first question of a topic.
    #[must_use]
    pub fn new(domain: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Difficulty tier for the current streak.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        Difficulty::from_streak(self.correct_streak)
    }

    /// Label sent to the question generator: `"{domain} - {topic}"`.
    #[must_use]
    pub fn topic_label(&self) -> String {
        format!("{} - {}", self.domain, self.topic)
    }

    /// Returns the state for the following question after an answer.
    ///
    /// A correct answer extends the streak; a wrong one resets it.
    #[must_use]
    pub fn advance(&self, answered_correctly: bool) -> Self {
        Self {
            index: self.index + 1,
            correct_streak: if answered_correctly {
                self.correct_streak.saturating_add(1)
            } else {
                0
            },
            ..self.clone()
        }
    }
}

/// Result of asking the sequencer for the next question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestion {
    /// `true` once the assessment has ended.
    pub done: bool,
    /// The question to present, while not done.
    ///
    /// Authored questions appear exactly as stored in the bank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<Value>,
    /// Position of `question`, while not done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// Known or projected assessment length.
    pub total: usize,
    /// Why the assessment ended, once done.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl NextQuestion {
    /// A question to serve at `index` out of `total`.
    #[must_use]
    pub const fn serve(question: Value, index: usize, total: usize) -> Self {
        Self {
            done: false,
            question: Some(question),
            index: Some(index),
            total,
            reason: None,
        }
    }

    /// The assessment has ended after `total` questions.
    #[must_use]
    pub fn finished(total: usize, reason: impl Into<String>) -> Self {
        Self {
            done: true,
            question: None,
            index: None,
            total,
            reason: Some(reason.into()),
        }
    }
}

/// Selects the next question for `state`.
///
/// Pre-authored questions always come first and are returned exactly as
/// stored, with `total` equal to their count. Past the end of that list the assessment
/// ends if `state.max_questions` has been reached; otherwise exactly one
/// question is requested from `generator` and served with
/// `total = index + 1`.
///
/// # Errors
///
/// Generator failures are returned unchanged; there is no retry. A
/// generator that returns no questions yields `GenerationFailed` with kind
/// `EmptyResponse`.
pub async fn select_next_question(
    existing: &[AuthoredQuestion],
    state: &AssessmentState,
    generator: &dyn QuestionGenerator,
) -> Result<NextQuestion> {
    let difficulty = state.difficulty();

    if let Some(question) = existing.get(state.index) {
        debug!(index = state.index, total = existing.len(), "Serving authored question");
        return Ok(NextQuestion::serve(
            question.as_value().clone(),
            state.index,
            existing.len(),
        ));
    }

    if let Some(max) = state.max_questions {
        if state.index >= max {
            info!(index = state.index, max, "Assessment reached its question limit");
            return Ok(NextQuestion::finished(max, REASON_MAX_QUESTIONS));
        }
    }

    let label = state.topic_label();
    info!(topic = %label, %difficulty, index = state.index, "Requesting generated question");

    let question = generator
        .generate(&label, difficulty, 1)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| {
            TutorError::generation_failed(
                GenerationErrorKind::EmptyResponse,
                format!("generator returned no questions for '{label}'"),
            )
        })?;

    Ok(NextQuestion::serve(
        serde_json::to_value(question)?,
        state.index,
        state.index + 1,
    ))
}
