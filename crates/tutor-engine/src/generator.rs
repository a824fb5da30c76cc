//! Question generation through a language-model chat-completion API.
//!
//! [`QuestionGenerator`] is the seam the assessment sequencer calls when it
//! runs out of pre-authored questions. [`ChatCompletionGenerator`] is the
//! production implementation: it prompts an OpenAI-compatible endpoint for
//! strict JSON and validates every returned question before handing it on.
//! Malformed or missing model output is an error, never an empty default.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LlmSettings;
use crate::error::{GenerationErrorKind, Result, TutorError};
use crate::question::{CorrectAnswer, Difficulty, Question, OPTIONS_PER_QUESTION};

/// Matches a markdown code fence wrapped around the whole payload.
#[allow(clippy::unwrap_used)]
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*\n(.*?)\n?\s*```\s*$").unwrap());

/// Produces fresh multiple-choice questions on demand.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    /// Generates `count` questions about `topic_label` at `difficulty`.
    ///
    /// Fails with [`TutorError::GenerationFailed`] when the backing service
    /// is unreachable or its output cannot be used.
    async fn generate(
        &self,
        topic_label: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<Vec<Question>>;
}

/// Builds the generation prompt sent to the model.
#[must_use]
pub fn build_prompt(topic_label: &str, difficulty: Difficulty, count: usize) -> String {
    format!(
        r#"Generate {count} multiple-choice questions.
Topic: {topic_label}
Difficulty: {difficulty}

Rules:
- 4 options per question
- One correct answer
- Return ONLY valid JSON
Format:
[
  {{
    "question": "",
    "options": ["", "", "", ""],
    "correctAnswer": ""
  }}
]
"#
    )
}

/// Shape of one question as the prompt asks the model to return it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedQuestion {
    question: String,
    options: Vec<String>,
    correct_answer: CorrectAnswer,
}

/// Parses and validates the model's message content.
///
/// Accepts a bare JSON array or one wrapped in a markdown code fence, and a
/// single object in place of a one-element array.
///
/// # Errors
///
/// Returns `GenerationFailed` with kind `EmptyResponse` for blank content
/// and `MalformedOutput` for anything that is not a list of well-formed
/// four-option questions.
pub fn parse_generated_questions(content: &str, difficulty: Difficulty) -> Result<Vec<Question>> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(TutorError::generation_failed(
            GenerationErrorKind::EmptyResponse,
            "model returned no content",
        ));
    }

    let payload = CODE_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str().trim());

    let value: serde_json::Value = serde_json::from_str(payload).map_err(|e| {
        TutorError::generation_failed(
            GenerationErrorKind::MalformedOutput,
            format!("model output is not valid JSON: {e}"),
        )
    })?;

    let items = match value {
        serde_json::Value::Array(items) => items,
        object @ serde_json::Value::Object(_) => vec![object],
        other => {
            return Err(TutorError::generation_failed(
                GenerationErrorKind::MalformedOutput,
                format!("expected a JSON array of questions, got {other}"),
            ));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let generated: GeneratedQuestion = serde_json::from_value(item).map_err(|e| {
                TutorError::generation_failed(
                    GenerationErrorKind::MalformedOutput,
                    format!("question {i}: {e}"),
                )
            })?;
            validate_generated(i, generated, difficulty)
        })
        .collect()
}

fn validate_generated(
    position: usize,
    generated: GeneratedQuestion,
    difficulty: Difficulty,
) -> Result<Question> {
    let malformed = |message: String| {
        TutorError::generation_failed(
            GenerationErrorKind::MalformedOutput,
            format!("question {position}: {message}"),
        )
    };

    if generated.question.trim().is_empty() {
        return Err(malformed("empty question text".to_string()));
    }
    if generated.options.len() != OPTIONS_PER_QUESTION {
        return Err(malformed(format!(
            "expected {OPTIONS_PER_QUESTION} options, got {}",
            generated.options.len()
        )));
    }
    if generated.correct_answer.resolve(&generated.options).is_none() {
        return Err(malformed(format!(
            "correct answer {:?} does not match any option",
            generated.correct_answer
        )));
    }

    Ok(Question {
        text: generated.question,
        options: generated.options,
        correct_answer: generated.correct_answer,
        difficulty: Some(difficulty),
    })
}

/// Maps a non-success HTTP status to a generation failure kind.
#[must_use]
pub fn classify_status(status: StatusCode) -> GenerationErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationErrorKind::Authentication,
        StatusCode::TOO_MANY_REQUESTS => GenerationErrorKind::RateLimit,
        s if s.is_server_error() => GenerationErrorKind::Server,
        _ => GenerationErrorKind::Other,
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// [`QuestionGenerator`] backed by an OpenAI-compatible chat-completion API.
#[derive(Clone)]
pub struct ChatCompletionGenerator {
    http: reqwest::Client,
    settings: LlmSettings,
    api_key: Option<String>,
}

impl std::fmt::Debug for ChatCompletionGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionGenerator")
            .field("settings", &self.settings)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl ChatCompletionGenerator {
    /// Creates a generator for the given settings.
    ///
    /// A missing `api_key` is allowed so the server can start without one;
    /// every generation attempt then fails with an authentication error.
    ///
    /// # Errors
    ///
    /// Returns `GenerationFailed` if the HTTP client cannot be built.
    pub fn new(settings: LlmSettings, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| TutorError::generation_failed(GenerationErrorKind::Other, e.to_string()))?;

        if api_key.is_none() {
            warn!(
                env = %settings.api_key_env,
                "No API key configured; question generation will fail"
            );
        }

        Ok(Self {
            http,
            settings,
            api_key,
        })
    }

    /// Returns the settings this generator was built with.
    #[must_use]
    pub const fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    async fn complete(&self, prompt: &str) -> Result<Option<String>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(TutorError::generation_failed(
                GenerationErrorKind::Authentication,
                format!(
                    "environment variable {} is not set",
                    self.settings.api_key_env
                ),
            ));
        };

        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
        };

        let response = self
            .http
            .post(&self.settings.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TutorError::generation_failed(GenerationErrorKind::Network, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TutorError::generation_failed(
                classify_status(status),
                format!("HTTP {status}: {body}"),
            ));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            TutorError::generation_failed(
                GenerationErrorKind::MalformedOutput,
                format!("unreadable completion response: {e}"),
            )
        })?;

        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

#[async_trait]
impl QuestionGenerator for ChatCompletionGenerator {
    async fn generate(
        &self,
        topic_label: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<Vec<Question>> {
        info!(topic = %topic_label, %difficulty, count, model = %self.settings.model, "Generating questions");

        let prompt = build_prompt(topic_label, difficulty, count);
        let content = self.complete(&prompt).await?.unwrap_or_default();
        debug!(content_len = content.len(), "Completion received");

        let questions = parse_generated_questions(&content, difficulty)?;
        if questions.is_empty() {
            return Err(TutorError::generation_failed(
                GenerationErrorKind::EmptyResponse,
                format!("model returned an empty question list for '{topic_label}'"),
            ));
        }
        if questions.len() != count {
            warn!(
                requested = count,
                received = questions.len(),
                "Model returned a different number of questions than requested"
            );
        }
        Ok(questions)
    }
}
