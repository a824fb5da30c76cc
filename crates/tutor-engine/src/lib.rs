//! Adaptive Tutor Engine
//!
//! Sequences assessment questions, generates new ones through a language
//! model once the authored bank runs out, composes rule-based tutor replies,
//! and serves all of it over an HTTP API.

pub mod api;
pub mod assessment;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod question;
pub mod tutor;

pub use api::{
    create_router, AiQuestionsRequest, AppState, ErrorResponse, HealthResponse, TipQuery,
    TipResponse, TopicQuery, TutorRequest, MAX_GENERATED_QUESTIONS,
};
pub use assessment::{select_next_question, AssessmentState, NextQuestion, REASON_MAX_QUESTIONS};
pub use config::{AssessmentSettings, Config, LlmSettings};
pub use content::{ContentStore, Domain, QuestionFilter, Topic};
pub use error::{GenerationErrorKind, Result, TutorError};
pub use generator::{ChatCompletionGenerator, QuestionGenerator};
pub use question::{AuthoredQuestion, CorrectAnswer, Difficulty, Question, QuestionId};
pub use tutor::{
    contextual_tip, generate_tutor_response, HintTable, Tone, TutorContext, TutorResponse,
};
