//! HTTP API for the tutor backend.
//!
//! Marshals JSON requests into the content store, the assessment sequencer,
//! the question generator and the tutor response selector.
//!
//! # Endpoints
//!
//! - `GET /health` - Liveness check
//! - `GET /api/domains` - List domains
//! - `GET /api/topics?domain=` and `GET /api/topics/:domain` - List topics
//! - `GET /api/questions?domain=&topic=&limit=` - List authored questions
//! - `GET /api/questions/:id` - Fetch one authored question
//! - `POST /api/assessment/ai-questions` - Generate questions directly
//! - `GET|POST /api/assessment/next-question` - Next question for an assessment
//! - `GET /api/tutor/health` - Tutor liveness check
//! - `POST /api/tutor/respond` - Tutor reply to a learner message
//! - `GET /api/tutor/tip?domain=&level=` - Study tip
//!
//! # Example
//!
//! ```no_run
//! use tutor_engine::{create_router, AppState, Config};
//!
//! # async fn example() -> tutor_engine::Result<()> {
//! let state = AppState::from_config(Config::default())?;
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use crate::{
    assessment::{select_next_question, AssessmentState, NextQuestion},
    content::{ContentStore, Domain, QuestionFilter, Topic},
    generator::{ChatCompletionGenerator, QuestionGenerator},
    question::{AuthoredQuestion, Difficulty, Question},
    tutor::{contextual_tip, generate_tutor_response, HintTable, TutorContext, TutorResponse},
    Config, TutorError,
};

/// Largest `count` accepted by the direct generation endpoint.
pub const MAX_GENERATED_QUESTIONS: usize = 20;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Liveness response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
}

impl HealthResponse {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Query string for the topic list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicQuery {
    /// Keep only topics of this domain.
    pub domain: Option<String>,
}

/// Request body for direct question generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiQuestionsRequest {
    /// Topic to generate questions about.
    pub topic: String,
    /// Optional domain; prefixed to the topic label when present.
    #[serde(default)]
    pub domain: Option<String>,
    /// Requested difficulty.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Number of questions; defaults to 1.
    #[serde(default)]
    pub count: Option<usize>,
}

impl AiQuestionsRequest {
    /// Topic label sent to the generator.
    fn topic_label(&self) -> String {
        match self.domain.as_deref().filter(|d| !d.is_empty()) {
            Some(domain) => format!("{domain} - {}", self.topic),
            None => self.topic.clone(),
        }
    }
}

/// Request body for the tutor endpoint.
///
/// Every field is optional at the wire level so that missing context can be
/// answered with a 400 and a readable message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorRequest {
    /// The learner's message; may be empty.
    #[serde(default)]
    pub message: Option<String>,
    /// Domain being studied.
    #[serde(default)]
    pub domain: Option<String>,
    /// Topic being studied.
    #[serde(default)]
    pub topic: Option<String>,
    /// Learner level.
    #[serde(default)]
    pub level: Option<String>,
    /// Consecutive correct answers.
    #[serde(default)]
    pub correct_streak: Option<u32>,
    /// Whether the last answer was correct.
    #[serde(default)]
    pub last_answer_correct: Option<bool>,
}

impl TutorRequest {
    /// Splits the request into the learner message and a validated context.
    ///
    /// # Errors
    ///
    /// Returns `TutorError::Validation` when domain, topic or level is
    /// missing or empty. Whitespace-only values are accepted as given.
    pub fn into_parts(self) -> crate::Result<(String, TutorContext)> {
        let required = |field: Option<String>| field.filter(|v| !v.is_empty());
        let (Some(domain), Some(topic), Some(level)) = (
            required(self.domain),
            required(self.topic),
            required(self.level),
        ) else {
            return Err(TutorError::validation("domain, topic and level required"));
        };

        Ok((
            self.message.unwrap_or_default(),
            TutorContext {
                domain,
                topic,
                level,
                correct_streak: self.correct_streak.unwrap_or(0),
                last_answer_correct: self.last_answer_correct,
            },
        ))
    }
}

/// Query string for the tip endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TipQuery {
    /// Domain for the tip.
    #[serde(default)]
    pub domain: Option<String>,
    /// Learner level for the tip.
    #[serde(default)]
    pub level: Option<String>,
}

/// Response body for the tip endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TipResponse {
    /// The study tip.
    pub tip: String,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared, read-only application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the backend.
    pub config: Config,
    /// Static content documents.
    pub content: ContentStore,
    /// Concept hints for tutor responses.
    pub hints: HintTable,
    /// Source of generated questions.
    pub generator: Arc<dyn QuestionGenerator>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("content", &self.content)
            .field("hints", &self.hints.len())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Creates a new `AppState` with the given configuration and generator.
    ///
    /// Content is read from `config.data_dir` and the built-in hint table
    /// is used.
    #[must_use]
    pub fn new(config: Config, generator: Arc<dyn QuestionGenerator>) -> Self {
        Self {
            content: ContentStore::new(&config.data_dir),
            config,
            hints: HintTable::default(),
            generator,
        }
    }

    /// Creates an `AppState` whose generator calls the configured
    /// chat-completion API with the key from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: Config) -> crate::Result<Self> {
        let generator = ChatCompletionGenerator::new(config.llm.clone(), config.api_key())?;
        Ok(Self::new(config, Arc::new(generator)))
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The request is missing or has invalid fields.
    BadRequest(String),
    /// The requested record does not exist.
    NotFound(String),
    /// Anything else; the message is generic, details go to the log.
    Internal(String),
}

impl ApiError {
    /// Logs `err` and hides it behind a route-specific message.
    fn internal(public_message: &str, err: &TutorError) -> Self {
        error!(error = %err, "{public_message}");
        Self::Internal(public_message.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Creates the HTTP router with all API endpoints.
///
/// The router carries:
/// - `/health` plus all API routes under `/api`
/// - CORS middleware allowing any origin for the browser frontend
/// - Tracing middleware for request logging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/domains", get(handle_domains))
        .route("/topics", get(handle_topics))
        .route("/topics/:domain", get(handle_topics_for_domain))
        .route("/questions", get(handle_questions))
        .route("/questions/:id", get(handle_question))
        .route("/assessment/ai-questions", post(handle_ai_questions))
        .route(
            "/assessment/next-question",
            get(handle_next_question_query).post(handle_next_question_body),
        )
        .route("/tutor/health", get(handle_health))
        .route("/tutor/respond", post(handle_tutor_respond))
        .route("/tutor/tip", get(handle_tutor_tip));

    Router::new()
        .route("/health", get(handle_health))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

/// Handler for `GET /health` and `GET /api/tutor/health`.
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Handler for `GET /api/domains`.
async fn handle_domains(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Domain>>, ApiError> {
    let domains = state
        .content
        .domains()
        .await
        .map_err(|e| ApiError::internal("failed to read domains", &e))?;
    Ok(Json(domains))
}

/// Handler for `GET /api/topics`.
async fn handle_topics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TopicQuery>,
) -> Result<Json<Vec<Topic>>, ApiError> {
    list_topics(&state, query.domain.as_deref()).await
}

/// Handler for `GET /api/topics/:domain`.
async fn handle_topics_for_domain(
    State(state): State<Arc<AppState>>,
    Path(domain): Path<String>,
) -> Result<Json<Vec<Topic>>, ApiError> {
    list_topics(&state, Some(&domain)).await
}

async fn list_topics(state: &AppState, domain: Option<&str>) -> Result<Json<Vec<Topic>>, ApiError> {
    let topics = state
        .content
        .topics(domain)
        .await
        .map_err(|e| ApiError::internal("failed to read topics", &e))?;
    Ok(Json(topics))
}

/// Handler for `GET /api/questions`.
async fn handle_questions(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<QuestionFilter>,
) -> Result<Json<Vec<AuthoredQuestion>>, ApiError> {
    let questions = state
        .content
        .questions(&filter)
        .await
        .map_err(|e| ApiError::internal("failed to read questions", &e))?;
    Ok(Json(questions))
}

/// Handler for `GET /api/questions/:id`.
async fn handle_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AuthoredQuestion>, ApiError> {
    match state.content.question(&id).await {
        Ok(question) => Ok(Json(question)),
        Err(TutorError::ContentNotFound { name }) if name.starts_with("question ") => {
            warn!(id = %id, "Question not found");
            Err(ApiError::NotFound("question not found".to_string()))
        }
        Err(e) => Err(ApiError::internal("failed to read questions", &e)),
    }
}

/// Handler for `POST /api/assessment/ai-questions`.
async fn handle_ai_questions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AiQuestionsRequest>,
) -> Result<Json<Vec<Question>>, ApiError> {
    if request.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("topic required".to_string()));
    }
    let count = request.count.unwrap_or(1);
    if !(1..=MAX_GENERATED_QUESTIONS).contains(&count) {
        return Err(ApiError::BadRequest(format!(
            "count must be between 1 and {MAX_GENERATED_QUESTIONS}"
        )));
    }

    let label = request.topic_label();
    let questions = state
        .generator
        .generate(&label, request.difficulty, count)
        .await
        .map_err(|e| ApiError::internal("AI generation failed", &e))?;

    info!(topic = %label, count = questions.len(), "Generated questions");
    Ok(Json(questions))
}

/// Handler for `GET /api/assessment/next-question`.
async fn handle_next_question_query(
    State(state): State<Arc<AppState>>,
    Query(assessment): Query<AssessmentState>,
) -> Result<Json<NextQuestion>, ApiError> {
    next_question(&state, assessment).await
}

/// Handler for `POST /api/assessment/next-question`.
async fn handle_next_question_body(
    State(state): State<Arc<AppState>>,
    Json(assessment): Json<AssessmentState>,
) -> Result<Json<NextQuestion>, ApiError> {
    next_question(&state, assessment).await
}

async fn next_question(
    state: &AppState,
    mut assessment: AssessmentState,
) -> Result<Json<NextQuestion>, ApiError> {
    if assessment.domain.trim().is_empty() || assessment.topic.trim().is_empty() {
        return Err(ApiError::BadRequest("domain and topic required".to_string()));
    }
    if assessment.max_questions == Some(0) {
        return Err(ApiError::BadRequest(
            "maxQuestions must be greater than 0".to_string(),
        ));
    }
    if assessment.max_questions.is_none() {
        assessment.max_questions = state.config.assessment.max_questions;
    }

    let existing = state
        .content
        .questions(&QuestionFilter::for_topic(
            assessment.domain.as_str(),
            assessment.topic.as_str(),
        ))
        .await
        .map_err(|e| ApiError::internal("failed to read questions", &e))?;

    let next = select_next_question(&existing, &assessment, state.generator.as_ref())
        .await
        .map_err(|e| ApiError::internal("AI generation failed", &e))?;

    info!(
        domain = %assessment.domain,
        topic = %assessment.topic,
        index = assessment.index,
        done = next.done,
        total = next.total,
        "Next question selected"
    );
    Ok(Json(next))
}

/// Handler for `POST /api/tutor/respond`.
async fn handle_tutor_respond(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TutorRequest>,
) -> Result<Json<TutorResponse>, ApiError> {
    let (message, context) = request.into_parts().map_err(|e| {
        warn!(error = %e, "Rejected tutor request");
        ApiError::BadRequest(e.to_string())
    })?;

    let response = generate_tutor_response(&message, &context, &state.hints);
    info!(
        domain = %context.domain,
        topic = %context.topic,
        tone = %response.tone,
        hint = response.hint.is_some(),
        "Tutor response composed"
    );
    Ok(Json(response))
}

/// Handler for `GET /api/tutor/tip`.
async fn handle_tutor_tip(Query(query): Query<TipQuery>) -> Json<TipResponse> {
    let tip = contextual_tip(
        query.domain.as_deref().unwrap_or_default(),
        query.level.as_deref().unwrap_or_default(),
    );
    Json(TipResponse {
        tip: tip.to_string(),
    })
}

// ============================================================================
// Tests
// ============================================================================
