//! Shared helpers for the integration tests.
//!
//! Spawns the tutor API on a free port with a real
//! `ChatCompletionGenerator` pointed at a local stand-in for the
//! chat-completion service.

#![allow(dead_code)]

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use tutor_engine::{create_router, AppState, ChatCompletionGenerator, Config};

/// API key the stand-in service accepts.
pub const TEST_API_KEY: &str = "test-key";

/// How the stand-in chat-completion service answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubMode {
    /// Well-formed questions echoing the prompt's topic and difficulty.
    Questions,
    /// The same questions wrapped in a markdown code fence.
    Fenced,
    /// A completion whose content is blank.
    Empty,
    /// A completion whose content is an empty JSON array.
    EmptyList,
    /// A completion whose content is not JSON.
    Garbage,
    /// HTTP 503.
    Unavailable,
}

/// State of the stand-in chat-completion service.
#[derive(Debug)]
pub struct StubLlm {
    mode: StubMode,
    calls: AtomicUsize,
}

impl StubLlm {
    /// Number of completion requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Helper to find an available port for testing.
pub fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Path to the bundled content directory.
pub fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.join("data"))
        .expect("Failed to find data directory")
}

/// Path to the integration fixtures.
pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Reads a `Key: value` line from the generation prompt.
fn prompt_field<'a>(prompt: &'a str, key: &str) -> &'a str {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix(key))
        .map_or("", str::trim)
}

/// Requested count from the prompt's first line.
fn prompt_count(prompt: &str) -> usize {
    prompt
        .strip_prefix("Generate ")
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(1)
}

async fn stub_completion(
    State(stub): State<Arc<StubLlm>>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    stub.calls.fetch_add(1, Ordering::SeqCst);

    let expected = format!("Bearer {TEST_API_KEY}");
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
    }

    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
    let topic = prompt_field(prompt, "Topic:");
    let difficulty = prompt_field(prompt, "Difficulty:");

    let questions: Vec<serde_json::Value> = (0..prompt_count(prompt))
        .map(|i| {
            serde_json::json!({
                "question": format!("{topic} [{difficulty}] #{i}"),
                "options": ["A", "B", "C", "D"],
                "correctAnswer": "B"
            })
        })
        .collect();
    let questions = serde_json::Value::Array(questions).to_string();

    let content = match stub.mode {
        StubMode::Questions => questions,
        StubMode::Fenced => format!("```json\n{questions}\n```"),
        StubMode::Empty => String::new(),
        StubMode::EmptyList => "[]".to_string(),
        StubMode::Garbage => "Sure! Here are some questions.".to_string(),
        StubMode::Unavailable => {
            return (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response();
        }
    };

    Json(serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    }))
    .into_response()
}

/// Spawns the stand-in chat-completion service and returns its endpoint URL.
pub async fn spawn_stub_llm(mode: StubMode) -> (String, Arc<StubLlm>) {
    let stub = Arc::new(StubLlm {
        mode,
        calls: AtomicUsize::new(0),
    });
    let router = Router::new()
        .route("/v1/chat/completions", post(stub_completion))
        .with_state(Arc::clone(&stub));

    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Stub server failed");
    });

    (format!("http://{addr}/v1/chat/completions"), stub)
}

/// Configuration pointing at the bundled data and the given endpoint.
pub fn test_config(api_url: &str) -> Config {
    let mut config = Config {
        data_dir: data_dir().to_string_lossy().into_owned(),
        ..Config::default()
    };
    config.llm.api_url = api_url.to_string();
    config.llm.model = "test-model".to_string();
    config.llm.timeout_seconds = 5;
    config
}

/// Spawns the tutor API with `config` and returns its base URL.
pub async fn spawn_tutor(config: Config, api_key: Option<&str>) -> String {
    let generator = ChatCompletionGenerator::new(config.llm.clone(), api_key.map(String::from))
        .expect("Failed to build generator");
    let state = AppState::new(config, Arc::new(generator));
    let router = create_router(state);

    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    // Give the server a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://{addr}")
}

/// Spawns a stand-in service in `mode` and a tutor API wired to it.
pub async fn spawn_stack(mode: StubMode) -> (String, Arc<StubLlm>) {
    let (api_url, stub) = spawn_stub_llm(mode).await;
    let base = spawn_tutor(test_config(&api_url), Some(TEST_API_KEY)).await;
    (base, stub)
}
