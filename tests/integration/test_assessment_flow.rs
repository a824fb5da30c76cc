//! End-to-end assessment walks.
//!
//! A learner works through a topic over HTTP: authored questions first,
//! then generated ones whose difficulty follows the correct-answer streak,
//! with tutor replies along the way.

mod common;

use common::{spawn_stack, spawn_stub_llm, spawn_tutor, test_config, StubMode, TEST_API_KEY};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tutor_engine::{AssessmentState, REASON_MAX_QUESTIONS};

async fn next_question(base: &str, state: &AssessmentState) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}/api/assessment/next-question"))
        .json(state)
        .send()
        .await
        .expect("Request failed");
    let status = response.status();
    let body = response.json().await.expect("Body is not JSON");
    (status, body)
}

async fn tutor_reply(base: &str, state: &AssessmentState, last_answer_correct: bool) -> Value {
    let response = reqwest::Client::new()
        .post(format!("{base}/api/tutor/respond"))
        .json(&json!({
            "domain": state.domain,
            "topic": state.topic,
            "level": state.difficulty().as_str(),
            "correctStreak": state.correct_streak,
            "lastAnswerCorrect": last_answer_correct
        }))
        .send()
        .await
        .expect("Request failed");
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.expect("Body is not JSON")
}

/// Tests a full walk: three authored questions, then generated ones that
/// get harder while the learner keeps answering correctly.
#[tokio::test]
async fn test_walk_authored_then_generated() {
    let (base, stub) = spawn_stack(StubMode::Questions).await;
    let mut state = AssessmentState::new("Mathematics", "Arithmetic");

    // Authored questions come back verbatim, in file order
    for expected_id in 1..=3 {
        let (status, body) = next_question(&base, &state).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["done"], false);
        assert_eq!(body["question"]["id"], expected_id);
        assert!(body["question"]["answer"].is_u64());
        assert_eq!(body["total"], 3);
        state = state.advance(true);
    }
    assert_eq!(stub.calls(), 0);

    // Streak is 3 by now
    let (status, body) = next_question(&base, &state).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], 3);
    assert_eq!(body["total"], 4);
    assert_eq!(
        body["question"]["question"],
        "Mathematics - Arithmetic [advanced] #0"
    );
    assert_eq!(stub.calls(), 1);

    // A wrong answer drops generation back to beginner
    state = state.advance(false);
    let (_, body) = next_question(&base, &state).await;
    assert_eq!(body["index"], 4);
    assert_eq!(body["total"], 5);
    assert_eq!(
        body["question"]["question"],
        "Mathematics - Arithmetic [beginner] #0"
    );

    state = state.advance(true);
    let (_, body) = next_question(&base, &state).await;
    assert_eq!(
        body["question"]["question"],
        "Mathematics - Arithmetic [intermediate] #0"
    );
    assert_eq!(stub.calls(), 3);
}

/// Tests that the GET form carries the same state in the query string.
#[tokio::test]
async fn test_query_and_body_forms_agree() {
    let (base, _) = spawn_stack(StubMode::Questions).await;

    let (status, from_query) = {
        let response = reqwest::get(format!(
            "{base}/api/assessment/next-question?domain=Programming&topic=Basics&index=1&correctStreak=1"
        ))
        .await
        .expect("Request failed");
        (
            response.status(),
            response.json::<Value>().await.expect("Body is not JSON"),
        )
    };
    assert_eq!(status, StatusCode::OK);

    let state = AssessmentState {
        index: 1,
        correct_streak: 1,
        ..AssessmentState::new("Programming", "Basics")
    };
    let (_, from_body) = next_question(&base, &state).await;

    assert_eq!(from_query, from_body);
    assert_eq!(from_query["question"]["id"], 7);
}

/// Tests that a configured limit ends the assessment without generating.
#[tokio::test]
async fn test_configured_limit_ends_assessment() {
    let (api_url, stub) = spawn_stub_llm(StubMode::Questions).await;
    let mut config = test_config(&api_url);
    config.assessment.max_questions = Some(4);
    let base = spawn_tutor(config, Some(TEST_API_KEY)).await;

    let mut state = AssessmentState::new("Mathematics", "Arithmetic");
    let mut served = 0;
    loop {
        let (status, body) = next_question(&base, &state).await;
        assert_eq!(status, StatusCode::OK);
        if body["done"] == true {
            assert_eq!(
                body,
                json!({"done": true, "total": 4, "reason": REASON_MAX_QUESTIONS})
            );
            break;
        }
        served += 1;
        assert!(served <= 4, "assessment did not stop");
        state = state.advance(true);
    }

    assert_eq!(served, 4);
    assert_eq!(stub.calls(), 1);
}

/// Tests that a request-level limit overrides the configured one.
#[tokio::test]
async fn test_request_limit_overrides_config() {
    let (api_url, stub) = spawn_stub_llm(StubMode::Questions).await;
    let mut config = test_config(&api_url);
    config.assessment.max_questions = Some(4);
    let base = spawn_tutor(config, Some(TEST_API_KEY)).await;

    let state = AssessmentState {
        index: 4,
        max_questions: Some(10),
        ..AssessmentState::new("Mathematics", "Arithmetic")
    };
    let (status, body) = next_question(&base, &state).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["done"], false);
    assert_eq!(stub.calls(), 1);
}

/// Tests that a topic with no authored questions goes straight to
/// generation, and that a generation failure ends the request with a 500.
#[tokio::test]
async fn test_unknown_topic_generates_or_fails() {
    let (base, _) = spawn_stack(StubMode::Questions).await;
    let state = AssessmentState::new("History", "Rome");
    let (status, body) = next_question(&base, &state).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["index"], 0);
    assert_eq!(body["total"], 1);

    let (base, _) = spawn_stack(StubMode::Unavailable).await;
    let (status, body) = next_question(&base, &state).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "AI generation failed"}));
}

/// Tests the tutor's tone as a learner's streak builds and breaks.
#[tokio::test]
async fn test_tutor_tone_follows_the_walk() {
    let (base, _) = spawn_stack(StubMode::Questions).await;
    let state = AssessmentState::new("Programming", "Basics");

    let reply = tutor_reply(&base, &state, true).await;
    assert_eq!(reply["tone"], "neutral");
    assert!(reply.get("hint").is_none());

    let state = state.advance(true).advance(true);
    let reply = tutor_reply(&base, &state, true).await;
    assert_eq!(reply["tone"], "challenging");
    assert!(reply.get("hint").is_none());

    let state = state.advance(false);
    let reply = tutor_reply(&base, &state, false).await;
    assert_eq!(reply["tone"], "supportive");
    assert_eq!(reply["hint"], "Think about what each line of code is doing.");
}
