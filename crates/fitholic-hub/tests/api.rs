//! REST API tests driving the router in-process.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use fitholic_core::config::FitholicConfig;
use fitholic_core::error::{FitholicError, Result};
use fitholic_core::message::{LlmResponse, TokenUsage};
use fitholic_core::provider::{ChatRequest, LlmProvider};
use fitholic_core::retry::RetryPolicy;
use fitholic_core::store::{ExerciseStore, WorkoutTemplateStore};
use fitholic_core::workout::{Exercise, TemplateExercise, WorkoutTemplate};
use fitholic_hub::api::{ApiState, build_router};
use fitholic_hub::app::Services;
use fitholic_hub::memory::SqliteStore;

struct Scripted(Mutex<VecDeque<String>>);

#[async_trait]
impl LlmProvider for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    async fn chat(&self, _request: ChatRequest) -> Result<LlmResponse> {
        let next = self.0.lock().unwrap().pop_front();
        match next {
            Some(content) => Ok(LlmResponse {
                content: Some(content),
                model: "scripted-model".into(),
                usage: TokenUsage::default(),
                finish_reason: "stop".into(),
            }),
            None => Err(FitholicError::Provider("script exhausted".into())),
        }
    }
}

async fn app_with(replies: &[&str], api_key: Option<&str>) -> (Router, Arc<SqliteStore>) {
    let mut config = FitholicConfig::default();
    config.retry = RetryPolicy::no_retry();
    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let provider = Arc::new(Scripted(Mutex::new(
        replies.iter().map(|r| r.to_string()).collect(),
    )));
    let services = Services::with_provider(&config, store.clone(), provider).unwrap();
    let state = ApiState::new(&services, api_key.map(str::to_string));
    (build_router(Arc::new(state)), store)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn seed_template(store: &SqliteStore, sets: u32) {
    let mut squat = Exercise::new("Back Squat");
    squat.exercise_id = "squat".into();
    ExerciseStore::create(store, &squat).await.unwrap();
    let template = WorkoutTemplate {
        template_id: "legs".into(),
        user_id: Some("u1".into()),
        name: "Leg Day".into(),
        description: None,
        difficulty: "beginner".into(),
        duration: Some(30),
        exercises: vec![TemplateExercise {
            exercise_id: "squat".into(),
            sets,
            reps: 10,
            rest_time: 60,
        }],
    };
    WorkoutTemplateStore::create(store, &template).await.unwrap();
}

#[tokio::test]
async fn health_is_open_even_with_api_key() {
    let (app, _) = app_with(&[], Some("secret")).await;
    let (status, body) = send(&app, "GET", "/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_api_key() {
    let (app, _) = app_with(&[], Some("secret")).await;
    let (status, _) = send(&app, "GET", "/v1/status", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/v1/status")
        .header("authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn status_lists_voice_tools() {
    let (app, _) = app_with(&[], None).await;
    let (status, body) = send(&app, "GET", "/v1/status", None).await;
    assert_eq!(status, StatusCode::OK);
    let tools = body["tools"].as_array().unwrap();
    assert!(tools.iter().any(|t| t == "log_set"));
    assert!(body["metrics"]["requests"]["total"].is_u64());
}

#[tokio::test]
async fn chat_flow_creates_exercise_over_two_turns() {
    let (app, _) = app_with(
        &[
            r#"{"type": "create_exercise", "confidence": 0.9, "parameters": {}}"#,
            r#"{"name": "Incline Push-Up", "description": "Push-up with hands elevated",
                "muscle_groups": ["chest"], "equipment": [], "difficulty": "beginner",
                "instructions": "Lower your chest to the bench."}"#,
        ],
        None,
    )
    .await;

    let (status, session) = send(&app, "POST", "/v1/chat/sessions", Some(json!({"user_id": "u1"}))).await;
    assert_eq!(status, StatusCode::OK);
    let id = session["session_id"].as_str().unwrap().to_string();
    let uri = format!("/v1/chat/sessions/{}/messages", id);

    let (_, first) = send(&app, "POST", &uri, Some(json!({"message": "create a new exercise"}))).await;
    assert_eq!(first["current_state"], "gathering_requirements");

    let (_, second) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"message": "strength exercise for chest"})),
    )
    .await;
    assert_eq!(second["current_state"], "exercise_created");
    assert_eq!(second["created_exercise"]["name"], "Incline Push-Up");

    let (status, history) = send(&app, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["count"], 4);
}

#[tokio::test]
async fn unknown_chat_session_is_not_found() {
    let (app, _) = app_with(&[], None).await;
    let (status, body) = send(
        &app,
        "POST",
        "/v1/chat/sessions/missing/messages",
        Some(json!({"message": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn voice_text_without_session_is_rejected() {
    let (app, _) = app_with(&[], None).await;
    let (status, body) = send(
        &app,
        "POST",
        "/v1/voice/text",
        Some(json!({"user_id": "u1", "text": "next exercise"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No active workout session found");
}

#[tokio::test]
async fn voice_session_lifecycle() {
    let (app, store) = app_with(&["Nice set, that's the squat done."], None).await;
    seed_template(&store, 1).await;

    let (status, log) = send(
        &app,
        "POST",
        "/v1/voice/session/start",
        Some(json!({"user_id": "u1", "template_id": "legs"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(log["status"], "ongoing");

    let (status, _) = send(&app, "POST", "/v1/voice/session/end", Some(json!({"user_id": "u1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, reply) = send(
        &app,
        "POST",
        "/v1/voice/text",
        Some(json!({"user_id": "u1", "text": "logged 10 reps at 135 pounds"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["command"]["type"], "log_set");
    assert_eq!(reply["command"]["result"]["exercise_completed"], true);
    assert_eq!(reply["response_text"], "Nice set, that's the squat done.");

    let (status, done) = send(
        &app,
        "POST",
        "/v1/voice/session/end",
        Some(json!({"user_id": "u1", "notes": "felt strong"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(done["status"], "completed");

    let (status, _) = send(&app, "GET", "/v1/voice/session?user_id=u1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn starting_from_unknown_template_is_not_found() {
    let (app, _) = app_with(&[], None).await;
    let (status, _) = send(
        &app,
        "POST",
        "/v1/voice/session/start",
        Some(json!({"user_id": "u1", "template_id": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
