//! REST API server — expose Fitholic chat and voice over HTTP.
//!
//! Endpoints:
//! - GET  /v1/health — Health check
//! - GET  /v1/status — Provider, tools, speech support, metrics
//! - POST /v1/chat/sessions — Create a chat session
//! - GET  /v1/chat/sessions/active?user_id= — Get or create the active session
//! - GET  /v1/chat/sessions/{id}/messages?limit= — Message history
//! - POST /v1/chat/sessions/{id}/messages — Send a message
//! - PUT  /v1/chat/sessions/{id}/profile — Store the user profile context
//! - POST /v1/voice/command?user_id= — Raw audio voice command
//! - POST /v1/voice/text — Already-transcribed voice command
//! - GET  /v1/voice/session?user_id= — Ongoing workout log
//! - POST /v1/voice/session/start — Start (or resume) a workout
//! - POST /v1/voice/session/end — Complete the ongoing workout

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};

use fitholic_core::chat::{ChatService, HISTORY_LIMIT, PROFILE_CONTEXT};
use fitholic_core::dialogue::TurnResult;
use fitholic_core::error::FitholicError;
use fitholic_core::memory::ChatSession;
use fitholic_core::message::HistoryEntry;
use fitholic_core::voice::{VoiceProcessor, VoiceResponse};
use fitholic_core::workout::WorkoutLog;

use crate::app::Services;
use crate::metrics::{SharedMetrics, new_metrics};
use crate::middleware::{RateLimiter, auth_middleware, logging_middleware, rate_limit_middleware};

/// Largest accepted audio upload.
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Shared API state.
pub struct ApiState {
    pub chat: Arc<ChatService>,
    pub voice: Arc<VoiceProcessor>,
    pub metrics: SharedMetrics,
    pub provider: String,
    pub model: String,
    /// Required bearer token; `None` leaves the API open.
    pub api_key: Option<String>,
    pub rate_limiter: RateLimiter,
}

pub type SharedState = Arc<ApiState>;

impl ApiState {
    pub fn new(services: &Services, api_key: Option<String>) -> Self {
        Self {
            chat: services.chat.clone(),
            voice: services.voice.clone(),
            metrics: new_metrics(),
            provider: services.provider_name.clone(),
            model: services.model.clone(),
            api_key,
            rate_limiter: RateLimiter::default(),
        }
    }
}

// ─── Errors ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler error carrying the status it maps to.
pub struct ApiError(FitholicError);

impl From<FitholicError> for ApiError {
    fn from(e: FitholicError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            FitholicError::Validation(_)
            | FitholicError::InvalidArguments { .. }
            | FitholicError::NoActiveSession => StatusCode::BAD_REQUEST,
            FitholicError::NotFound(_) | FitholicError::ToolNotFound(_) => StatusCode::NOT_FOUND,
            FitholicError::InvalidTransition { .. } => StatusCode::CONFLICT,
            FitholicError::Provider(_)
            | FitholicError::Speech(_)
            | FitholicError::Network(_)
            | FitholicError::Timeout(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ─── Request/Response types ────────────────────────────────

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct CreateSessionRequest {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    HISTORY_LIMIT
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub messages: Vec<HistoryEntry>,
    pub count: usize,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

#[derive(Deserialize)]
pub struct TextCommandRequest {
    pub user_id: String,
    pub text: String,
}

#[derive(Deserialize)]
pub struct StartSessionRequest {
    pub user_id: String,
    #[serde(default)]
    pub template_id: Option<String>,
}

#[derive(Deserialize)]
pub struct EndSessionRequest {
    pub user_id: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub status: String,
    pub provider: String,
    pub model: String,
    pub tools: Vec<String>,
    pub speech_input: bool,
    pub speech_output: bool,
    pub metrics: Value,
}

// ─── Handlers ──────────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn status(State(state): State<SharedState>) -> Json<StatusResponse> {
    let tools = state
        .voice
        .tools()
        .names()
        .iter()
        .map(|t| t.to_string())
        .collect();

    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        provider: state.provider.clone(),
        model: state.model.clone(),
        tools,
        speech_input: state.voice.has_speech_input(),
        speech_output: state.voice.has_speech_output(),
        metrics: state.metrics.to_json(),
    })
}

async fn create_session(
    State(state): State<SharedState>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<ChatSession> {
    Ok(Json(state.chat.create_session(&req.user_id).await?))
}

async fn active_session(
    State(state): State<SharedState>,
    Query(q): Query<UserQuery>,
) -> ApiResult<ChatSession> {
    Ok(Json(state.chat.active_session(&q.user_id).await?))
}

async fn history(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> ApiResult<HistoryResponse> {
    let messages = state.chat.history(&session_id, q.limit).await?;
    Ok(Json(HistoryResponse {
        session_id,
        count: messages.len(),
        messages,
    }))
}

async fn send_message(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> ApiResult<TurnResult> {
    let result = state.chat.send_message(&session_id, &req.message).await?;
    state.metrics.record_chat_turn();
    Ok(Json(result))
}

async fn set_profile(
    State(state): State<SharedState>,
    Path(session_id): Path<String>,
    Json(profile): Json<Map<String, Value>>,
) -> ApiResult<Value> {
    let sessions = state.chat.sessions();
    if sessions.get_session(&session_id).await?.is_none() {
        return Err(FitholicError::NotFound(format!("Chat session {}", session_id)).into());
    }
    sessions
        .set_context(&session_id, PROFILE_CONTEXT, &Value::Object(profile))
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn voice_command(
    State(state): State<SharedState>,
    Query(q): Query<UserQuery>,
    audio: Bytes,
) -> ApiResult<VoiceResponse> {
    let response = state.voice.process_voice_command(&q.user_id, &audio).await?;
    state.metrics.record_voice_command(response.error.is_some());
    Ok(Json(response))
}

async fn voice_text(
    State(state): State<SharedState>,
    Json(req): Json<TextCommandRequest>,
) -> ApiResult<VoiceResponse> {
    let response = state.voice.process_text_command(&req.user_id, &req.text).await?;
    state.metrics.record_voice_command(response.error.is_some());
    Ok(Json(response))
}

async fn current_session(
    State(state): State<SharedState>,
    Query(q): Query<UserQuery>,
) -> ApiResult<WorkoutLog> {
    state
        .voice
        .ongoing_log(&q.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| FitholicError::NoActiveSession.into())
}

async fn start_session(
    State(state): State<SharedState>,
    Json(req): Json<StartSessionRequest>,
) -> ApiResult<WorkoutLog> {
    let log = state
        .voice
        .start_session(&req.user_id, req.template_id.as_deref())
        .await?;
    state.metrics.record_session_started();
    Ok(Json(log))
}

async fn end_session(
    State(state): State<SharedState>,
    Json(req): Json<EndSessionRequest>,
) -> ApiResult<WorkoutLog> {
    let log = state.voice.end_session(&req.user_id, req.notes).await?;
    state.metrics.record_session_completed();
    Ok(Json(log))
}

// ─── Server builder ────────────────────────────────────────

/// Build the API router. Health stays outside auth and rate limiting.
pub fn build_router(state: SharedState) -> Router {
    let protected = Router::new()
        .route("/v1/status", get(status))
        .route("/v1/chat/sessions", post(create_session))
        .route("/v1/chat/sessions/active", get(active_session))
        .route(
            "/v1/chat/sessions/{id}/messages",
            get(history).post(send_message),
        )
        .route("/v1/chat/sessions/{id}/profile", put(set_profile))
        .route("/v1/voice/command", post(voice_command))
        .route("/v1/voice/text", post(voice_text))
        .route("/v1/voice/session", get(current_session))
        .route("/v1/voice/session/start", post(start_session))
        .route("/v1/voice/session/end", post(end_session))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .route("/v1/health", get(health))
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            logging_middleware,
        ))
        .with_state(state)
}

/// Start the API server.
pub async fn start_server(state: ApiState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("🌐 API server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
