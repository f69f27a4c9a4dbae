//! Façade request handlers

use super::error::ApiError;
use super::server::AppState;
use crate::output::formatter::{
    JsonLdFormatter, MarkdownFormatter, ReportFormat, ShortPostFormatter, VerdictFormatter,
};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use compass_application::{MetricsSink, RunJuryInput};
use compass_domain::{Model, Question};
use serde::Deserialize;
use uuid::Uuid;

/// Session binding header.
const SESSION_HEADER: &str = "X-Session-Id";

/// `POST /query` body
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    /// A missing field behaves as empty input and is rejected with a 400.
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub models: Option<Vec<String>>,
    #[serde(default)]
    pub format: Option<String>,
}

/// `POST /api/chat` body
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Option<Vec<HistoryTurn>>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

async fn ensure_active(state: &AppState) -> Result<(), ApiError> {
    let lifecycle = state.lifecycle.current().await;
    if !lifecycle.is_serving() {
        return Err(ApiError::Busy {
            state: lifecycle.as_str().to_string(),
        });
    }
    Ok(())
}

fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn parse_models(models: &[String]) -> Vec<Model> {
    models.iter().map(|m| m.parse().unwrap()).collect()
}

/// `POST /query` — run the jury and render the requested report format.
pub async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<QueryRequest>,
) -> Result<Response, ApiError> {
    state.metrics.record_request();
    ensure_active(&state).await?;

    let format: ReportFormat = request
        .format
        .as_deref()
        .unwrap_or("json")
        .parse()
        .map_err(|e| ApiError::BadRequest(format!("{e}")))?;

    let question = Question::try_new(request.question.as_str())
        .ok_or_else(|| ApiError::BadRequest("question must not be empty".to_string()))?;
    let mut input = RunJuryInput::new(question.clone());
    if let Some(context) = request.context {
        input = input.with_context(context);
    }
    if let Some(models) = &request.models {
        input = input.with_models(parse_models(models));
    }
    if let Some(session_id) = session_from_headers(&headers) {
        input = input.with_session(session_id);
    }

    let result = state.jury.execute(input).await?;

    Ok(match format {
        ReportFormat::Json => {
            Json(JsonLdFormatter.format_value(question.content(), &result)).into_response()
        }
        ReportFormat::Markdown => (
            [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
            MarkdownFormatter.format(&result),
        )
            .into_response(),
        ReportFormat::Twitter => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            ShortPostFormatter.format(&result),
        )
            .into_response(),
    })
}

/// `POST /api/chat` — chat-shaped wrapper over the jury pipeline.
///
/// Binds to the `X-Session-Id` header when present, otherwise mints a new
/// session so follow-up turns can build on this one.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatBody>,
) -> Result<Response, ApiError> {
    state.metrics.record_request();
    ensure_active(&state).await?;

    let session_id =
        session_from_headers(&headers).unwrap_or_else(|| Uuid::new_v4().to_string());

    let message = Question::try_new(body.message.as_str())
        .ok_or_else(|| ApiError::BadRequest("message must not be empty".to_string()))?;
    let mut input = RunJuryInput::new(message).with_session(session_id.clone());
    if let Some(history) = &body.history {
        if !history.is_empty() {
            let lines = history
                .iter()
                .map(|turn| format!("{}: {}", turn.role, turn.content))
                .collect::<Vec<_>>()
                .join("\n");
            input = input.with_context(lines);
        }
    }

    let result = state.jury.execute(input).await?;

    let model_answers: Vec<serde_json::Value> = result
        .successful_responses()
        .map(|r| serde_json::json!({"model": r.model, "answer": r.answer}))
        .collect();
    let failed_models: Vec<&str> = result
        .failed_responses()
        .map(|r| r.model.as_str())
        .collect();

    Ok(Json(serde_json::json!({
        "answer": result.representative_answer,
        "consensus": {
            "verdict": result.verdict.as_str(),
            "confidence": result.confidence.as_str(),
            "agreementScore": result.agreement_score,
        },
        "modelAnswers": model_answers,
        "failedModels": failed_models,
        "sessionId": session_id,
        "memoryContextUsed": result.memory_context_used,
        "reflectionApplied": result.reflection_applied,
    }))
    .into_response())
}

/// `GET /health` — liveness probe for load balancers.
pub async fn health(State(state): State<AppState>) -> Response {
    let lifecycle = state.lifecycle.current().await;
    let healthy = state.heartbeat.is_healthy() && lifecycle.is_health_reportable();

    let body = serde_json::json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "state": lifecycle.as_str(),
        "uptime": state.uptime_seconds(),
    });

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

/// `GET /status` — operator view of lifecycle, telemetry, and models.
pub async fn status(State(state): State<AppState>) -> Response {
    // Best effort: an unreachable router leaves the list empty.
    let available_models: Vec<String> = match state.gateway.available_models().await {
        Ok(models) => models.iter().map(|m| m.to_string()).collect(),
        Err(_) => Vec::new(),
    };

    Json(serde_json::json!({
        "state": state.lifecycle.current().await.as_str(),
        "heartbeat_mode": state.heartbeat.mode().await.as_str(),
        "uptime_seconds": state.uptime_seconds(),
        "metrics": state.metrics.snapshot(),
        "configured_models": state.configured_models.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
        "available_models": available_models,
    }))
    .into_response()
}

/// `GET /metrics` — Prometheus exposition.
pub async fn metrics(State(state): State<AppState>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics.render_prometheus(),
    )
        .into_response()
}

/// `GET /api/chat/history/:session_id` — the session's recorded entries.
pub async fn chat_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ApiError> {
    state.metrics.record_request();
    match state.memory.history(&session_id).await {
        Some(entries) => Ok(Json(entries).into_response()),
        None => Err(ApiError::NotFound(format!("unknown session: {session_id}"))),
    }
}

/// `GET /api/memory/stats` — memory occupancy counters.
pub async fn memory_stats(State(state): State<AppState>) -> Response {
    state.metrics.record_request();
    Json(state.memory.stats().await).into_response()
}
