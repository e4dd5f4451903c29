//! HTTP surface: one POST endpoint per capability plus a health probe.

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::error::{ErrorKind, GenerationError};
use crate::lesson::LessonContent;
use crate::llm::{LessonSchema, QuizSchema, StructuredGenerator};
use crate::quiz::QuestionItem;
use crate::request::{
    Difficulty, DifficultyScale, GenerationRequest, ValidationError, parse_item_count,
};

const DEFAULT_QUESTIONS: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(n) => n,
    None => unreachable!(),
};
const DEFAULT_SECTIONS: NonZeroUsize = DEFAULT_QUESTIONS;

/// Upper bounds on caller-chosen counts.
#[derive(Clone, Copy, Debug)]
pub struct RequestLimits {
    pub max_questions: usize,
    pub max_sections: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_questions: 20,
            max_sections: 10,
        }
    }
}

#[derive(Clone)]
struct AppState {
    generator: Arc<StructuredGenerator>,
    limits: RequestLimits,
}

#[derive(Debug, Deserialize)]
struct QuestionsBody {
    content: Option<String>,
    num_questions: Option<i64>,
    difficulty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBody {
    topic: Option<String>,
    num_sections: Option<i64>,
    difficulty: Option<String>,
}

#[derive(Debug, Serialize)]
struct QuestionsResponse {
    questions: Vec<QuestionItem>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
}

/// Handler failure. Validation problems map to 400, generation failures to 500.
#[derive(Debug)]
enum ApiError {
    Validation(ValidationError),
    Generation(GenerationError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        ApiError::Generation(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: err.to_string(),
                    kind: None,
                },
            ),
            ApiError::Generation(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: err.message,
                    kind: Some(err.kind),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

fn difficulty_or_default(
    label: Option<&str>,
    scale: DifficultyScale,
) -> Result<Difficulty, ValidationError> {
    match label {
        Some(label) => Difficulty::parse(label, scale),
        None => Ok(scale.default_difficulty()),
    }
}

fn required_text<'a>(
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or(ValidationError::MissingField { field })
}

impl QuestionsBody {
    fn into_request(self, limits: &RequestLimits) -> Result<GenerationRequest, ValidationError> {
        let content = required_text(self.content.as_deref(), "content")?;
        let count = parse_item_count(
            "num_questions",
            self.num_questions,
            DEFAULT_QUESTIONS,
            limits.max_questions,
        )?;
        let difficulty = difficulty_or_default(self.difficulty.as_deref(), DifficultyScale::Quiz)?;
        GenerationRequest::new(content, count, difficulty)
    }
}

impl ContentBody {
    fn into_request(self, limits: &RequestLimits) -> Result<GenerationRequest, ValidationError> {
        let topic = required_text(self.topic.as_deref(), "topic")?;
        let count = parse_item_count(
            "num_sections",
            self.num_sections,
            DEFAULT_SECTIONS,
            limits.max_sections,
        )?;
        let difficulty =
            difficulty_or_default(self.difficulty.as_deref(), DifficultyScale::Lesson)?;
        GenerationRequest::new(topic, count, difficulty)
    }
}

fn body_or_reject<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ValidationError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()))
}

pub fn router(generator: Arc<StructuredGenerator>, limits: RequestLimits) -> Router {
    let state = AppState { generator, limits };

    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/generate-questions/", post(generate_questions))
        .route("/api/generate-content/", post(generate_content))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "studygen listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[instrument(skip_all)]
async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

#[instrument(skip_all)]
async fn generate_questions(
    State(state): State<AppState>,
    payload: Result<Json<QuestionsBody>, JsonRejection>,
) -> Result<Json<QuestionsResponse>, ApiError> {
    let request = body_or_reject(payload)
        .and_then(|body| body.into_request(&state.limits))
        .inspect_err(|err| info!(error = %err, "rejected question request"))?;

    let questions = state.generator.generate(&request, &QuizSchema).await?;
    Ok(Json(QuestionsResponse { questions }))
}

#[instrument(skip_all)]
async fn generate_content(
    State(state): State<AppState>,
    payload: Result<Json<ContentBody>, JsonRejection>,
) -> Result<Json<LessonContent>, ApiError> {
    let request = body_or_reject(payload)
        .and_then(|body| body.into_request(&state.limits))
        .inspect_err(|err| info!(error = %err, "rejected content request"))?;

    info!(topic = request.source_text(), difficulty = %request.difficulty(), "generating content");
    let lesson = state.generator.generate(&request, &LessonSchema).await?;
    Ok(Json(lesson))
}
