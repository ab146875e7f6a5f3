/**
 * HTTP API
 * Palm enrollment, verification and status routes over the engine
 */

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::identity::IdentityHandle;
use crate::landmark::LandmarkVector;
use crate::store::BoxedSampleStore;

pub type PalmEngine = Engine<BoxedSampleStore>;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<PalmEngine>,
}

impl AppState {
    pub fn new(engine: PalmEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}

#[derive(Deserialize)]
struct PalmRequest {
    user_id: String,
    landmarks: LandmarkVector,
}

#[derive(Deserialize)]
struct StatusQuery {
    user_id: String,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    has_registered: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResponse {
    is_verified: bool,
    similarity: f64,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Engine(EngineError),
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        ApiError::Engine(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Engine(e @ EngineError::InvalidSample(_)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            ApiError::Engine(EngineError::NotEnrolled(_)) => {
                (StatusCode::NOT_FOUND, "No palm data registered".to_string())
            }
            ApiError::Engine(EngineError::Store(e)) => {
                error!("Sample store failure: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Sample store unavailable".to_string())
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };
        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/palm/status", get(palm_status))
        .route("/palm/register", post(palm_register))
        .route("/palm/verify", post(palm_verify))
        .route("/palm/:user_id", delete(palm_delete))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn identity(user_id: String) -> Result<IdentityHandle, ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user_id must not be empty".to_string()));
    }
    Ok(IdentityHandle::from(user_id))
}

// Store backends may block on disk; keep them off the async workers.
async fn with_engine<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&PalmEngine) -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    let engine = Arc::clone(&state.engine);
    tokio::task::spawn_blocking(move || op(&engine))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(ApiError::from)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn palm_status(
    State(state): State<AppState>,
    query: Result<Query<StatusQuery>, QueryRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Query(query) = query?;
    let id = identity(query.user_id)?;
    let has_registered = with_engine(&state, move |engine| engine.status(&id)).await?;
    Ok(Json(StatusResponse { has_registered }))
}

async fn palm_register(
    State(state): State<AppState>,
    request: Result<Json<PalmRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(request) = request?;
    info!("Palm register request: user_id={}", request.user_id);

    let id = identity(request.user_id)?;
    let landmarks = request.landmarks;
    with_engine(&state, move |engine| engine.enroll(&id, landmarks)).await?;
    Ok(Json(OkResponse { ok: true }))
}

async fn palm_verify(
    State(state): State<AppState>,
    request: Result<Json<PalmRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(request) = request?;
    info!("Palm verify request: user_id={}", request.user_id);

    let id = identity(request.user_id)?;
    let landmarks = request.landmarks;
    let outcome = with_engine(&state, move |engine| engine.verify(&id, &landmarks)).await?;

    Ok(Json(VerifyResponse {
        is_verified: outcome.accepted,
        similarity: outcome.score,
    }))
}

async fn palm_delete(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let id = identity(user_id)?;
    with_engine(&state, move |engine| engine.delete(&id)).await?;
    Ok(Json(OkResponse { ok: true }))
}
