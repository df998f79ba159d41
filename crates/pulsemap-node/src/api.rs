//! HTTP API for Pulsemap.

use crate::node::NodeState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use pulsemap_engine::{CellSum, RollupSummary};
use pulsemap_grid::{BoundingBox, CellId};
use pulsemap_store::{is_valid_id, now_ms, GeoPoint, PollRollupState, Submission};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

type AppState = Arc<NodeState>;

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    // CORS layer for browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Aggregate reads
        .route("/api/v1/polls/:poll/aggregates", get(get_aggregates))
        // Submission ingest
        .route(
            "/api/v1/polls/:poll/submissions/:user",
            put(put_submission).delete(delete_submission),
        )
        // Rollup admin
        .route("/api/v1/polls/:poll/rollup", post(trigger_rollup))
        .route("/api/v1/polls/:poll/rollup-state", get(get_rollup_state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

async fn ready() -> &'static str {
    "OK"
}

// --- Error mapping ---

#[derive(Debug)]
struct ApiError(pulsemap_engine::Error);

impl From<pulsemap_engine::Error> for ApiError {
    fn from(e: pulsemap_engine::Error) -> Self {
        Self(e)
    }
}

impl From<pulsemap_store::Error> for ApiError {
    fn from(e: pulsemap_store::Error) -> Self {
        Self(pulsemap_engine::Error::Store(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use pulsemap_engine::Error;
        let status = match &self.0 {
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::RollupInProgress(_) => StatusCode::CONFLICT,
            Error::Internal(_) | Error::Store(_) => {
                tracing::error!(error = %self.0, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn require_id(kind: &str, id: &str) -> Result<(), ApiError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(ApiError(pulsemap_engine::Error::InvalidArgument(format!(
            "{kind} id {id:?}"
        ))))
    }
}

// --- Aggregate endpoints ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregatesParams {
    question_id: String,
    res: u8,
    west: Option<f64>,
    south: Option<f64>,
    east: Option<f64>,
    north: Option<f64>,
}

impl AggregatesParams {
    /// All four edges, or none.
    fn bounds(&self) -> Result<Option<BoundingBox>, ApiError> {
        match (self.west, self.south, self.east, self.north) {
            (Some(west), Some(south), Some(east), Some(north)) => {
                Ok(Some(BoundingBox { west, south, east, north }))
            }
            (None, None, None, None) => Ok(None),
            _ => Err(ApiError(pulsemap_engine::Error::InvalidArgument(
                "bounding box requires west, south, east and north".into(),
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
struct AggregatesResponse {
    aggs: Vec<CellSum>,
}

async fn get_aggregates(
    State(state): State<AppState>,
    Path(poll): Path<String>,
    Query(params): Query<AggregatesParams>,
) -> Result<Json<AggregatesResponse>, ApiError> {
    let bounds = params.bounds()?;
    let aggs = state
        .query
        .query(&poll, &params.question_id, params.res, bounds.as_ref())?;
    Ok(Json(AggregatesResponse { aggs }))
}

// --- Submission endpoints ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionRequest {
    submitted: bool,
    #[serde(default)]
    answers: BTreeMap<String, f64>,
    #[serde(default)]
    location: Option<GeoPoint>,
    #[serde(default)]
    cell: Option<CellId>,
}

async fn put_submission(
    State(state): State<AppState>,
    Path((poll, user)): Path<(String, String)>,
    Json(req): Json<SubmissionRequest>,
) -> Result<StatusCode, ApiError> {
    require_id("poll", &poll)?;
    require_id("user", &user)?;
    for question in req.answers.keys() {
        require_id("question", question)?;
    }

    let before = state.store.get_submission(&poll, &user)?;
    let sub = Submission {
        poll_id: poll,
        user_id: user,
        submitted: req.submitted,
        answers: req.answers,
        location: req.location,
        cell: req.cell,
        updated_at_ms: now_ms(),
    };
    state.store.put_submission(&sub)?;
    state
        .aggregator
        .on_response_written(before.as_ref(), Some(&sub))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_submission(
    State(state): State<AppState>,
    Path((poll, user)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    require_id("poll", &poll)?;
    require_id("user", &user)?;

    match state.store.delete_submission(&poll, &user)? {
        Some(before) => {
            state.aggregator.on_response_written(Some(&before), None)?;
            Ok(StatusCode::NO_CONTENT)
        }
        None => Ok(StatusCode::NOT_FOUND),
    }
}

// --- Rollup endpoints ---

async fn trigger_rollup(
    State(state): State<AppState>,
    Path(poll): Path<String>,
) -> Result<Json<RollupSummary>, ApiError> {
    let summary = state.rollup.rollup(&poll)?;
    Ok(Json(summary))
}

async fn get_rollup_state(
    State(state): State<AppState>,
    Path(poll): Path<String>,
) -> Result<Json<PollRollupState>, ApiError> {
    require_id("poll", &poll)?;
    Ok(Json(state.store.rollup_state(&poll)?))
}
