//! HTTP layer: request validation, orchestrator invocation, and static
//! serving of generated artifacts.

use std::path::Path;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::model::{
    PipelineRequest, PipelineResponse, PipelineStage, STAGE_SPECS, ValidationErrors,
};
use crate::pipeline::PipelineRunner;

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<PipelineRunner>,
}

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),
    Pipeline(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "Invalid request",
                    "details": details,
                })),
            )
                .into_response(),
            ApiError::Pipeline(message) => {
                tracing::error!("pipeline run failed: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                        "error": "Pipeline failed",
                        "message": message,
                    })),
                )
                    .into_response()
            }
        }
    }
}

pub fn router(state: AppState, files_dir: &Path) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/pipeline", post(run_pipeline))
        .route("/api/pipeline/stages", get(stage_template))
        .nest_service("/files", ServeDir::new(files_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// The idle stage list a client renders before any run.
async fn stage_template() -> Json<Vec<PipelineStage>> {
    Json(STAGE_SPECS.iter().map(PipelineStage::idle).collect())
}

/// POST /api/pipeline
/// Validate the request, run the pipeline once, and return the snapshot.
async fn run_pipeline(
    State(state): State<AppState>,
    Json(req): Json<PipelineRequest>,
) -> Result<Json<PipelineResponse>, ApiError> {
    if let Err(details) = req.validate() {
        return Err(ApiError::Validation(details));
    }

    tracing::info!(project = %req.project_name, "pipeline requested");

    match state.runner.run(&req).await {
        Ok(response) => Ok(Json(response)),
        Err(err) => Err(ApiError::Pipeline(err.to_string())),
    }
}
