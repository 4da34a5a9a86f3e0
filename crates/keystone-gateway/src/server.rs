use crate::error::ApiError;
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use keystone_core::ProjectInput;
use keystone_orchestrator::{ConsolidatedOutput, Orchestrator};
use std::sync::Arc;
use tracing::info;

/// Path of the analysis endpoint.
pub const ANALYZE_PATH: &str = "/api/v1/projects/analyze";

/// The main gateway server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router around a shared, already-validated orchestrator.
    pub fn build(orchestrator: Arc<Orchestrator>) -> Router {
        Router::new()
            .route(ANALYZE_PATH, post(analyze_handler))
            .route("/health", get(health_handler))
            .with_state(orchestrator)
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "keystone"}))
}

async fn analyze_handler(
    State(orchestrator): State<Arc<Orchestrator>>,
    Json(input): Json<ProjectInput>,
) -> Result<Json<ConsolidatedOutput>, ApiError> {
    let output = orchestrator.process(input).await?;
    info!(
        status = %output.overall_status,
        succeeded = output.succeeded_count(),
        failed = output.failed_count(),
        "Analysis served"
    );
    Ok(Json(output))
}
