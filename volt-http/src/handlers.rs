use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use volt_flow::{FlowStep, FlowType};

use crate::error::ApiError;
use crate::service::{FlowExecuteRequest, FlowService};

/// Build the flow API router.
pub fn router(service: Arc<FlowService>) -> Router {
    Router::new()
        .route("/flow/execute", post(execute_flow))
        .route("/flow/graphs", get(list_graphs))
        .route("/health", get(health))
        .with_state(service)
}

/// POST /flow/execute
async fn execute_flow(
    State(service): State<Arc<FlowService>>,
    Json(request): Json<FlowExecuteRequest>,
) -> Result<Json<FlowStep>, ApiError> {
    let step = service.execute(request).await?;
    Ok(Json(step))
}

/// One row of the graph listing.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphSummary {
    id: String,
    #[serde(rename = "type")]
    flow_type: FlowType,
}

/// GET /flow/graphs
async fn list_graphs(State(service): State<Arc<FlowService>>) -> Json<Vec<GraphSummary>> {
    let graphs = service
        .graphs()
        .list()
        .into_iter()
        .map(|graph| GraphSummary {
            id: graph.id().to_string(),
            flow_type: graph.flow_type(),
        })
        .collect();
    Json(graphs)
}

/// GET /health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "UP"}))
}
