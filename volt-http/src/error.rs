use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use volt_flow::FlowError;

/// Error body returned by every flow endpoint.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: &'static str,
    pub error_description: String,
}

/// HTTP-facing errors of the flow API.
///
/// Executor-reported failures are not represented here: a failed flow is a
/// valid terminal step and goes out as HTTP 200 with `status: ERROR`.
#[derive(Debug)]
pub enum ApiError {
    /// The request is structurally wrong (neither flowId nor graphId, ...).
    InvalidRequest(String),
    /// No graph registered under the requested id.
    GraphNotFound(String),
    /// Unknown flow id, or the session expired.
    FlowNotFound(Uuid),
    /// The engine rejected the request; classified 4xx/5xx by the error.
    Engine(FlowError),
}

impl ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::GraphNotFound(_) => "graph_not_found",
            ApiError::FlowNotFound(_) => "flow_not_found",
            ApiError::Engine(e) if e.is_client_error() => "invalid_flow",
            ApiError::Engine(_) => "server_error",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::GraphNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::FlowNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Engine(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn description(&self) -> String {
        match self {
            ApiError::InvalidRequest(msg) => msg.clone(),
            ApiError::GraphNotFound(id) => format!("no flow graph with id {id:?}"),
            ApiError::FlowNotFound(id) => format!("no active flow {id} (unknown or expired)"),
            ApiError::Engine(e) => e.to_string(),
        }
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        ApiError::Engine(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if matches!(self, ApiError::Engine(ref e) if !e.is_client_error()) {
            tracing::error!(error = %self, "flow request failed");
        }
        let body = ApiErrorBody {
            error: self.error_code(),
            error_description: self.description(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.description())
    }
}

impl std::error::Error for ApiError {}
