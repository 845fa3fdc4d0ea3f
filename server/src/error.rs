use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use parley_core::GatewayError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Handler error: a core failure rendered as a non-2xx JSON body
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub GatewayError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            GatewayError::Provider(_) | GatewayError::Decode(_) => StatusCode::BAD_GATEWAY,
            GatewayError::ToolExecution { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::UnresolvableTool(_)
            | GatewayError::ToolRoundsExceeded(_)
            | GatewayError::Config(_)
            | GatewayError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            error!(target: "http", %status, error = %message, "Request failed");
        } else {
            warn!(target: "http", %status, error = %message, "Request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
