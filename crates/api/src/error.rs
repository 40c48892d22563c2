//! API Error Mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use session::ServiceFault;
use thiserror::Error;
use tracing::error;

/// Errors returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Declared fault of a session operation
    #[error(transparent)]
    Fault(#[from] ServiceFault),

    /// Failure outside the session protocol
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Fault(ServiceFault::DataFormat { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Fault(ServiceFault::Validation { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::Fault(fault) => json!(fault),
            ApiError::Internal(message) => {
                error!("{}", message);
                json!({ "fault": "INTERNAL", "message": message })
            }
        };
        (status, Json(body)).into_response()
    }
}
