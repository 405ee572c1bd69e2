use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use bountyboard_types::BountyboardError;

/// HTTP wrapper around the domain error taxonomy.
#[derive(Debug)]
pub struct ApiError(pub BountyboardError);

impl From<BountyboardError> for ApiError {
    fn from(err: BountyboardError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            BountyboardError::Validation(_) => StatusCode::BAD_REQUEST,
            BountyboardError::BountyNotFound(_) | BountyboardError::ServiceNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            BountyboardError::InvalidTransition { .. } | BountyboardError::ServiceDeactivated => {
                StatusCode::CONFLICT
            }
            BountyboardError::InvalidSecret => StatusCode::FORBIDDEN,
            BountyboardError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            BountyboardError::RegistryUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            BountyboardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "internal error");
        }
        let body = Json(serde_json::json!({
            "detail": self.0.to_string(),
            "code": self.0.code(),
        }));
        (status, body).into_response()
    }
}
