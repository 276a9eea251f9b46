//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use flowmate_domain::error::FlowMateError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`FlowMateError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(FlowMateError);

impl From<FlowMateError> for ApiError {
    fn from(err: FlowMateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            FlowMateError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            FlowMateError::Console(err) => {
                tracing::warn!(error = %err, "console error");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            FlowMateError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowmate_domain::error::{ConsoleError, ValidationError};

    #[test]
    fn should_map_validation_to_bad_request() {
        let response = ApiError::from(FlowMateError::from(ValidationError::NotFinite {
            field: "asmDelay",
        }))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn should_map_console_to_bad_gateway() {
        let response = ApiError::from(FlowMateError::from(ConsoleError::Detached {
            surface: "softphone",
        }))
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn should_map_storage_to_internal_error() {
        let response =
            ApiError::from(FlowMateError::Storage("disk full".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
