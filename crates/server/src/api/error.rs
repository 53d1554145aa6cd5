//! JSON error bodies shared by all handlers.

use axum::{http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

use mediaconv_core::ServiceError;

/// Error body: `{"detail": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Status and body returned by a failed handler.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
}

pub fn bad_request(detail: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, detail)
}

pub fn not_found(detail: impl Into<String>) -> ApiError {
    api_error(StatusCode::NOT_FOUND, detail)
}

/// Map a service failure to its HTTP status.
pub fn service_error(err: ServiceError) -> ApiError {
    let status = match &err {
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        ServiceError::Timeout | ServiceError::Conversion { .. } | ServiceError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        error!(error = %err, "Request failed");
    }

    api_error(status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::Timeout, StatusCode::INTERNAL_SERVER_ERROR),
            (
                ServiceError::Conversion {
                    stderr: "boom".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ServiceError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let (status, _) = service_error(err);
            assert_eq!(status, expected);
        }
    }

    #[test]
    fn test_detail_is_message() {
        let (_, Json(body)) = service_error(ServiceError::Timeout);
        assert_eq!(body.detail, "FFMPEG process timed out while converting file");
    }
}
