use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Invalid capture URL: {0}")]
    Validation(String),

    #[error("Failed to fetch page: {message}")]
    UpstreamFetch { status: Option<u16>, message: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Page evaluation failed: {0}")]
    Evaluation(String),

    #[error("Screenshot capture failed: {0}")]
    Screenshot(String),

    #[error("Failed to persist capture record: {0}")]
    Persistence(String),
}

impl CaptureError {
    pub fn log(&self) {
        match self {
            CaptureError::Validation(e) => {
                warn!(error = %e, "Capture URL rejected");
            }
            CaptureError::UpstreamFetch { status, message } => {
                warn!(status = ?status, error = %message, "Upstream fetch failed");
            }
            CaptureError::Browser(e) => {
                error!(error = %e, "Browser session failed");
            }
            CaptureError::Navigation(e) => {
                error!(error = %e, "Page navigation failed");
            }
            CaptureError::Evaluation(e) => {
                error!(error = %e, "In-page evaluation failed");
            }
            CaptureError::Screenshot(e) => {
                error!(error = %e, "Screenshot capture failed");
            }
            CaptureError::Persistence(e) => {
                error!(error = %e, "Store write failed");
            }
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CaptureError::Validation(_) | CaptureError::UpstreamFetch { .. } => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message; internal detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            CaptureError::Validation(_) => "Please provide a valid Threads URL",
            CaptureError::UpstreamFetch { .. } => {
                "Could not fetch the requested page, please check the link"
            }
            _ => "Server error, please try again later",
        }
    }
}

impl IntoResponse for CaptureError {
    fn into_response(self) -> Response {
        self.log();
        let body = Json(json!({
            "success": false,
            "error": self.public_message(),
        }));
        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_400() {
        assert_eq!(
            CaptureError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CaptureError::UpstreamFetch {
                status: Some(404),
                message: "not found".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn pipeline_errors_map_to_500() {
        for err in [
            CaptureError::Browser("x".into()),
            CaptureError::Navigation("x".into()),
            CaptureError::Evaluation("x".into()),
            CaptureError::Screenshot("x".into()),
            CaptureError::Persistence("x".into()),
        ] {
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn public_messages_hide_internal_detail() {
        let err = CaptureError::Navigation("net::ERR_NAME_NOT_RESOLVED".into());
        assert!(!err.public_message().contains("ERR_NAME_NOT_RESOLVED"));
        assert!(CaptureError::Validation("x".into())
            .public_message()
            .contains("valid Threads URL"));
    }
}
