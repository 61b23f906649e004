//! API error handling.
//!
//! Every error is rendered as `{"error": message}` with a matching status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    InternalError(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) | ApiError::InternalError(msg) => {
                msg
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::InternalError(msg) = &self {
            tracing::error!("Internal error: {}", msg);
        }

        let body = Json(serde_json::json!({ "error": self.message() }));
        (status, body).into_response()
    }
}

impl From<azdo_core::Error> for ApiError {
    fn from(err: azdo_core::Error) -> Self {
        match err {
            azdo_core::Error::PipelineNotFound(_) => ApiError::NotFound(err.to_string()),
            azdo_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use azdo_core::{Error, Stage};

    #[test]
    fn test_status_mapping() {
        let not_found: ApiError = Error::PipelineNotFound("Deploy".to_string()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.message(), "Pipeline not found: Deploy");

        let bad: ApiError = Error::InvalidInput("Pipeline name is required".to_string()).into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert_eq!(bad.message(), "Pipeline name is required");

        let upstream: ApiError = Error::from_status(Stage::ListPipelines, 401, "").into();
        assert_eq!(upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.message(), "Failed to list pipelines: HTTP 401");
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
