//! API error types.

use argus_core::AnalysisError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// API errors.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No `image` field in the upload.
    #[error("an image file is required")]
    MissingImage,

    /// The `image` field has an empty file name.
    #[error("no file selected")]
    NoFileSelected,

    /// The file extension is not allowed.
    #[error("unsupported file type, use JPG, PNG or WebP")]
    InvalidFileType,

    /// The image could not be decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The upload exceeds the size limit.
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// The request body is not a readable multipart form.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No API key was supplied.
    #[error("API key is required")]
    ApiKeyRequired,

    /// The API key is not recognized.
    #[error("invalid API key")]
    InvalidApiKey,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Status code and wire code for this error.
    pub fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::MissingImage => (StatusCode::BAD_REQUEST, "MISSING_IMAGE"),
            ApiError::NoFileSelected => (StatusCode::BAD_REQUEST, "NO_FILE_SELECTED"),
            ApiError::InvalidFileType => (StatusCode::BAD_REQUEST, "INVALID_FILE_TYPE"),
            ApiError::InvalidImage(_) => (StatusCode::BAD_REQUEST, "INVALID_IMAGE"),
            ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::ApiKeyRequired => (StatusCode::UNAUTHORIZED, "API_KEY_REQUIRED"),
            ApiError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "INVALID_API_KEY"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        }
    }

    /// Attaches the request identifier reported in the error body.
    pub fn with_request_id(self, request_id: impl Into<String>) -> RequestFailure {
        RequestFailure {
            error: self,
            request_id: Some(request_id.into()),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::ImageTooLarge(..) => ApiError::PayloadTooLarge(e.to_string()),
            AnalysisError::EmptyInput | AnalysisError::Decode(_) => {
                ApiError::InvalidImage(e.to_string())
            }
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// An [`ApiError`] tagged with the request it belongs to.
#[derive(Debug)]
pub struct RequestFailure {
    pub error: ApiError,
    pub request_id: Option<String>,
}

impl From<ApiError> for RequestFailure {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            request_id: None,
        }
    }
}

impl IntoResponse for RequestFailure {
    fn into_response(self) -> Response {
        let (status, code) = self.error.parts();

        let body = ErrorResponse {
            error: code.to_string(),
            message: self.error.to_string(),
            request_id: self.request_id,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        RequestFailure::from(self).into_response()
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_core_errors() {
        let e = ApiError::from(AnalysisError::ImageTooLarge(20, 10));
        assert_eq!(e.parts().1, "PAYLOAD_TOO_LARGE");
        let e = ApiError::from(AnalysisError::Decode("bad header".to_string()));
        assert_eq!(e.parts(), (StatusCode::BAD_REQUEST, "INVALID_IMAGE"));
    }

    #[test]
    fn unauthorized_codes() {
        assert_eq!(ApiError::ApiKeyRequired.parts().0, StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidApiKey.parts().1, "INVALID_API_KEY");
    }
}
