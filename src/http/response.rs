//! Client-facing error responses.
//!
//! Every failure the gateway reports is one of these variants; each maps to a
//! fixed status code and JSON envelope.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const REQUEST_BLOCKED_ERROR: &str = "Petición bloqueada por seguridad";
pub const REQUEST_BLOCKED_MESSAGE: &str = "La petición no pasó las validaciones de seguridad";
pub const FILE_BLOCKED_DETAIL: &str = "Archivo bloqueado por seguridad";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The security service did not approve the request.
    #[error("request blocked by security service")]
    RequestBlocked,

    /// The security service did not approve the uploaded file.
    #[error("file blocked by security service")]
    FileBlocked,

    /// The upload form is missing or unusable.
    #[error("invalid upload: {detail}")]
    InvalidUpload { status: StatusCode, detail: String },

    #[error("not found")]
    NotFound,

    /// The overall request deadline expired.
    #[error("request timed out")]
    Timeout,
}

impl ApiError {
    pub fn missing_file() -> Self {
        ApiError::InvalidUpload {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: "Campo 'file' requerido".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::RequestBlocked => StatusCode::FORBIDDEN,
            ApiError::FileBlocked => StatusCode::BAD_REQUEST,
            ApiError::InvalidUpload { status, .. } => *status,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        // Oversized bodies keep their 413; everything else is a form error.
        let status = match e.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        ApiError::InvalidUpload {
            status,
            detail: e.body_text(),
        }
    }
}

impl From<MultipartRejection> for ApiError {
    /// Wrong or missing `multipart/form-data` content type.
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::InvalidUpload {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match &self {
            ApiError::RequestBlocked => json!({
                "error": REQUEST_BLOCKED_ERROR,
                "message": REQUEST_BLOCKED_MESSAGE,
            }),
            ApiError::FileBlocked => json!({ "detail": FILE_BLOCKED_DETAIL }),
            ApiError::InvalidUpload { detail, .. } => json!({ "detail": detail }),
            ApiError::NotFound => json!({ "detail": "Not Found" }),
            ApiError::Timeout => json!({ "detail": "Request Timeout" }),
        };
        (self.status(), Json(body)).into_response()
    }
}
