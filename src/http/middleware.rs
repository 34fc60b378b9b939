//! Security gate applied to every inbound request.
//!
//! Runs before routing, so unknown paths, wrong methods and CORS preflights
//! are validated too. Nothing downstream executes unless the security service
//! answers with an explicit approval.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Instant;

use crate::http::request::{request_id, validation_payload};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::Verdict;

pub async fn security_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let payload = validation_payload(&request);
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = match state.security.validate_request(&payload).await {
        Verdict::Allowed => next.run(request).await,
        Verdict::Denied => {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                ip = %payload.ip,
                "Request denied by security service"
            );
            ApiError::RequestBlocked.into_response()
        }
        Verdict::Failed(e) => {
            tracing::warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                error = %e,
                "Security service unavailable, request blocked"
            );
            ApiError::RequestBlocked.into_response()
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}

/// Give the bare 408 produced by the request timeout layer the same JSON
/// `{detail}` envelope as every other gateway error.
pub async fn timeout_envelope(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT
        && !response.headers().contains_key(header::CONTENT_TYPE)
    {
        tracing::warn!("Request timed out");
        return ApiError::Timeout.into_response();
    }
    response
}
