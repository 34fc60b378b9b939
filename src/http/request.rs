//! Request inspection.
//!
//! # Responsibilities
//! - Read the request ID assigned by the request-id layer
//! - Describe a live request as a `RequestValidationPayload`
//!
//! # Design Decisions
//! - Header values that are not valid UTF-8 are converted lossily, never dropped
//! - The peer address comes from `ConnectInfo`; in-process callers have none

use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Request, Uri};
use std::collections::btree_map::{BTreeMap, Entry};
use std::net::SocketAddr;

use crate::security::{RequestValidationPayload, UNKNOWN_IP};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The request ID, or "unknown" if the layer did not run.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Build the payload the security service expects for `request`.
pub fn validation_payload<B>(request: &Request<B>) -> RequestValidationPayload {
    let headers = request.headers();

    let user_agent = headers
        .get(header::USER_AGENT)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default();

    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string());

    RequestValidationPayload {
        url: absolute_url(request.uri(), headers),
        method: request.method().to_string(),
        headers: flatten_headers(headers),
        user_agent,
        ip,
    }
}

/// Server-side requests usually carry only a path; rebuild the full URL
/// from the Host header.
fn absolute_url(uri: &Uri, headers: &HeaderMap) -> String {
    if uri.scheme().is_some() {
        return uri.to_string();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");

    format!("http://{}{}", host, path)
}

fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        match map.entry(name.as_str().to_string()) {
            Entry::Occupied(mut entry) => {
                let joined: &mut String = entry.get_mut();
                joined.push_str(", ");
                joined.push_str(&value);
            }
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }
    map
}
