//! Payloads, verdicts and error definitions for the security service.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// IP reported when the transport has no peer address.
pub const UNKNOWN_IP: &str = "unknown";

/// Request metadata sent to `/api/validate-request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestValidationPayload {
    /// Absolute request URL.
    pub url: String,
    pub method: String,
    /// Lowercase header names; repeated headers joined with ", ".
    pub headers: BTreeMap<String, String>,
    pub user_agent: String,
    pub ip: String,
}

/// Upload metadata sent to `/api/scan-file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileScanPayload {
    pub filename: String,
    #[serde(rename = "mimetype")]
    pub mime_type: Option<String>,
    #[serde(rename = "size")]
    pub size_bytes: u64,
}

/// Body of a 200 from `/api/validate-request`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct RequestValidationResult {
    #[serde(default)]
    pub valid: bool,
}

/// Body of a 200 from `/api/scan-file`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub(crate) struct FileScanResult {
    #[serde(default)]
    pub safe: bool,
}

/// Errors talking to the security service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure, reset, ...
    #[error("security service unreachable: {0}")]
    Unreachable(String),

    #[error("security service timed out after {0} seconds")]
    Timeout(u64),

    #[error("security service returned status {0}")]
    BadStatus(u16),

    #[error("malformed response from security service: {0}")]
    Malformed(String),
}

impl UpstreamError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Unreachable(_) => "unreachable",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::BadStatus(_) => "bad_status",
            UpstreamError::Malformed(_) => "malformed",
        }
    }
}

/// Outcome of a validation or scan call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The service answered 200 and approved.
    Allowed,
    /// The service answered 200 and rejected (or omitted the field).
    Denied,
    /// No usable answer. Enforced exactly like `Denied`.
    Failed(UpstreamError),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    pub(crate) fn from_flag(flag: bool) -> Self {
        if flag {
            Verdict::Allowed
        } else {
            Verdict::Denied
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Verdict::Allowed => "allowed",
            Verdict::Denied => "denied",
            Verdict::Failed(e) => e.kind(),
        }
    }
}

/// Reachability of the security service as reported by `/health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payloads_use_service_field_names() {
        let request = RequestValidationPayload {
            url: "http://localhost:8000/".into(),
            method: "GET".into(),
            headers: BTreeMap::from([("host".into(), "localhost:8000".into())]),
            user_agent: "curl/8.0".into(),
            ip: UNKNOWN_IP.into(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "url": "http://localhost:8000/",
                "method": "GET",
                "headers": {"host": "localhost:8000"},
                "user_agent": "curl/8.0",
                "ip": "unknown"
            })
        );

        let file = FileScanPayload {
            filename: "evil.exe".into(),
            mime_type: None,
            size_bytes: 0,
        };
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            json!({"filename": "evil.exe", "mimetype": null, "size": 0})
        );
    }

    #[test]
    fn missing_verdict_field_means_no() {
        let result: RequestValidationResult = serde_json::from_str(r#"{"reason":"?"}"#).unwrap();
        assert!(!result.valid);

        let result: FileScanResult = serde_json::from_str("{}").unwrap();
        assert!(!result.safe);
    }

    #[test]
    fn only_allowed_passes() {
        assert!(Verdict::Allowed.is_allowed());
        assert!(!Verdict::Denied.is_allowed());
        assert!(!Verdict::Failed(UpstreamError::Timeout(5)).is_allowed());
    }

    #[test]
    fn connection_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(ConnectionStatus::Disconnected).unwrap(),
            json!("disconnected")
        );
    }
}
