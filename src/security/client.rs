//! Client for the external security service.
//!
//! # Responsibilities
//! - Ask the service whether a request may proceed (`/api/validate-request`)
//! - Ask the service whether an upload is safe (`/api/scan-file`)
//! - Probe service reachability (`/health`)
//!
//! Every call is bounded by its own timeout. Every failure is absorbed here
//! and turned into a fail-closed answer: callers receive a `Verdict` or a
//! `ConnectionStatus`, never an error.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::config::SecurityServiceConfig;
use crate::observability::metrics;
use crate::security::types::{
    ConnectionStatus, FileScanPayload, FileScanResult, RequestValidationPayload,
    RequestValidationResult, UpstreamError, Verdict,
};

const VALIDATE_PATH: &str = "/api/validate-request";
const SCAN_PATH: &str = "/api/scan-file";
const HEALTH_PATH: &str = "/health";

/// HTTP client bound to one security service.
#[derive(Clone)]
pub struct SecurityClient {
    http: reqwest::Client,
    config: SecurityServiceConfig,
    base_url: String,
}

impl SecurityClient {
    /// Create a client for the service described by `config`.
    ///
    /// Fails only if the underlying HTTP client cannot be built.
    pub fn new(config: SecurityServiceConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("security-gateway/", env!("CARGO_PKG_VERSION")))
            .no_proxy()
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    /// Ask the service whether an inbound request may proceed.
    pub async fn validate_request(&self, payload: &RequestValidationPayload) -> Verdict {
        let start = Instant::now();
        let result = self
            .post_json::<_, RequestValidationResult>(
                VALIDATE_PATH,
                payload,
                self.config.validate_timeout(),
            )
            .await;

        let verdict = match result {
            Ok(body) => Verdict::from_flag(body.valid),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    url = %payload.url,
                    "Request validation failed, blocking"
                );
                Verdict::Failed(e)
            }
        };
        metrics::record_security_call("validate_request", verdict.label(), start);
        verdict
    }

    /// Ask the service whether an uploaded file is safe.
    pub async fn scan_file(&self, payload: &FileScanPayload) -> Verdict {
        let start = Instant::now();
        let result = self
            .post_json::<_, FileScanResult>(SCAN_PATH, payload, self.config.scan_timeout())
            .await;

        let verdict = match result {
            Ok(body) => Verdict::from_flag(body.safe),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    filename = %payload.filename,
                    "File scan failed, blocking"
                );
                Verdict::Failed(e)
            }
        };
        metrics::record_security_call("scan_file", verdict.label(), start);
        verdict
    }

    /// Best-effort reachability check. Never fails.
    pub async fn check_health(&self) -> ConnectionStatus {
        match self.probe().await {
            Ok(_) => ConnectionStatus::Connected,
            Err(e) => {
                tracing::debug!(error = %e, "Security service health check failed");
                ConnectionStatus::Disconnected
            }
        }
    }

    /// Fetch the service's health document.
    ///
    /// Unlike [`check_health`](Self::check_health) the failure cause is
    /// returned, for diagnostics.
    pub async fn probe_health(&self) -> Result<serde_json::Value, UpstreamError> {
        let body = self.probe().await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    async fn probe(&self) -> Result<Vec<u8>, UpstreamError> {
        let start = Instant::now();
        let timeout = self.config.health_timeout();
        let request = self.http.get(self.endpoint(HEALTH_PATH));
        let result = self.send(request, timeout).await;

        let outcome = match &result {
            Ok(_) => "connected",
            Err(e) => e.kind(),
        };
        metrics::record_security_call("health", outcome, start);
        result
    }

    async fn post_json<B, R>(
        &self,
        path: &str,
        payload: &B,
        timeout: Duration,
    ) -> Result<R, UpstreamError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.http.post(self.endpoint(path)).json(payload);
        let body = self.send(request, timeout).await?;
        serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }

    /// Send `request`, insisting on a 200, and return the body.
    async fn send(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Vec<u8>, UpstreamError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(e, timeout))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(UpstreamError::BadStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| classify(e, timeout))?;
        Ok(body.to_vec())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl std::fmt::Debug for SecurityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityClient")
            .field("base_url", &self.base_url)
            .field("validate_timeout_secs", &self.config.validate_timeout_secs)
            .field("scan_timeout_secs", &self.config.scan_timeout_secs)
            .field("health_timeout_secs", &self.config.health_timeout_secs)
            .finish()
    }
}

fn classify(error: reqwest::Error, timeout: Duration) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::Timeout(timeout.as_secs())
    } else if error.is_decode() {
        UpstreamError::Malformed(error.to_string())
    } else {
        UpstreamError::Unreachable(error.to_string())
    }
}
