//! Route handlers.
//!
//! All of them sit behind [`security_middleware`](crate::http::middleware::security_middleware).

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::security::{ConnectionStatus, FileScanPayload, UpstreamError};

pub const SERVICE_NAME: &str = "EditApp Backend (Simplified)";
pub const API_VERSION: &str = "1.0.0";

/// Multipart field carrying the upload.
const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: &'static str,
    pub security: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub security_server: ConnectionStatus,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct UploadReceipt {
    pub message: &'static str,
    pub filename: String,
    pub content_type: Option<String>,
    pub security_validated: bool,
}

#[derive(Debug, Serialize)]
pub struct SecurityTestReport {
    pub security_integration: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_server_status: Option<Value>,
    pub message: String,
}

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: format!("{} - Funcionando", SERVICE_NAME),
        version: API_VERSION,
        security: "Integrado con SecurityServer-Universal",
    })
}

/// The gateway reports itself healthy even when the security service is
/// down; only `security_server` reflects upstream state.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "healthy",
        security_server: state.security.check_health().await,
        timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
    })
}

/// Scan an uploaded file's metadata. The bytes are counted and dropped.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadReceipt>, ApiError> {
    let mut multipart = multipart?;
    let payload = loop {
        let Some(mut field) = multipart.next_field().await? else {
            return Err(ApiError::missing_file());
        };
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(ApiError::missing_file)?;
        let mime_type = field.content_type().map(str::to_string);

        let mut size_bytes: u64 = 0;
        while let Some(chunk) = field.chunk().await? {
            size_bytes += chunk.len() as u64;
        }

        break FileScanPayload {
            filename,
            mime_type,
            size_bytes,
        };
    };

    let verdict = state.security.scan_file(&payload).await;
    if !verdict.is_allowed() {
        tracing::info!(
            filename = %payload.filename,
            mimetype = ?payload.mime_type,
            size = payload.size_bytes,
            verdict = ?verdict,
            "Upload blocked"
        );
        return Err(ApiError::FileBlocked);
    }

    tracing::info!(
        filename = %payload.filename,
        size = payload.size_bytes,
        "Upload accepted"
    );
    Ok(Json(UploadReceipt {
        message: "Archivo subido exitosamente",
        filename: payload.filename,
        content_type: payload.mime_type,
        security_validated: true,
    }))
}

/// Operator diagnostic: talk to the security service directly and report
/// what happened. Always 200.
pub async fn test_security(State(state): State<AppState>) -> Json<SecurityTestReport> {
    let report = match state.security.probe_health().await {
        Ok(status) => SecurityTestReport {
            security_integration: "working",
            security_server_status: Some(status),
            message: "Integración de seguridad funcionando correctamente".to_string(),
        },
        Err(UpstreamError::BadStatus(code)) => SecurityTestReport {
            security_integration: "error",
            security_server_status: None,
            message: format!("Error conectando al servidor de seguridad: {}", code),
        },
        Err(e) => SecurityTestReport {
            security_integration: "error",
            security_server_status: None,
            message: format!("Error: {}", e),
        },
    };
    Json(report)
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
