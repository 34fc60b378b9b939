//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → http::middleware builds RequestValidationPayload
//!     → client.rs POST /api/validate-request
//!     → Verdict (Allowed / Denied / Failed)
//!
//! Upload:
//!     → http::handlers builds FileScanPayload
//!     → client.rs POST /api/scan-file
//!     → Verdict
//! ```
//!
//! # Design Decisions
//! - Fail closed: anything but an explicit approval blocks
//! - Upstream errors never escape the client; they become `Verdict::Failed`
//! - No retries: one call, one verdict

pub mod client;
pub mod types;

pub use client::SecurityClient;
pub use types::{
    ConnectionStatus, FileScanPayload, RequestValidationPayload, UpstreamError, Verdict,
    UNKNOWN_IP,
};
