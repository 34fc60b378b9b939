//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! middleware, handlers, security client produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is attached to every log line about a request
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
