//! Security gateway library.
//!
//! Every inbound request is checked with an external security service before
//! it reaches a handler; uploads are additionally scanned. Any doubt blocks.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use security::SecurityClient;
