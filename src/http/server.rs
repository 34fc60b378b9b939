//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, timeout, security gate, CORS, body limit)
//! - Bind server to listener
//! - Stop cleanly on the shutdown broadcast

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::http::middleware::{security_middleware, timeout_envelope};
use crate::security::SecurityClient;

/// Application state injected into handlers and the security middleware.
#[derive(Clone)]
pub struct AppState {
    pub security: Arc<SecurityClient>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// The security client is built once here and shared by every request.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let security = Arc::new(SecurityClient::new(config.security.clone())?);
        let config = Arc::new(config);
        let state = AppState { security };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The `ServiceBuilder` stack runs top to bottom and wraps routing, so
    /// the security gate sees every request, including CORS preflights and
    /// unknown paths.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut app = Router::new()
            .route("/", get(handlers::root))
            .route("/health", get(handlers::health))
            .route("/api/upload", post(handlers::upload))
            .route("/api/test-security", get(handlers::test_security))
            .fallback(handlers::not_found)
            .layer(DefaultBodyLimit::max(config.limits.max_upload_bytes));

        if config.cors.enabled {
            app = app.layer(CorsLayer::permissive());
        }

        app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(middleware::map_response(timeout_envelope))
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    security_middleware,
                )),
        )
        .with_state(state)
    }

    /// A clone of the fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            security_service = %self.config.security.base_url,
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
