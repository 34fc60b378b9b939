//! Shared utilities for integration testing.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use security_gateway::{GatewayConfig, HttpServer, Shutdown};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// What the mock security service answers on one endpoint.
#[derive(Clone)]
#[allow(dead_code)]
pub enum Reply {
    Json(u16, Value),
    Text(u16, &'static str),
    Slow(Duration, Value),
}

impl Reply {
    async fn respond(self) -> Response {
        match self {
            Reply::Json(status, body) => (status_code(status), Json(body)).into_response(),
            Reply::Text(status, body) => (status_code(status), body).into_response(),
            Reply::Slow(delay, body) => {
                tokio::time::sleep(delay).await;
                Json(body).into_response()
            }
        }
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap()
}

/// Behaviour of the mock security service, one reply per endpoint.
#[derive(Clone)]
pub struct MockSecurity {
    pub validate: Reply,
    pub scan: Reply,
    pub health: Reply,
}

impl MockSecurity {
    /// Approves everything and reports healthy.
    pub fn permissive() -> Self {
        Self {
            validate: Reply::Json(200, serde_json::json!({ "valid": true })),
            scan: Reply::Json(200, serde_json::json!({ "safe": true })),
            health: Reply::Json(200, serde_json::json!({ "status": "ok" })),
        }
    }
}

#[derive(Clone)]
struct MockState {
    behaviour: MockSecurity,
    validations: Arc<Mutex<Vec<Value>>>,
    scans: Arc<Mutex<Vec<Value>>>,
}

/// A running mock security service and the payloads it received.
pub struct MockHandle {
    pub addr: SocketAddr,
    validations: Arc<Mutex<Vec<Value>>>,
    scans: Arc<Mutex<Vec<Value>>>,
}

#[allow(dead_code)]
impl MockHandle {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn validations(&self) -> Vec<Value> {
        self.validations.lock().unwrap().clone()
    }

    pub fn scans(&self) -> Vec<Value> {
        self.scans.lock().unwrap().clone()
    }
}

/// Start a mock security service on an ephemeral port.
pub async fn start_mock_security(behaviour: MockSecurity) -> MockHandle {
    let state = MockState {
        behaviour,
        validations: Arc::new(Mutex::new(Vec::new())),
        scans: Arc::new(Mutex::new(Vec::new())),
    };
    let handle_validations = state.validations.clone();
    let handle_scans = state.scans.clone();

    let app = Router::new()
        .route(
            "/api/validate-request",
            post(|State(s): State<MockState>, Json(body): Json<Value>| async move {
                s.validations.lock().unwrap().push(body);
                s.behaviour.validate.clone().respond().await
            }),
        )
        .route(
            "/api/scan-file",
            post(|State(s): State<MockState>, Json(body): Json<Value>| async move {
                s.scans.lock().unwrap().push(body);
                s.behaviour.scan.clone().respond().await
            }),
        )
        .route(
            "/health",
            get(|State(s): State<MockState>| async move { s.behaviour.health.clone().respond().await }),
        )
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockHandle {
        addr,
        validations: handle_validations,
        scans: handle_scans,
    }
}

/// An address with nothing listening on it.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running gateway.
pub struct GatewayHandle {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    #[allow(dead_code)]
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

impl GatewayHandle {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a gateway pointed at `security_url` with one-second upstream timeouts.
pub async fn start_gateway(security_url: String) -> GatewayHandle {
    start_gateway_with(security_url, |_| {}).await
}

/// Like [`start_gateway`], with `tweak` applied to the config before start.
pub async fn start_gateway_with<F>(security_url: String, tweak: F) -> GatewayHandle
where
    F: FnOnce(&mut GatewayConfig),
{
    let mut config = GatewayConfig::default();
    config.security.base_url = security_url;
    config.security.validate_timeout_secs = 1;
    config.security.scan_timeout_secs = 1;
    config.security.health_timeout_secs = 1;
    tweak(&mut config);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();
    let task = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    GatewayHandle { addr, shutdown, task }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
