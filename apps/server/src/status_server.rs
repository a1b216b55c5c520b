//! HTTP status surface for uptime probes and operators.

use axum::{extract::State, routing::get, Json, Router};
use pricewatch_engine::{CycleStatus, StatusHandle};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// One price from the last successful cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPrice {
    pub label: Option<String>,
    pub price: f64,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    /// RFC 3339 completion time of the last successful cycle
    pub last_check: Option<String>,
    pub last_error: Option<String>,
    pub last_prices: Vec<StatusPrice>,
    pub consecutive_failures: u32,
    pub cycles_completed: u64,
}

impl From<CycleStatus> for StatusResponse {
    fn from(status: CycleStatus) -> Self {
        Self {
            last_check: status.last_check.map(|t| t.to_rfc3339()),
            last_error: status.last_error,
            last_prices: status
                .last_observations
                .iter()
                .map(|o| StatusPrice {
                    label: o.label.clone(),
                    price: o.price.to_f64(),
                })
                .collect(),
            consecutive_failures: status.consecutive_failures,
            cycles_completed: status.cycles_completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Create the status router.
pub fn create_router(status: StatusHandle) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .layer(cors)
        .with_state(status)
}

async fn root_handler() -> &'static str {
    "Price watch is running"
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn status_handler(State(status): State<StatusHandle>) -> Json<StatusResponse> {
    Json(status.snapshot().await.into())
}

/// Bind the status server and serve it in the background.
pub async fn start_status_server(
    status: StatusHandle,
    port: u16,
) -> Result<tokio::task::JoinHandle<()>, std::io::Error> {
    let app = create_router(status);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Status server listening on http://0.0.0.0:{}", port);

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("Status server error: {}", e);
        }
    }))
}
