//! HTTP server for Prometheus metrics and module health
//!
//! Runs a lightweight HTTP server on a separate port for Prometheus scraping.
//!
//! # Endpoints
//!
//! - `GET /metrics` - Prometheus metrics
//! - `GET /health` - JSON health summary (threshold, sends in flight)
//!
//! # Example
//!
//! ```ignore
//! use edgefilter_gateway::metrics_server::MetricsServer;
//!
//! let metrics_handle = MetricsServer::start("0.0.0.0:9090".parse()?);
//! ```

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Metrics HTTP server
pub struct MetricsServer;

impl MetricsServer {
    /// Start the metrics server on `addr`
    ///
    /// Returns a JoinHandle that can be used to abort the server.
    /// The server runs until aborted or the process exits.
    pub fn start(addr: SocketAddr) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(%addr, "Metrics server starting");

            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(e) => {
                    error!(error = %e, %addr, "Failed to bind metrics server");
                    return;
                }
            };

            if let Err(e) = axum::serve(listener, router()).await {
                error!(error = %e, "Metrics server error");
            }
        })
    }
}

fn router() -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
}

/// Handler for /metrics endpoint
async fn metrics_handler() -> impl IntoResponse {
    let body = crate::metrics::gather();
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Module health summary
#[derive(serde::Serialize)]
struct HealthSummary {
    status: &'static str,
    temperature_threshold: f64,
    sends_in_flight: f64,
}

/// Handler for /health endpoint
async fn health_handler() -> impl IntoResponse {
    let Some(metrics) = crate::metrics::Metrics::get() else {
        return (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response();
    };

    let summary = HealthSummary {
        status: "healthy",
        temperature_threshold: metrics.temperature_threshold.get(),
        sends_in_flight: metrics.sends_in_flight.get(),
    };

    (StatusCode::OK, Json(summary)).into_response()
}
