// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! HTTP server for the Prometheus scrape endpoint
//!
//! Provides an Axum router exposing the scrape path (`/metrics` by default)
//! in Prometheus text exposition format, and a small server that runs it
//! until cancelled.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Registry, TEXT_FORMAT};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{MonitoringError, Result};
use crate::registry::encode_text;
use crate::types::MetricsConfig;

/// Build a router serving `registry` at `path`, plus `/health`.
///
/// The handlers only read metric values, so they can run concurrently with
/// the update jobs.
pub fn router(registry: Registry, path: &str) -> Result<Router> {
    if !path.starts_with('/') {
        return Err(MonitoringError::InvalidPath(path.to_string()));
    }

    Ok(build_router(registry, path))
}

pub(crate) fn build_router(registry: Registry, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(registry)
}

/// Handler for the scrape endpoint
///
/// Returns all metrics in Prometheus text exposition format
async fn metrics_handler(State(registry): State<Registry>) -> Response {
    debug!("Serving metrics");

    match encode_text(&registry) {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Handler for `/health` endpoint
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// HTTP server for the scrape endpoint
#[derive(Clone)]
pub struct MetricsServer {
    router: Router,
    config: MetricsConfig,
}

impl MetricsServer {
    /// Create a server for an already-built router
    pub fn new(router: Router, config: MetricsConfig) -> Self {
        Self { router, config }
    }

    /// Get the bind address for the server
    pub fn bind_address(&self) -> String {
        self.config.socket_addr()
    }

    /// Serve until `shutdown` is cancelled.
    ///
    /// Returns immediately when the server is disabled.
    ///
    /// # Example
    /// ```ignore
    /// let token = CancellationToken::new();
    /// let server = MetricsServer::new(client.handler(), MetricsConfig::with_port(2112));
    /// tokio::spawn(server.serve(token.clone()));
    /// ```
    pub async fn serve(self, shutdown: CancellationToken) -> anyhow::Result<()> {
        if !self.config.enabled {
            info!("Metrics server disabled");
            return Ok(());
        }

        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(&addr).await?;
        info!(
            "Metrics server listening on http://{}{}",
            listener.local_addr()?,
            self.config.path
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| anyhow::anyhow!("Metrics server error: {}", e))?;

        info!("Metrics server stopped");
        Ok(())
    }
}
