//! Client facade: the entry point applications use

use axum::Router;
use monitoring_config::Config;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::descriptor::{MetricDescriptor, ProducerCatalog};
use crate::error::{MonitoringError, Result};
use crate::registry::{MetricsRegistry, RegisteredMetric};
use crate::scheduler::Scheduler;
use crate::server;
use crate::types::Backend;

/// Registers metrics with a backend, keeps them updated, and hands out the
/// scrape handler.
///
/// # Example
///
/// ```ignore
/// use monitoring_sdk::{Backend, Client, CounterOperation, MetricDescriptor};
/// use std::time::Duration;
///
/// let mut client = Client::new(Backend::Prometheus);
/// client.init(vec![MetricDescriptor::counter(
///     "heartbeat_total",
///     "incremented every five seconds",
///     CounterOperation::Increment,
///     Duration::from_secs(5),
/// )])?;
///
/// let app = client.handler();
/// axum::serve(listener, app).await?;
/// ```
pub struct Client {
    backend: Backend,
    registry: MetricsRegistry,
    scheduler: Scheduler,
}

impl Client {
    /// Create a client for `backend`
    pub fn new(backend: Backend) -> Self {
        let registry = match backend {
            Backend::Prometheus => MetricsRegistry::new(),
        };

        Self {
            backend,
            registry,
            scheduler: Scheduler::new(),
        }
    }

    /// Create a client from a backend name such as `"prometheus"`.
    ///
    /// Unknown names fail with [`crate::MonitoringError::UnknownBackend`].
    pub fn from_name(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    /// Register `descriptors` and start their update jobs.
    ///
    /// Must be called from within a Tokio runtime. Returns without waiting
    /// for any tick.
    pub fn init(&mut self, descriptors: Vec<MetricDescriptor>) -> Result<()> {
        info!(
            backend = self.backend.as_label(),
            metrics = descriptors.len(),
            "Initializing metrics"
        );
        self.registry.initialize(descriptors, &mut self.scheduler)
    }

    /// Register the metrics declared in `config`, resolving producer names
    /// against `catalog`.
    ///
    /// Every declaration is converted before anything is registered, so a
    /// bad entry leaves the client untouched.
    pub fn init_from_config(&mut self, config: &Config, catalog: &ProducerCatalog) -> Result<()> {
        let backend: Backend = config.backend.parse()?;
        if backend != self.backend {
            return Err(MonitoringError::UnknownBackend(format!(
                "{} (client was created for {})",
                config.backend,
                self.backend.as_label()
            )));
        }

        let descriptors = config
            .metrics
            .iter()
            .map(|spec| MetricDescriptor::from_spec(spec, catalog))
            .collect::<Result<Vec<_>>>()?;

        self.init(descriptors)
    }

    /// Router serving the scrape endpoint at `/metrics` and `/health`
    pub fn handler(&self) -> Router {
        server::build_router(self.registry.registry().clone(), "/metrics")
    }

    /// Router serving the scrape endpoint at `path`
    pub fn handler_at(&self, path: &str) -> Result<Router> {
        server::router(self.registry.registry().clone(), path)
    }

    /// Selected backend
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Registered metrics
    pub fn metrics(&self) -> &[RegisteredMetric] {
        self.registry.metrics()
    }

    /// Descriptors of the registered metrics
    pub fn descriptors(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.registry.metrics().iter().map(RegisteredMetric::descriptor)
    }

    /// Underlying registry
    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }

    /// Token cancelled when the client shuts down; share it with the HTTP
    /// server to stop both together.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.scheduler.cancellation_token()
    }

    /// Stop every update job and wait for them to finish
    pub async fn shutdown(mut self) {
        self.scheduler.shutdown().await;
    }
}
