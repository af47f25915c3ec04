//! Monitoring SDK
//!
//! Declare counters and gauges once, let the SDK keep them updated on a
//! schedule, and serve them on a Prometheus scrape endpoint.
//!
//! # Features
//!
//! - **Declarative metrics**: a [`MetricDescriptor`] names the metric, its
//!   kind, the operation applied on each tick, the interval and the value
//!   producer
//! - **Capability checks**: counters only accept `add` and `increment`; the
//!   typed constructors make other pairs unrepresentable and data-driven
//!   declarations are checked once, at load time
//! - **Independent schedules**: one task per metric, cancelled and joined on
//!   shutdown
//! - **HTTP Endpoint**: Axum-based `/metrics` endpoint for scraping
//!
//! # Example
//!
//! ```ignore
//! use monitoring_sdk::{
//!     Backend, Client, CounterOperation, MetricDescriptor, MetricsConfig, MetricsServer,
//!     Operation, Producer,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut client = Client::new(Backend::Prometheus);
//!     client.init(vec![
//!         MetricDescriptor::gauge("queue_depth", "Items waiting", Operation::Set, Duration::from_secs(3))
//!             .with_producer(Producer::new(|| 12.0)),
//!         MetricDescriptor::counter(
//!             "heartbeat_total",
//!             "Incremented every five seconds",
//!             CounterOperation::Increment,
//!             Duration::from_secs(5),
//!         ),
//!     ])?;
//!
//!     let server = MetricsServer::new(client.handler(), MetricsConfig::with_port(2112));
//!     server.serve(client.cancellation_token()).await
//! }
//! ```

pub mod adapter;
pub mod client;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod server;
pub mod types;

pub use adapter::{CounterHandle, GaugeHandle, MetricHandle};
pub use client::Client;
pub use descriptor::{MetricBinding, MetricDescriptor, Producer, ProducerCatalog};
pub use error::{MonitoringError, Result};
pub use registry::{MetricsRegistry, RegisteredMetric};
pub use scheduler::Scheduler;
pub use server::MetricsServer;
pub use types::{Backend, CounterOperation, MetricKind, MetricsConfig, Operation};
