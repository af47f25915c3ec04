//! Error type shared by the SDK modules

use std::time::Duration;
use thiserror::Error;

use crate::types::{MetricKind, Operation};

/// Errors returned while declaring, registering or updating metrics
#[derive(Error, Debug)]
pub enum MonitoringError {
    /// Backend name not recognized
    #[error("Unknown metric backend: {0}")]
    UnknownBackend(String),

    /// Metric kind name not recognized
    #[error("Unknown metric kind: {0}. Expected counter or gauge")]
    UnknownMetricKind(String),

    /// Operation name not recognized
    #[error("Unknown operation: {0}. Expected one of: set, add, sub, increment, decrement")]
    UnknownOperation(String),

    /// Operation not allowed for the metric kind
    #[error("Metric '{metric}' is a {kind} and cannot use the '{operation}' operation")]
    IncompatibleOperation {
        metric: String,
        kind: MetricKind,
        operation: Operation,
    },

    /// Operation applied to a handle that cannot perform it
    #[error("A {kind} does not support the '{operation}' operation")]
    UnsupportedOperation {
        kind: MetricKind,
        operation: Operation,
    },

    /// Counter increment that is negative or not finite
    #[error("Counter cannot be increased by {0}; increments must be finite and non-negative")]
    NegativeCounterIncrement(f64),

    /// Zero update interval
    #[error("Metric '{metric}' has an invalid update interval {interval:?}; it must be greater than zero")]
    InvalidInterval { metric: String, interval: Duration },

    /// Producer name missing from the catalog
    #[error("Metric '{metric}' refers to unknown producer '{producer}'")]
    UnknownProducer { metric: String, producer: String },

    /// Metric name already registered
    #[error("Metric '{0}' is already registered")]
    DuplicateMetric(String),

    /// Scrape path not starting with `/`
    #[error("Invalid scrape path '{0}'; it must start with '/'")]
    InvalidPath(String),

    /// Scheduling attempted outside a Tokio runtime
    #[error("Metrics can only be scheduled from within a Tokio runtime")]
    NoRuntime,

    /// Error from the Prometheus client
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] monitoring_config::ConfigError),
}

/// Result alias for SDK operations
pub type Result<T> = std::result::Result<T, MonitoringError>;
