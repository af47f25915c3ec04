//! Metric descriptors: what to register and how to keep it up to date

use monitoring_config::MetricSpec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{MonitoringError, Result};
use crate::types::{CounterOperation, MetricKind, Operation};

type ProducerFn = dyn Fn() -> anyhow::Result<f64> + Send + Sync;

/// Zero-argument function supplying the value applied on each tick.
///
/// Producers run on the blocking thread pool, so a slow one only delays its
/// own metric.
#[derive(Clone)]
pub struct Producer(Arc<ProducerFn>);

impl Producer {
    /// Wrap an infallible function
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> f64 + Send + Sync + 'static,
    {
        Producer(Arc::new(move || Ok(f())))
    }

    /// Wrap a function that may fail; a failure skips the tick
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn() -> anyhow::Result<f64> + Send + Sync + 'static,
    {
        Producer(Arc::new(f))
    }

    /// Always produce `value`
    pub fn constant(value: f64) -> Self {
        Producer::new(move || value)
    }

    /// Call the function
    pub fn produce(&self) -> anyhow::Result<f64> {
        (self.0)()
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Producer(..)")
    }
}

/// Named producers that configuration files can refer to
#[derive(Debug, Clone, Default)]
pub struct ProducerCatalog {
    producers: HashMap<String, Producer>,
}

impl ProducerCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `producer` under `name`, replacing any previous entry
    pub fn register(&mut self, name: impl Into<String>, producer: Producer) -> &mut Self {
        self.producers.insert(name.into(), producer);
        self
    }

    /// Look up a producer
    pub fn get(&self, name: &str) -> Option<&Producer> {
        self.producers.get(name)
    }
}

/// A metric kind paired with an operation it supports.
///
/// Only valid combinations can be constructed: counters carry a
/// [`CounterOperation`], gauges any [`Operation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricBinding {
    /// Counter updated with `add` or `increment`
    Counter(CounterOperation),
    /// Gauge updated with any operation
    Gauge(Operation),
}

impl MetricBinding {
    /// Pair `kind` with `operation`, returning `None` when the kind cannot
    /// apply it
    pub fn new(kind: MetricKind, operation: Operation) -> Option<Self> {
        match kind {
            MetricKind::Counter => CounterOperation::try_from(operation)
                .ok()
                .map(MetricBinding::Counter),
            MetricKind::Gauge => Some(MetricBinding::Gauge(operation)),
        }
    }

    /// Metric kind
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricBinding::Counter(_) => MetricKind::Counter,
            MetricBinding::Gauge(_) => MetricKind::Gauge,
        }
    }

    /// Operation applied on every tick
    pub fn operation(&self) -> Operation {
        match *self {
            MetricBinding::Counter(op) => op.into(),
            MetricBinding::Gauge(op) => op,
        }
    }
}

/// Static description of one metric.
///
/// # Example
///
/// ```ignore
/// use monitoring_sdk::{CounterOperation, MetricDescriptor, Operation, Producer};
/// use std::time::Duration;
///
/// let jobs = MetricDescriptor::counter(
///     "jobs_processed_total",
///     "Jobs processed",
///     CounterOperation::Increment,
///     Duration::from_secs(5),
/// );
/// let depth = MetricDescriptor::gauge(
///     "queue_depth",
///     "Items waiting in the queue",
///     Operation::Set,
///     Duration::from_secs(1),
/// )
/// .with_producer(Producer::new(|| 42.0));
/// ```
#[derive(Debug, Clone)]
pub struct MetricDescriptor {
    name: String,
    description: String,
    binding: MetricBinding,
    interval: Duration,
    producer: Option<Producer>,
}

impl MetricDescriptor {
    /// Declare a counter
    pub fn counter(
        name: impl Into<String>,
        description: impl Into<String>,
        operation: CounterOperation,
        interval: Duration,
    ) -> Self {
        Self::with_binding(name, description, MetricBinding::Counter(operation), interval)
    }

    /// Declare a gauge
    pub fn gauge(
        name: impl Into<String>,
        description: impl Into<String>,
        operation: Operation,
        interval: Duration,
    ) -> Self {
        Self::with_binding(name, description, MetricBinding::Gauge(operation), interval)
    }

    /// Declare a metric from runtime data, checking the kind/operation pair
    /// and the interval.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        kind: MetricKind,
        operation: Operation,
        interval: Duration,
    ) -> Result<Self> {
        let name = name.into();

        let binding = MetricBinding::new(kind, operation).ok_or_else(|| {
            MonitoringError::IncompatibleOperation {
                metric: name.clone(),
                kind,
                operation,
            }
        })?;

        if interval.is_zero() {
            return Err(MonitoringError::InvalidInterval {
                metric: name,
                interval,
            });
        }

        Ok(Self::with_binding(name, description, binding, interval))
    }

    /// Build a descriptor from a configuration entry.
    ///
    /// `producer` names are resolved against `catalog`; a `value` becomes a
    /// constant producer.
    pub fn from_spec(spec: &MetricSpec, catalog: &ProducerCatalog) -> Result<Self> {
        let kind: MetricKind = spec.kind.parse()?;
        let operation: Operation = spec.operation.parse()?;
        let descriptor = Self::new(&spec.name, &spec.help, kind, operation, spec.interval())?;

        let producer = match (&spec.producer, spec.value) {
            (Some(name), _) => Some(catalog.get(name).cloned().ok_or_else(|| {
                MonitoringError::UnknownProducer {
                    metric: spec.name.clone(),
                    producer: name.clone(),
                }
            })?),
            (None, Some(value)) => Some(Producer::constant(value)),
            (None, None) => None,
        };

        Ok(match producer {
            Some(producer) => descriptor.with_producer(producer),
            None => descriptor,
        })
    }

    fn with_binding(
        name: impl Into<String>,
        description: impl Into<String>,
        binding: MetricBinding,
        interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            binding,
            interval,
            producer: None,
        }
    }

    /// Attach the value producer
    pub fn with_producer(mut self, producer: Producer) -> Self {
        self.producer = Some(producer);
        self
    }

    /// Metric name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Help text
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Kind and operation
    pub fn binding(&self) -> MetricBinding {
        self.binding
    }

    /// Metric kind
    pub fn kind(&self) -> MetricKind {
        self.binding.kind()
    }

    /// Operation applied on every tick
    pub fn operation(&self) -> Operation {
        self.binding.operation()
    }

    /// Update interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Value producer, if any
    pub fn producer(&self) -> Option<&Producer> {
        self.producer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: &str, operation: &str) -> MetricSpec {
        MetricSpec {
            name: "requests".to_string(),
            help: "requests seen".to_string(),
            kind: kind.to_string(),
            operation: operation.to_string(),
            interval_ms: 500,
            producer: None,
            value: None,
        }
    }

    #[test]
    fn test_binding_rejects_counter_set() {
        assert_eq!(MetricBinding::new(MetricKind::Counter, Operation::Set), None);
        assert_eq!(
            MetricBinding::new(MetricKind::Counter, Operation::Add),
            Some(MetricBinding::Counter(CounterOperation::Add))
        );
        assert_eq!(
            MetricBinding::new(MetricKind::Gauge, Operation::Decrement)
                .map(|b| b.operation()),
            Some(Operation::Decrement)
        );
    }

    #[test]
    fn test_new_incompatible_operation() {
        for op in [Operation::Set, Operation::Sub, Operation::Decrement] {
            let err = MetricDescriptor::new("c", "", MetricKind::Counter, op, Duration::from_secs(1))
                .unwrap_err();
            assert!(matches!(
                err,
                MonitoringError::IncompatibleOperation { kind: MetricKind::Counter, operation, .. }
                    if operation == op
            ));
        }
    }

    #[test]
    fn test_new_zero_interval() {
        let err = MetricDescriptor::new("g", "", MetricKind::Gauge, Operation::Set, Duration::ZERO)
            .unwrap_err();
        assert!(matches!(err, MonitoringError::InvalidInterval { .. }));
    }

    #[test]
    fn test_typed_constructors() {
        let counter = MetricDescriptor::counter(
            "jobs_total",
            "jobs",
            CounterOperation::Increment,
            Duration::from_secs(5),
        );
        assert_eq!(counter.kind(), MetricKind::Counter);
        assert_eq!(counter.operation(), Operation::Increment);
        assert!(counter.producer().is_none());

        let gauge = MetricDescriptor::gauge("depth", "queue", Operation::Sub, Duration::from_secs(1))
            .with_producer(Producer::constant(2.5));
        assert_eq!(gauge.producer().unwrap().produce().unwrap(), 2.5);
    }

    #[test]
    fn test_from_spec_constant_value() {
        let mut spec = spec("counter", "add");
        spec.value = Some(3.0);
        let descriptor = MetricDescriptor::from_spec(&spec, &ProducerCatalog::new()).unwrap();
        assert_eq!(descriptor.interval(), Duration::from_millis(500));
        assert_eq!(descriptor.producer().unwrap().produce().unwrap(), 3.0);
    }

    #[test]
    fn test_from_spec_named_producer() {
        let mut catalog = ProducerCatalog::new();
        catalog.register("load", Producer::new(|| 0.75));

        let mut spec = spec("gauge", "set");
        spec.producer = Some("load".to_string());
        let descriptor = MetricDescriptor::from_spec(&spec, &catalog).unwrap();
        assert_eq!(descriptor.producer().unwrap().produce().unwrap(), 0.75);

        spec.producer = Some("missing".to_string());
        assert!(matches!(
            MetricDescriptor::from_spec(&spec, &catalog),
            Err(MonitoringError::UnknownProducer { producer, .. }) if producer == "missing"
        ));
    }

    #[test]
    fn test_from_spec_incompatible() {
        assert!(matches!(
            MetricDescriptor::from_spec(&spec("counter", "decrement"), &ProducerCatalog::new()),
            Err(MonitoringError::IncompatibleOperation { .. })
        ));
        assert!(matches!(
            MetricDescriptor::from_spec(&spec("summary", "set"), &ProducerCatalog::new()),
            Err(MonitoringError::UnknownMetricKind(_))
        ));
    }

    #[test]
    fn test_fallible_producer() {
        let producer = Producer::fallible(|| anyhow::bail!("sensor offline"));
        assert!(producer.produce().is_err());
    }
}
