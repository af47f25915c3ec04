//! Prometheus metric handles and operation dispatch.
//!
//! [`MetricHandle`] is a tagged variant over the two supported metric
//! types. Each variant only exposes the mutators the underlying Prometheus
//! primitive has; [`MetricHandle::apply`] maps the generic [`Operation`]
//! vocabulary onto them and rejects what a counter cannot do.

use prometheus::{core::Collector, Counter, Gauge, Opts};

use crate::error::{MonitoringError, Result};
use crate::types::{MetricKind, Operation};

/// Monotonic counter
#[derive(Clone)]
pub struct CounterHandle {
    inner: Counter,
}

impl CounterHandle {
    fn new(opts: Opts) -> Result<Self> {
        Ok(Self {
            inner: Counter::with_opts(opts)?,
        })
    }

    /// Add one
    pub fn inc(&self) {
        self.inner.inc();
    }

    /// Add `value`; negative or non-finite increments are rejected and
    /// leave the counter untouched
    pub fn add(&self, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(MonitoringError::NegativeCounterIncrement(value));
        }
        self.inner.inc_by(value);
        Ok(())
    }

    /// Current value
    pub fn get(&self) -> f64 {
        self.inner.get()
    }
}

/// Gauge that can move in both directions
#[derive(Clone)]
pub struct GaugeHandle {
    inner: Gauge,
}

impl GaugeHandle {
    fn new(opts: Opts) -> Result<Self> {
        Ok(Self {
            inner: Gauge::with_opts(opts)?,
        })
    }

    /// Replace the value
    pub fn set(&self, value: f64) {
        self.inner.set(value);
    }

    /// Add `value`
    pub fn add(&self, value: f64) {
        self.inner.add(value);
    }

    /// Subtract `value`
    pub fn sub(&self, value: f64) {
        self.inner.sub(value);
    }

    /// Add one
    pub fn inc(&self) {
        self.inner.inc();
    }

    /// Subtract one
    pub fn dec(&self) {
        self.inner.dec();
    }

    /// Current value
    pub fn get(&self) -> f64 {
        self.inner.get()
    }
}

/// Live metric created for one descriptor
#[derive(Clone)]
pub enum MetricHandle {
    /// Counter handle
    Counter(CounterHandle),
    /// Gauge handle
    Gauge(GaugeHandle),
}

impl MetricHandle {
    /// Create an unregistered metric of `kind`.
    ///
    /// Prometheus rejects empty help text, so the name doubles as help when
    /// `help` is empty.
    pub fn new(kind: MetricKind, name: &str, help: &str) -> Result<Self> {
        let help = if help.is_empty() { name } else { help };
        let opts = Opts::new(name, help);

        match kind {
            MetricKind::Counter => CounterHandle::new(opts).map(MetricHandle::Counter),
            MetricKind::Gauge => GaugeHandle::new(opts).map(MetricHandle::Gauge),
        }
    }

    /// Metric kind
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricHandle::Counter(_) => MetricKind::Counter,
            MetricHandle::Gauge(_) => MetricKind::Gauge,
        }
    }

    /// Current value
    pub fn value(&self) -> f64 {
        match self {
            MetricHandle::Counter(counter) => counter.get(),
            MetricHandle::Gauge(gauge) => gauge.get(),
        }
    }

    /// Apply `operation` with `value`.
    ///
    /// `value` is ignored by `Increment` and `Decrement`. Counters return
    /// [`MonitoringError::UnsupportedOperation`] for `Set`, `Sub` and
    /// `Decrement`.
    pub fn apply(&self, operation: Operation, value: f64) -> Result<()> {
        match self {
            MetricHandle::Gauge(gauge) => {
                match operation {
                    Operation::Set => gauge.set(value),
                    Operation::Add => gauge.add(value),
                    Operation::Sub => gauge.sub(value),
                    Operation::Increment => gauge.inc(),
                    Operation::Decrement => gauge.dec(),
                }
                Ok(())
            }
            MetricHandle::Counter(counter) => match operation {
                Operation::Increment => {
                    counter.inc();
                    Ok(())
                }
                Operation::Add => counter.add(value),
                Operation::Set | Operation::Sub | Operation::Decrement => {
                    Err(MonitoringError::UnsupportedOperation {
                        kind: MetricKind::Counter,
                        operation,
                    })
                }
            },
        }
    }

    /// Boxed collector for registration with a Prometheus registry
    pub(crate) fn collector(&self) -> Box<dyn Collector> {
        match self {
            MetricHandle::Counter(counter) => Box::new(counter.inner.clone()),
            MetricHandle::Gauge(gauge) => Box::new(gauge.inner.clone()),
        }
    }
}
