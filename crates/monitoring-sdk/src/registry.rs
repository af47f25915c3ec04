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
//! Registry of the metrics declared at start-up

use prometheus::{Registry, TextEncoder};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::adapter::MetricHandle;
use crate::descriptor::MetricDescriptor;
use crate::error::{MonitoringError, Result};
use crate::scheduler::Scheduler;

/// A descriptor together with the live metric created for it
#[derive(Clone)]
pub struct RegisteredMetric {
    descriptor: MetricDescriptor,
    handle: MetricHandle,
}

impl RegisteredMetric {
    /// Static description
    pub fn descriptor(&self) -> &MetricDescriptor {
        &self.descriptor
    }

    /// Live metric
    pub fn handle(&self) -> &MetricHandle {
        &self.handle
    }
}

/// Owns the Prometheus registry and one handle per declared metric.
///
/// Handles are written only by their scheduled job; rendering reads them
/// through the Prometheus registry, whose primitives are atomic.
pub struct MetricsRegistry {
    /// Prometheus registry
    registry: Registry,

    /// Registered metrics in declaration order
    metrics: Vec<RegisteredMetric>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            metrics: Vec::new(),
        }
    }

    /// Get reference to Prometheus registry for gathering metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Create and register one handle per descriptor, then schedule their
    /// update jobs.
    ///
    /// Either every descriptor is registered and scheduled, or none is: on
    /// the first invalid descriptor the handles created by this call are
    /// unregistered and the error returned. Names already registered by a
    /// previous call are rejected with [`MonitoringError::DuplicateMetric`].
    pub fn initialize(
        &mut self,
        descriptors: Vec<MetricDescriptor>,
        scheduler: &mut Scheduler,
    ) -> Result<()> {
        let mut created: Vec<RegisteredMetric> = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            match self.register(&descriptor) {
                Ok(handle) => created.push(RegisteredMetric { descriptor, handle }),
                Err(e) => {
                    self.rollback(&created);
                    return Err(e);
                }
            }
        }

        for metric in &created {
            let descriptor = &metric.descriptor;
            if let Err(e) = scheduler.schedule(
                descriptor.name(),
                metric.handle.clone(),
                descriptor.interval(),
                descriptor.operation(),
                descriptor.producer().cloned(),
            ) {
                // Only a missing runtime can fail here, and it fails on the
                // first job, before anything is running.
                self.rollback(&created);
                return Err(e);
            }
        }

        info!(count = created.len(), "Metrics registered");
        self.metrics.extend(created);
        Ok(())
    }

    /// Create the handle for `descriptor` and register it with Prometheus
    fn register(&self, descriptor: &MetricDescriptor) -> Result<MetricHandle> {
        if descriptor.interval().is_zero() {
            return Err(MonitoringError::InvalidInterval {
                metric: descriptor.name().to_string(),
                interval: descriptor.interval(),
            });
        }

        let handle = MetricHandle::new(
            descriptor.kind(),
            descriptor.name(),
            descriptor.description(),
        )?;

        self.registry
            .register(handle.collector())
            .map_err(|e| match e {
                prometheus::Error::AlreadyReg => {
                    MonitoringError::DuplicateMetric(descriptor.name().to_string())
                }
                other => MonitoringError::Prometheus(other),
            })?;

        debug!(
            metric = descriptor.name(),
            kind = %descriptor.kind(),
            operation = %descriptor.operation(),
            interval = ?descriptor.interval(),
            "Metric registered"
        );
        Ok(handle)
    }

    fn rollback(&self, created: &[RegisteredMetric]) {
        for metric in created {
            // Unregistering a collector that was just registered cannot fail.
            let _ = self.registry.unregister(metric.handle.collector());
        }
    }

    /// Registered metrics in declaration order
    pub fn metrics(&self) -> &[RegisteredMetric] {
        &self.metrics
    }

    /// Look up a metric by name
    pub fn get(&self, name: &str) -> Option<&RegisteredMetric> {
        self.metrics.iter().find(|m| m.descriptor.name() == name)
    }

    /// Names of all registered metrics
    pub fn names(&self) -> HashSet<&str> {
        self.metrics.iter().map(|m| m.descriptor.name()).collect()
    }

    /// Render every registered metric in Prometheus text format
    pub fn encode(&self) -> Result<String> {
        encode_text(&self.registry)
    }
}

/// Render `registry` in Prometheus text exposition format
pub(crate) fn encode_text(registry: &Registry) -> Result<String> {
    let metric_families = registry.gather();
    Ok(TextEncoder::new().encode_to_string(&metric_families)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Producer;
    use crate::types::{CounterOperation, MetricKind, Operation};
    use std::time::Duration;

    fn gauge(name: &str) -> MetricDescriptor {
        MetricDescriptor::gauge(name, "test gauge", Operation::Set, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_initialize_registers_and_schedules() {
        let mut registry = MetricsRegistry::new();
        let mut scheduler = Scheduler::new();

        registry
            .initialize(
                vec![
                    gauge("registry_gauge"),
                    MetricDescriptor::counter(
                        "registry_counter",
                        "test counter",
                        CounterOperation::Increment,
                        Duration::from_secs(1),
                    ),
                ],
                &mut scheduler,
            )
            .unwrap();

        assert_eq!(registry.metrics().len(), 2);
        assert_eq!(scheduler.len(), 2);
        assert_eq!(
            registry.get("registry_counter").unwrap().handle().kind(),
            MetricKind::Counter
        );
        assert!(registry.names().contains("registry_gauge"));

        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_initial_render_reports_zero() {
        let mut registry = MetricsRegistry::new();
        let mut scheduler = Scheduler::new();
        registry
            .initialize(
                vec![gauge("zero_gauge").with_producer(Producer::constant(9.0))],
                &mut scheduler,
            )
            .unwrap();

        let text = registry.encode().unwrap();
        assert!(text.contains("# HELP zero_gauge test gauge"));
        assert!(text.contains("# TYPE zero_gauge gauge"));
        assert!(text.contains("zero_gauge 0"));

        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn test_duplicate_in_one_batch_rolls_back() {
        let mut registry = MetricsRegistry::new();
        let mut scheduler = Scheduler::new();

        let result = registry.initialize(
            vec![gauge("first"), gauge("dup"), gauge("dup")],
            &mut scheduler,
        );

        assert!(matches!(result, Err(MonitoringError::DuplicateMetric(name)) if name == "dup"));
        assert!(registry.metrics().is_empty());
        assert!(scheduler.is_empty());
        assert!(registry.registry().gather().is_empty());
    }

    #[tokio::test]
    async fn test_second_initialize_with_same_names_fails() {
        let mut registry = MetricsRegistry::new();
        let mut scheduler = Scheduler::new();

        registry
            .initialize(vec![gauge("again")], &mut scheduler)
            .unwrap();
        let result = registry.initialize(vec![gauge("again")], &mut scheduler);

        assert!(matches!(result, Err(MonitoringError::DuplicateMetric(_))));
        assert_eq!(registry.metrics().len(), 1);
        assert_eq!(scheduler.len(), 1);

        scheduler.shutdown().await;
    }

    #[test]
    fn test_initialize_without_runtime_registers_nothing() {
        let mut registry = MetricsRegistry::new();
        let mut scheduler = Scheduler::new();

        let result = registry.initialize(vec![gauge("offline")], &mut scheduler);

        assert!(matches!(result, Err(MonitoringError::NoRuntime)));
        assert!(registry.metrics().is_empty());
        assert!(registry.registry().gather().is_empty());
    }
}
