//! Periodic update jobs.
//!
//! Every registered metric gets its own task on its own timer. A task calls
//! the metric's producer (or uses `0.0` when there is none) and applies the
//! descriptor's operation to the handle. All tasks share one cancellation
//! token and live in one [`JoinSet`], so shutdown cancels and joins them
//! together.

use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapter::MetricHandle;
use crate::descriptor::Producer;
use crate::error::{MonitoringError, Result};
use crate::types::Operation;

/// One metric's update job
pub(crate) struct Job {
    name: Arc<str>,
    handle: MetricHandle,
    operation: Operation,
    producer: Option<Producer>,
}

impl Job {
    pub(crate) fn new(
        name: &str,
        handle: MetricHandle,
        operation: Operation,
        producer: Option<Producer>,
    ) -> Self {
        Self {
            name: Arc::from(name),
            handle,
            operation,
            producer,
        }
    }

    /// Run one update. Producer failures and rejected values skip the tick
    /// and leave the metric unchanged.
    pub(crate) async fn tick(&self) {
        let value = match &self.producer {
            None => 0.0,
            Some(producer) => {
                let producer = producer.clone();
                match tokio::task::spawn_blocking(move || producer.produce()).await {
                    Ok(Ok(value)) => value,
                    Ok(Err(e)) => {
                        warn!(metric = %self.name, error = %e, "Producer failed, skipping tick");
                        return;
                    }
                    Err(e) => {
                        warn!(metric = %self.name, error = %e, "Producer panicked, skipping tick");
                        return;
                    }
                }
            }
        };

        match self.handle.apply(self.operation, value) {
            Ok(()) => debug!(
                metric = %self.name,
                operation = %self.operation,
                value,
                current = self.handle.value(),
                "Metric updated"
            ),
            Err(e) => warn!(metric = %self.name, error = %e, "Update rejected, skipping tick"),
        }
    }

    /// Tick every `period` until `token` is cancelled. The first tick fires
    /// one period after start; ticks missed while a slow producer runs are
    /// dropped rather than replayed.
    async fn run(self, period: Duration, token: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = self.tick() => {}
            }
        }

        debug!(metric = %self.name, "Update job stopped");
    }
}

/// Owner of the periodic update tasks
pub struct Scheduler {
    token: CancellationToken,
    tasks: JoinSet<()>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler with no tasks
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// Create a scheduler whose tasks stop when `token` is cancelled
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            tasks: JoinSet::new(),
        }
    }

    /// Start updating `handle` every `interval`. Returns immediately; the
    /// task runs on the current Tokio runtime until shutdown.
    pub fn schedule(
        &mut self,
        name: &str,
        handle: MetricHandle,
        interval: Duration,
        operation: Operation,
        producer: Option<Producer>,
    ) -> Result<()> {
        if interval.is_zero() {
            return Err(MonitoringError::InvalidInterval {
                metric: name.to_string(),
                interval,
            });
        }
        let runtime = Handle::try_current().map_err(|_| MonitoringError::NoRuntime)?;

        let job = Job::new(name, handle, operation, producer);
        self.tasks
            .spawn_on(job.run(interval, self.token.child_token()), &runtime);

        debug!(metric = name, ?interval, %operation, "Update job scheduled");
        Ok(())
    }

    /// Number of tasks still running
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no task is running
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Token cancelled on shutdown
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel every task and wait for all of them to finish
    pub async fn shutdown(&mut self) {
        self.token.cancel();

        let mut stopped = 0usize;
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Update job ended abnormally");
            }
            stopped += 1;
        }

        info!(jobs = stopped, "Scheduler stopped");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn gauge(name: &str) -> MetricHandle {
        MetricHandle::new(MetricKind::Gauge, name, "test").unwrap()
    }

    fn counter(name: &str) -> MetricHandle {
        MetricHandle::new(MetricKind::Counter, name, "test").unwrap()
    }

    #[tokio::test]
    async fn test_tick_without_producer_uses_zero() {
        let handle = gauge("tick_zero");
        handle.apply(Operation::Set, 5.0).unwrap();

        Job::new("tick_zero", handle.clone(), Operation::Set, None).tick().await;
        assert_eq!(handle.value(), 0.0);
    }

    #[tokio::test]
    async fn test_tick_set_from_producer() {
        let handle = gauge("tick_set");
        let job = Job::new(
            "tick_set",
            handle.clone(),
            Operation::Set,
            Some(Producer::constant(7.0)),
        );

        job.tick().await;
        assert_eq!(handle.value(), 7.0);
    }

    #[tokio::test]
    async fn test_failing_producer_keeps_previous_value() {
        let handle = gauge("tick_fail");
        handle.apply(Operation::Set, 3.0).unwrap();

        let job = Job::new(
            "tick_fail",
            handle.clone(),
            Operation::Set,
            Some(Producer::fallible(|| anyhow::bail!("source unavailable"))),
        );
        job.tick().await;
        assert_eq!(handle.value(), 3.0);
    }

    #[tokio::test]
    async fn test_panicking_producer_keeps_previous_value() {
        let handle = gauge("tick_panic");
        handle.apply(Operation::Set, 1.5).unwrap();

        let job = Job::new(
            "tick_panic",
            handle.clone(),
            Operation::Set,
            Some(Producer::new(|| panic!("producer bug"))),
        );
        job.tick().await;
        assert_eq!(handle.value(), 1.5);
    }

    #[tokio::test]
    async fn test_negative_counter_add_is_skipped() {
        let handle = counter("tick_negative");
        let job = Job::new(
            "tick_negative",
            handle.clone(),
            Operation::Add,
            Some(Producer::constant(-4.0)),
        );

        job.tick().await;
        assert_eq!(handle.value(), 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_after_one_interval() {
        let handle = counter("first_tick");
        let mut scheduler = Scheduler::new();
        scheduler
            .schedule(
                "first_tick",
                handle.clone(),
                Duration::from_secs(2),
                Operation::Increment,
                None,
            )
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1_900)).await;
        assert_eq!(handle.value(), 0.0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(handle.value(), 1.0);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_ticks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);

        let mut scheduler = Scheduler::new();
        scheduler
            .schedule(
                "stopping",
                gauge("stopping"),
                Duration::from_secs(1),
                Operation::Set,
                Some(Producer::new(move || {
                    counted.fetch_add(1, Ordering::SeqCst);
                    1.0
                })),
            )
            .unwrap();
        assert_eq!(scheduler.len(), 1);

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        scheduler.shutdown().await;
        assert!(scheduler.is_empty());

        let after_shutdown = calls.load(Ordering::SeqCst);
        assert!(after_shutdown >= 1);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_shutdown);
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let mut scheduler = Scheduler::new();
        let result = scheduler.schedule(
            "zero",
            gauge("zero"),
            Duration::ZERO,
            Operation::Set,
            None,
        );
        assert!(matches!(result, Err(MonitoringError::InvalidInterval { .. })));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_schedule_outside_runtime() {
        let mut scheduler = Scheduler::new();
        let result = scheduler.schedule(
            "no_runtime",
            gauge("no_runtime"),
            Duration::from_secs(1),
            Operation::Set,
            None,
        );
        assert!(matches!(result, Err(MonitoringError::NoRuntime)));
    }
}
