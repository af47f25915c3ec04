//! Random sample source feeding the demo gauge

use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Default)]
struct Totals {
    count: u64,
    sum: f64,
}

/// Running count and sum of the samples received so far
#[derive(Debug, Clone, Default)]
pub struct SampleStats {
    totals: Arc<Mutex<Totals>>,
}

impl SampleStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample
    pub fn record(&self, value: f64) {
        let mut totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
        totals.count += 1;
        totals.sum += value;
    }

    /// Mean of the samples, `0.0` before the first one
    pub fn average(&self) -> f64 {
        let totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
        if totals.count == 0 {
            0.0
        } else {
            totals.sum / totals.count as f64
        }
    }

    /// Number of samples recorded
    pub fn count(&self) -> u64 {
        self.totals.lock().unwrap_or_else(|e| e.into_inner()).count
    }

    /// Mean of the samples recorded since the previous call, then start a
    /// new window. An empty window reads as `0.0`.
    pub fn take_average(&self) -> f64 {
        let mut totals = self.totals.lock().unwrap_or_else(|e| e.into_inner());
        let average = if totals.count == 0 {
            0.0
        } else {
            totals.sum / totals.count as f64
        };
        *totals = Totals::default();
        average
    }
}

/// One sample: a whole number in `0..=5`
pub fn random_sample() -> f64 {
    f64::from(rand::thread_rng().gen_range(0..=5u8))
}

/// Spawn a generator producing a random sample in `0..=5` every `period`
/// and a listener folding them into `stats`. Both stop on `token`.
pub fn spawn(stats: SampleStats, period: Duration, token: CancellationToken) {
    let (tx, mut rx) = mpsc::channel::<f64>(16);

    let generator_token = token.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = generator_token.cancelled() => break,
                _ = ticker.tick() => {
                    if tx.send(random_sample()).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                value = rx.recv() => match value {
                    Some(value) => {
                        stats.record(value);
                        debug!(
                            value,
                            samples = stats.count(),
                            average = stats.average(),
                            "Sample received"
                        );
                    }
                    None => break,
                },
            }
        }
    });
}
