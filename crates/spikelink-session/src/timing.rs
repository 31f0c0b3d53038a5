use std::time::Duration;

use serde::Serialize;

/// Round-trip latencies in microseconds, one per tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatencyLog {
    samples_us: Vec<f64>,
}

impl LatencyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(ticks: usize) -> Self {
        Self {
            samples_us: Vec::with_capacity(ticks),
        }
    }

    /// Record one tick's round trip.
    pub fn record(&mut self, elapsed: Duration) {
        self.samples_us.push(elapsed.as_secs_f64() * 1e6);
    }

    /// Record a value already in microseconds.
    pub fn push_us(&mut self, micros: f64) {
        self.samples_us.push(micros);
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples_us
    }

    pub fn len(&self) -> usize {
        self.samples_us.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples_us.is_empty()
    }

    /// Arithmetic mean, or `None` when nothing was recorded.
    pub fn mean_us(&self) -> Option<f64> {
        if self.samples_us.is_empty() {
            return None;
        }
        Some(self.samples_us.iter().sum::<f64>() / self.samples_us.len() as f64)
    }

    /// Summary statistics, or `None` when nothing was recorded.
    pub fn summary(&self) -> Option<LatencySummary> {
        let mean_us = self.mean_us()?;

        let mut sorted = self.samples_us.clone();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let median_us = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };

        Some(LatencySummary {
            count,
            mean_us,
            median_us,
            min_us: sorted[0],
            max_us: sorted[count - 1],
            p99_us: nearest_rank(&sorted, 0.99),
        })
    }
}

/// Aggregate latency figures for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: usize,
    pub mean_us: f64,
    pub median_us: f64,
    pub min_us: f64,
    pub max_us: f64,
    pub p99_us: f64,
}

// Nearest-rank percentile over a non-empty sorted slice.
fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    let rank = (quantile * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
