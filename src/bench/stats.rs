use std::time::Duration;

use tracing::warn;

use super::histogram::{LatencyHistogram, Percentiles};

/// Floor applied to elapsed times before dividing, so a run the clock could not
/// resolve still yields a finite rate.
const MIN_ELAPSED: Duration = Duration::from_nanos(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySummary {
    pub min: Duration,
    pub max: Duration,
    pub avg: Duration,
    pub total: Duration,
    pub percentiles: Option<Percentiles>,
}

impl LatencySummary {
    pub(crate) fn from_samples(samples: &[Duration]) -> Self {
        let total = samples
            .iter()
            .fold(Duration::ZERO, |acc, sample| acc.saturating_add(*sample));
        let min = samples.iter().copied().min().unwrap_or_default();
        let max = samples.iter().copied().max().unwrap_or_default();
        let count = u32::try_from(samples.len()).unwrap_or(u32::MAX);
        let avg = total.checked_div(count).unwrap_or_default();

        Self {
            min,
            max,
            avg,
            total,
            percentiles: percentiles_of(samples),
        }
    }
}

fn percentiles_of(samples: &[Duration]) -> Option<Percentiles> {
    let mut hist = match LatencyHistogram::new() {
        Ok(hist) => hist,
        Err(err) => {
            warn!("{}", err);
            return None;
        }
    };
    for sample in samples {
        if let Err(err) = hist.record(*sample) {
            warn!("{}", err);
            return None;
        }
    }
    hist.percentiles()
}

/// Baseline measured over one reused connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequentialStats {
    pub requests: usize,
    pub requests_per_second: f64,
    pub latency: LatencySummary,
}

impl SequentialStats {
    pub(crate) fn from_samples(samples: &[Duration]) -> Self {
        let latency = LatencySummary::from_samples(samples);
        Self {
            requests: samples.len(),
            requests_per_second: requests_per_second(samples.len(), latency.total),
            latency,
        }
    }
}

/// Throughput of the concurrent drain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcurrentStats {
    pub requests: usize,
    pub requests_per_second: f64,
    pub duration: Duration,
}

impl ConcurrentStats {
    pub(crate) fn new(requests: usize, duration: Duration) -> Self {
        Self {
            requests,
            requests_per_second: requests_per_second(requests, duration),
            duration,
        }
    }
}

/// Final record of one successful run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunResult {
    pub sequential: SequentialStats,
    pub concurrent: ConcurrentStats,
    /// Sequential req/s plus concurrent req/s, unrounded.
    pub score: f64,
    /// Wall clock of the whole run, probe included.
    pub took: Duration,
}

impl RunResult {
    pub(crate) fn aggregate(
        sequential: SequentialStats,
        concurrent: ConcurrentStats,
        took: Duration,
    ) -> Self {
        Self {
            score: sequential.requests_per_second + concurrent.requests_per_second,
            sequential,
            concurrent,
            took,
        }
    }
}

pub(crate) fn requests_per_second(count: usize, elapsed: Duration) -> f64 {
    let count = u32::try_from(count).map_or(f64::from(u32::MAX), f64::from);
    count / elapsed.max(MIN_ELAPSED).as_secs_f64()
}
