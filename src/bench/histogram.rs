use std::time::Duration;

use hdrhistogram::Histogram;

/// Latency histogram with microsecond resolution.
#[derive(Debug)]
pub(crate) struct LatencyHistogram {
    hist: Histogram<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Percentiles {
    pub p50: Duration,
    pub p90: Duration,
    pub p99: Duration,
}

impl LatencyHistogram {
    /// Create a new latency histogram.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram cannot be created.
    pub(crate) fn new() -> Result<Self, String> {
        let hist = Histogram::<u64>::new(3)
            .map_err(|err| format!("Failed to create histogram: {}", err))?;
        Ok(Self { hist })
    }

    /// Record one latency sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be recorded.
    pub(crate) fn record(&mut self, latency: Duration) -> Result<(), String> {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.hist
            .record(micros.max(1))
            .map_err(|err| format!("Failed to record latency: {}", err))
    }

    pub(crate) fn count(&self) -> u64 {
        self.hist.len()
    }

    pub(crate) fn percentiles(&self) -> Option<Percentiles> {
        if self.count() == 0 {
            return None;
        }
        Some(Percentiles {
            p50: Duration::from_micros(self.hist.value_at_quantile(0.5)),
            p90: Duration::from_micros(self.hist.value_at_quantile(0.9)),
            p99: Duration::from_micros(self.hist.value_at_quantile(0.99)),
        })
    }
}
