//! Benchmark execution engine.
//!
//! A run is configured through [`BenchmarkBuilder`], then [`Benchmark::execute`]
//! probes the target, measures a sequential baseline over one reused
//! connection and finally drains the same number of requests concurrently,
//! folding both phases into a [`RunResult`].
mod concurrent;
mod config;
mod engine;
mod histogram;
mod probe;
mod sequential;
mod stats;
mod template;
mod types;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

pub use config::{BenchmarkBuilder, BenchmarkConfig, ConcurrencyPlan};
pub use engine::{Benchmark, Field, RunStatus};
pub use histogram::Percentiles;
pub use stats::{ConcurrentStats, LatencySummary, RunResult, SequentialStats};
pub use template::{
    DEFAULT_USER_AGENT, RedirectPolicy, RequestTemplate, TransportOptions, TransportOverrides,
};
pub use types::{Body, HttpMethod, PipelineMode};
