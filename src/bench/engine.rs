use std::str::FromStr;

use tokio::time::Instant;
use tracing::info;
use url::Url;

use crate::error::{BenchError, BenchResult};
use crate::report;
use crate::transport::Transport;

use super::concurrent::run_concurrent;
use super::config::{BenchmarkBuilder, BenchmarkConfig, ConcurrencyPlan};
use super::probe::probe;
use super::sequential::run_sequential;
use super::stats::RunResult;
use super::template::RequestTemplate;
use super::types::{Body, HttpMethod};

/// Outcome of the most recent [`Benchmark::execute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RunStatus {
    /// No run has been started.
    #[default]
    Uninitialized,
    /// A run was started and did not finish successfully.
    Unfinished,
    Finished(RunResult),
}

/// Readable fields of a [`Benchmark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Result,
    Headers,
    Body,
    Method,
    Url,
    ExpectedStatus,
    Configuration,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Result,
        Field::Headers,
        Field::Body,
        Field::Method,
        Field::Url,
        Field::ExpectedStatus,
        Field::Configuration,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Field::Result => "result",
            Field::Headers => "headers",
            Field::Body => "body",
            Field::Method => "method",
            Field::Url => "url",
            Field::ExpectedStatus => "expectedStatus",
            Field::Configuration => "configuration",
        }
    }
}

impl FromStr for Field {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "result" => Ok(Field::Result),
            "headers" => Ok(Field::Headers),
            "body" => Ok(Field::Body),
            "method" => Ok(Field::Method),
            "url" => Ok(Field::Url),
            "expectedStatus" | "expected_status" => Ok(Field::ExpectedStatus),
            "configuration" => Ok(Field::Configuration),
            _ => Err(BenchError::UnknownField { name: s.to_owned() }),
        }
    }
}

/// Benchmark engine: an immutable configuration plus the status of its last run.
#[derive(Debug, Clone)]
pub struct Benchmark {
    config: BenchmarkConfig,
    plan: ConcurrencyPlan,
    status: RunStatus,
}

impl Benchmark {
    #[must_use]
    pub fn builder() -> BenchmarkBuilder {
        BenchmarkBuilder::default()
    }

    pub(crate) const fn new(config: BenchmarkConfig, plan: ConcurrencyPlan) -> Self {
        Self {
            config,
            plan,
            status: RunStatus::Uninitialized,
        }
    }

    /// Runs probe, sequential and concurrent phases against the target.
    ///
    /// # Errors
    ///
    /// Returns `Unreachable` when the target cannot be reached and
    /// `UnexpectedStatus`/`UnexpectedStatuses` when any phase observes a
    /// status other than the expected one.
    pub async fn execute<T>(&mut self, transport: &T) -> BenchResult<RunResult>
    where
        T: Transport,
    {
        self.status = RunStatus::Unfinished;
        let started = Instant::now();
        let expected = self.config.expected_status();
        let template = RequestTemplate::new(&self.config);
        info!(
            url = %template.url(),
            method = %template.method(),
            requests = self.plan.total_requests(),
            connections = self.plan.connections(),
            "Benchmark started"
        );

        probe(transport, &template, expected).await?;
        let sequential = run_sequential(transport, &template, &self.plan, expected).await?;
        let concurrent = run_concurrent(transport, &template, &self.plan, expected).await?;

        let result = RunResult::aggregate(sequential, concurrent, started.elapsed());
        info!(
            score = result.score,
            took_ms = result.took.as_secs_f64() * 1000.0,
            "Benchmark finished"
        );
        self.status = RunStatus::Finished(result);
        Ok(result)
    }

    #[must_use]
    pub const fn result(&self) -> &RunStatus {
        &self.status
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        self.config.headers()
    }

    #[must_use]
    pub const fn body(&self) -> Option<&Body> {
        self.config.body()
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.config.method()
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        self.config.url()
    }

    #[must_use]
    pub const fn expected_status(&self) -> u16 {
        self.config.expected_status()
    }

    #[must_use]
    pub const fn configuration(&self) -> &ConcurrencyPlan {
        &self.plan
    }

    #[must_use]
    pub const fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Renders one field as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error when the field's value cannot be serialized.
    pub fn field(&self, field: Field) -> Result<serde_json::Value, serde_json::Error> {
        report::field_value(self, field)
    }
}
