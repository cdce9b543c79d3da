//! Presentation of benchmark results: rounded text lines and JSON values.
use std::time::Duration;

use serde::Serialize;
use serde_json::{Value, json};

use crate::bench::{Benchmark, Body, Field, RunResult, RunStatus};

/// Decimal places kept when a figure leaves the engine.
const REPORT_DECIMALS: i32 = 5;

#[must_use]
pub fn round_figure(value: f64) -> f64 {
    let scale = 10f64.powi(REPORT_DECIMALS);
    (value * scale).round() / scale
}

fn seconds(duration: Duration) -> f64 {
    round_figure(duration.as_secs_f64())
}

#[derive(Debug, Serialize)]
pub struct RequestsPerSecond {
    pub single_user: f64,
    pub multiple_users: f64,
}

#[derive(Debug, Serialize)]
pub struct ResponseDuration {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p50: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p90: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p99: Option<f64>,
}

/// Rounded view of a [`RunResult`], durations in seconds.
#[derive(Debug, Serialize)]
pub struct RunReport {
    #[serde(rename = "req/s")]
    pub requests_per_second: RequestsPerSecond,
    pub score: f64,
    pub response_duration: ResponseDuration,
    pub concurrent_duration: f64,
    pub took: f64,
}

impl From<&RunResult> for RunReport {
    fn from(result: &RunResult) -> Self {
        let latency = &result.sequential.latency;
        let percentiles = latency.percentiles;
        Self {
            requests_per_second: RequestsPerSecond {
                single_user: round_figure(result.sequential.requests_per_second),
                multiple_users: round_figure(result.concurrent.requests_per_second),
            },
            score: round_figure(result.score),
            response_duration: ResponseDuration {
                avg: seconds(latency.avg),
                min: seconds(latency.min),
                max: seconds(latency.max),
                total: seconds(latency.total),
                p50: percentiles.map(|p| seconds(p.p50)),
                p90: percentiles.map(|p| seconds(p.p90)),
                p99: percentiles.map(|p| seconds(p.p99)),
            },
            concurrent_duration: seconds(result.concurrent.duration),
            took: seconds(result.took),
        }
    }
}

/// JSON view of a run: the rounded report, or an `error` marker.
///
/// # Errors
///
/// Returns an error when the report cannot be serialized.
pub fn status_value(status: &RunStatus) -> Result<Value, serde_json::Error> {
    match status {
        RunStatus::Uninitialized => Ok(json!({ "error": "uninitialized" })),
        RunStatus::Unfinished => Ok(json!({ "error": "unfinished" })),
        RunStatus::Finished(result) => serde_json::to_value(RunReport::from(result)),
    }
}

fn body_value(body: Option<&Body>) -> Value {
    match body {
        None => Value::Null,
        Some(Body::Raw(bytes)) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        Some(Body::Form(fields)) => Value::Object(
            fields
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect(),
        ),
    }
}

pub(crate) fn field_value(bench: &Benchmark, field: Field) -> Result<Value, serde_json::Error> {
    let value = match field {
        Field::Result => status_value(bench.result())?,
        Field::Headers => Value::Object(
            bench
                .headers()
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect(),
        ),
        Field::Body => body_value(bench.body()),
        Field::Method => Value::String(bench.method().as_str().to_owned()),
        Field::Url => Value::String(bench.url().as_str().to_owned()),
        Field::ExpectedStatus => Value::from(bench.expected_status()),
        Field::Configuration => serde_json::to_value(bench.configuration())?,
    };
    Ok(value)
}

/// Human readable summary of a finished run.
#[must_use]
pub fn summary_lines(bench: &Benchmark, result: &RunResult) -> Vec<String> {
    let report = RunReport::from(result);
    let plan = bench.configuration();
    let mut lines = Vec::new();
    lines.push(format!("Target: {} {}", bench.method(), bench.url()));
    lines.push(format!("Expected status: {}", bench.expected_status()));
    lines.push(format!(
        "Requests: {} ({} connections, pipeline {})",
        plan.total_requests(),
        plan.connections(),
        plan.pipeline()
    ));
    lines.push(format!(
        "Single-user req/s: {}",
        report.requests_per_second.single_user
    ));
    lines.push(format!(
        "Multi-user req/s: {}",
        report.requests_per_second.multiple_users
    ));
    lines.push(format!("Score: {}", report.score));
    lines.push(format!(
        "Response duration avg/min/max: {}s / {}s / {}s",
        report.response_duration.avg, report.response_duration.min, report.response_duration.max
    ));
    if let (Some(p50), Some(p90), Some(p99)) = (
        report.response_duration.p50,
        report.response_duration.p90,
        report.response_duration.p99,
    ) {
        lines.push(format!(
            "Response duration p50/p90/p99: {}s / {}s / {}s",
            p50, p90, p99
        ));
    }
    lines.push(format!(
        "Concurrent duration: {}s",
        report.concurrent_duration
    ));
    lines.push(format!("Took: {}s", report.took));
    lines
}
