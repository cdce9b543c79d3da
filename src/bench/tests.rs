use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::concurrent::{admission_window, drain};
use super::template::RequestTemplate;
use super::test_support::{MockTransport, SlowSession, run_async_test};
use super::*;
use crate::error::{BenchError, Phase, TransportError, ValidationError};
use crate::transport::{PoolOptions, ResponseMode};

const TARGET: &str = "http://127.0.0.1:8080/health";

fn builder() -> Result<BenchmarkBuilder, String> {
    Benchmark::builder()
        .target(TARGET, "get")
        .map_err(|err| format!("target failed: {}", err))
}

fn bench_with_plan(
    connections: usize,
    requests: usize,
    pipeline: PipelineMode,
) -> Result<Benchmark, String> {
    builder()?
        .concurrency(connections, requests, pipeline)
        .and_then(|builder| builder.build())
        .map_err(|err| format!("build failed: {}", err))
}

fn expect_invalid<T>(result: Result<T, BenchError>, what: &str) -> Result<(), String> {
    match result {
        Err(BenchError::InvalidConfig(_)) => Ok(()),
        Err(err) => Err(format!("{}: expected InvalidConfig, got {}", what, err)),
        Ok(_) => Err(format!("{}: expected InvalidConfig, got Ok", what)),
    }
}

#[test]
fn target_rejects_non_absolute_urls_without_touching_previous_state() -> Result<(), String> {
    let configured = builder()?;
    for candidate in ["/relative/path", "example.com/health", "", "http://", "ftp://files"] {
        expect_invalid(configured.target(candidate, "GET"), candidate)?;
    }
    let bench = configured
        .build()
        .map_err(|err| format!("build failed: {}", err))?;
    if bench.url().as_str() != TARGET {
        return Err(format!("Target changed to {}", bench.url()));
    }
    Ok(())
}

#[test]
fn target_normalizes_method_case_and_rejects_unknown_verbs() -> Result<(), String> {
    let bench = Benchmark::builder()
        .target(TARGET, "pAtCh")
        .and_then(|builder| builder.build())
        .map_err(|err| format!("build failed: {}", err))?;
    if bench.method() != HttpMethod::Patch {
        return Err(format!("Unexpected method: {}", bench.method()));
    }
    match Benchmark::builder().target(TARGET, "TRACE") {
        Err(BenchError::InvalidConfig(ValidationError::InvalidMethod { value })) => {
            if value != "TRACE" {
                return Err(format!("Unexpected rejected value: {}", value));
            }
            Ok(())
        }
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(_) => Err("Expected TRACE to be rejected".to_owned()),
    }
}

#[test]
fn build_without_target_fails() -> Result<(), String> {
    expect_invalid(Benchmark::builder().build(), "missing target")
}

#[test]
fn expected_status_rejects_server_error_range() -> Result<(), String> {
    let configured = builder()?;
    expect_invalid(configured.expected_status(500), "500")?;
    expect_invalid(configured.expected_status(503), "503")?;
    let bench = configured
        .expected_status(499)
        .and_then(|builder| builder.build())
        .map_err(|err| format!("499 rejected: {}", err))?;
    if bench.expected_status() != 499 {
        return Err(format!("Unexpected status: {}", bench.expected_status()));
    }
    Ok(())
}

#[test]
fn concurrency_constraints_fail_independently() -> Result<(), String> {
    let configured = builder()?;
    expect_invalid(
        configured.concurrency(1, 1000, PipelineMode::Optimal),
        "connections < 2",
    )?;
    expect_invalid(
        configured.concurrency(10, 99, PipelineMode::Optimal),
        "requests < 100",
    )?;
    expect_invalid(
        configured.concurrency(200, 150, PipelineMode::Max),
        "requests < connections",
    )?;
    configured
        .concurrency(2, 100, PipelineMode::Max)
        .map_err(|err| format!("Minimal plan rejected: {}", err))?;
    Ok(())
}

#[test]
fn pipeline_mode_parses_only_known_names() -> Result<(), String> {
    if "optimal".parse::<PipelineMode>() != Ok(PipelineMode::Optimal) {
        return Err("optimal did not parse".to_owned());
    }
    if "max".parse::<PipelineMode>() != Ok(PipelineMode::Max) {
        return Err("max did not parse".to_owned());
    }
    if "burst".parse::<PipelineMode>().is_ok() {
        return Err("burst should be rejected".to_owned());
    }
    Ok(())
}

#[test]
fn pipeline_cap_follows_mode() -> Result<(), String> {
    let optimal = PipelineMode::Optimal.cap(10, 95);
    if optimal != 10 {
        return Err(format!("Expected optimal cap 10, got {}", optimal));
    }
    let max = PipelineMode::Max.cap(10, 95);
    if max != 95 {
        return Err(format!("Expected max cap 95, got {}", max));
    }
    let plan = ConcurrencyPlan::new(10, 1000, PipelineMode::Optimal)
        .map_err(|err| format!("plan failed: {}", err))?;
    if plan.pipeline_cap() != 100 {
        return Err(format!("Unexpected plan cap: {}", plan.pipeline_cap()));
    }
    Ok(())
}

#[test]
fn default_plan_and_headers() -> Result<(), String> {
    let bench = builder()?
        .build()
        .map_err(|err| format!("build failed: {}", err))?;
    let plan = bench.configuration();
    if plan.connections() != 10 || plan.total_requests() != 1000 {
        return Err(format!("Unexpected default plan: {:?}", plan));
    }
    if bench.headers() != [("Cache-Control".to_owned(), "no-cache".to_owned())] {
        return Err(format!("Unexpected default headers: {:?}", bench.headers()));
    }
    if bench.expected_status() != 200 {
        return Err(format!("Unexpected default status: {}", bench.expected_status()));
    }
    Ok(())
}

#[test]
fn headers_keep_insertion_order_and_unique_names() -> Result<(), String> {
    let bench = builder()?
        .headers([
            ("X-First", "1"),
            ("Accept", "text/plain"),
            ("x-first", "2"),
        ])
        .build()
        .map_err(|err| format!("build failed: {}", err))?;
    let template = RequestTemplate::new(bench.config());
    let lines = template.header_lines();
    if lines != ["X-First: 2", "Accept: text/plain"] {
        return Err(format!("Unexpected header lines: {:?}", lines));
    }
    Ok(())
}

#[test]
fn template_attaches_body_only_for_body_methods() -> Result<(), String> {
    let body = Body::raw("{\"ok\":true}");
    for (method, attached) in [
        ("POST", true),
        ("PUT", true),
        ("PATCH", true),
        ("GET", false),
        ("DELETE", false),
        ("HEAD", false),
    ] {
        let bench = Benchmark::builder()
            .target(TARGET, method)
            .map(|builder| builder.body(body.clone()))
            .and_then(|builder| builder.build())
            .map_err(|err| format!("build failed: {}", err))?;
        let template = RequestTemplate::new(bench.config());
        if template.body().is_some() != attached {
            return Err(format!("{}: body attached = {}", method, !attached));
        }
    }

    let empty = Benchmark::builder()
        .target(TARGET, "POST")
        .map(|builder| builder.body(Body::raw("")))
        .and_then(|builder| builder.build())
        .map_err(|err| format!("build failed: {}", err))?;
    if RequestTemplate::new(empty.config()).body().is_some() {
        return Err("Empty body should not be attached".to_owned());
    }
    Ok(())
}

#[test]
fn transport_overrides_apply_below_configured_headers() -> Result<(), String> {
    let overrides = TransportOverrides {
        insecure: Some(false),
        redirect: Some(3),
        timeout_ms: Some(2500),
        default_headers: BTreeMap::from([
            ("cache-control".to_owned(), "max-age=60".to_owned()),
            ("X-Trace".to_owned(), "on".to_owned()),
        ]),
        ..TransportOverrides::default()
    };
    let bench = builder()?
        .transport(overrides)
        .build()
        .map_err(|err| format!("build failed: {}", err))?;
    let template = RequestTemplate::new(bench.config());

    let lines = template.header_lines();
    if lines != ["Cache-Control: no-cache", "X-Trace: on"] {
        return Err(format!("Unexpected header lines: {:?}", lines));
    }
    let options = template.options();
    if options.insecure {
        return Err("insecure override ignored".to_owned());
    }
    if options.redirect != RedirectPolicy::Limited(3) {
        return Err(format!("Unexpected redirect: {:?}", options.redirect));
    }
    if options.timeout != Some(Duration::from_millis(2500)) {
        return Err(format!("Unexpected timeout: {:?}", options.timeout));
    }
    if options.connect_timeout != Duration::from_secs(1) {
        return Err(format!(
            "Unexpected connect timeout: {:?}",
            options.connect_timeout
        ));
    }
    Ok(())
}

#[test]
fn default_transport_options() -> Result<(), String> {
    let options = TransportOptions::default();
    if !options.insecure || options.redirect != RedirectPolicy::None || options.timeout.is_some() {
        return Err(format!("Unexpected defaults: {:?}", options));
    }
    Ok(())
}

#[test]
fn successful_run_scores_exact_sum() -> Result<(), String> {
    run_async_test(async {
        let mut bench = bench_with_plan(10, 100, PipelineMode::Optimal)?;
        let transport = MockTransport::always(200);
        let result = bench
            .execute(&transport)
            .await
            .map_err(|err| format!("run failed: {}", err))?;

        if result.sequential.requests_per_second <= 0.0 {
            return Err("Sequential req/s must be > 0".to_owned());
        }
        if result.concurrent.requests_per_second <= 0.0 {
            return Err("Concurrent req/s must be > 0".to_owned());
        }
        let expected =
            result.sequential.requests_per_second + result.concurrent.requests_per_second;
        if result.score.to_bits() != expected.to_bits() {
            return Err(format!("Score {} != {}", result.score, expected));
        }
        if result.sequential.requests != 100 || result.concurrent.requests != 100 {
            return Err(format!("Unexpected request counts: {:?}", result));
        }
        if transport.calls() != 201 {
            return Err(format!("Expected 201 sends, got {}", transport.calls()));
        }
        if bench.result() != &RunStatus::Finished(result) {
            return Err(format!("Unexpected run status: {:?}", bench.result()));
        }
        Ok(())
    })
}

#[test]
fn phases_open_sessions_with_expected_limits() -> Result<(), String> {
    run_async_test(async {
        let mut bench = bench_with_plan(10, 100, PipelineMode::Optimal)?;
        let transport = MockTransport::always(200);
        bench
            .execute(&transport)
            .await
            .map_err(|err| format!("run failed: {}", err))?;

        let concurrent = PoolOptions {
            max_connections: 10,
            pipeline_depth: 10,
        };
        let opened = transport.opened();
        if opened != [PoolOptions::single(), PoolOptions::single(), concurrent] {
            return Err(format!("Unexpected sessions: {:?}", opened));
        }
        if transport.first_mode() != Some(ResponseMode::StatusOnly) {
            return Err("Probe must not read the response body".to_owned());
        }
        let peak = transport.peak_in_flight();
        if !(2..=10).contains(&peak) {
            return Err(format!("Peak in-flight {} outside 2..=10", peak));
        }
        Ok(())
    })
}

#[test]
fn optimal_pipeline_keeps_every_connection_busy() -> Result<(), String> {
    run_async_test(async {
        let mut bench = bench_with_plan(50, 100, PipelineMode::Optimal)?;
        let transport = MockTransport::always(200);
        bench
            .execute(&transport)
            .await
            .map_err(|err| format!("run failed: {}", err))?;
        if transport.peak_in_flight() != 50 {
            return Err(format!(
                "Expected 50 transfers in flight, got {}",
                transport.peak_in_flight()
            ));
        }
        let expected = PoolOptions {
            max_connections: 50,
            pipeline_depth: 2,
        };
        let last = transport.opened().last().copied();
        if last != Some(expected) {
            return Err(format!("Unexpected concurrent pool: {:?}", last));
        }
        Ok(())
    })
}

#[test]
fn admission_window_scales_depth_by_connections() -> Result<(), String> {
    let cases = [
        (50, 2, 100, 100),
        (10, 10, 100, 100),
        (3, 34, 100, 100),
        (4, 400, 400, 400),
        (7, 1, 100, 7),
        (0, 0, 100, 1),
    ];
    for (max_connections, pipeline_depth, total, expected) in cases {
        let limits = PoolOptions {
            max_connections,
            pipeline_depth,
        };
        let window = admission_window(limits, total);
        if window != expected {
            return Err(format!(
                "{}x{} over {}: window {}, expected {}",
                max_connections, pipeline_depth, total, window, expected
            ));
        }
    }
    Ok(())
}

#[test]
fn drain_parks_until_slow_transfers_complete() -> Result<(), String> {
    run_async_test(async {
        let bench = bench_with_plan(10, 100, PipelineMode::Optimal)?;
        let template = RequestTemplate::new(bench.config());
        let session = SlowSession::new(Duration::from_millis(5), vec![200, 201]);
        let limits = PoolOptions {
            max_connections: 10,
            pipeline_depth: 10,
        };
        let report = drain(&session, &template, limits, 100).await;

        if report.completed != 100 || session.calls() != 100 {
            return Err(format!(
                "Expected 100 completions, got {} ({} sent)",
                report.completed,
                session.calls()
            ));
        }
        if report.idle_passes == 0 {
            return Err("Expected the drain loop to park at least once".to_owned());
        }
        if report.statuses != BTreeSet::from([200, 201]) {
            return Err(format!("Unexpected statuses: {:?}", report.statuses));
        }
        if report.transport_failures != 0 {
            return Err(format!(
                "Unexpected transport failures: {}",
                report.transport_failures
            ));
        }
        Ok(())
    })
}

#[test]
fn max_pipeline_respects_connection_ceiling() -> Result<(), String> {
    run_async_test(async {
        let mut bench = bench_with_plan(4, 400, PipelineMode::Max)?;
        let transport = MockTransport::always(200);
        bench
            .execute(&transport)
            .await
            .map_err(|err| format!("run failed: {}", err))?;
        if transport.peak_in_flight() > 4 {
            return Err(format!(
                "Connection ceiling exceeded: {}",
                transport.peak_in_flight()
            ));
        }
        let last = transport.opened().last().copied();
        if last.map(|pool| pool.pipeline_depth) != Some(400) {
            return Err(format!("Unexpected concurrent pool: {:?}", last));
        }
        Ok(())
    })
}

#[test]
fn sequential_mismatch_stops_at_offending_request() -> Result<(), String> {
    run_async_test(async {
        let mut bench = bench_with_plan(10, 100, PipelineMode::Optimal)?;
        // call 0 is the probe, calls 1..=100 are sequential
        let transport = MockTransport::scripted(|index| Ok(if index == 3 { 404 } else { 200 }));
        match bench.execute(&transport).await {
            Err(BenchError::UnexpectedStatus {
                phase: Phase::Sequential,
                expected: 200,
                found: 404,
            }) => {}
            Err(err) => return Err(format!("Unexpected error: {}", err)),
            Ok(_) => return Err("Expected sequential failure".to_owned()),
        }
        if transport.calls() != 4 {
            return Err(format!(
                "Expected no sends after the failure, got {} total",
                transport.calls()
            ));
        }
        if transport.opened().len() != 2 {
            return Err("Concurrent phase must not start".to_owned());
        }
        if bench.result() != &RunStatus::Unfinished {
            return Err(format!("Unexpected run status: {:?}", bench.result()));
        }
        Ok(())
    })
}

#[test]
fn sequential_transport_failure_is_unreachable() -> Result<(), String> {
    run_async_test(async {
        let mut bench = bench_with_plan(10, 100, PipelineMode::Optimal)?;
        let transport = MockTransport::scripted(|index| {
            if index == 50 {
                Err(TransportError::Timeout)
            } else {
                Ok(200)
            }
        });
        match bench.execute(&transport).await {
            Err(BenchError::Unreachable {
                phase: Phase::Sequential,
                source: TransportError::Timeout,
            }) => Ok(()),
            Err(err) => Err(format!("Unexpected error: {}", err)),
            Ok(_) => Err("Expected sequential failure".to_owned()),
        }
    })
}

#[test]
fn concurrent_mismatches_are_reported_after_full_drain() -> Result<(), String> {
    run_async_test(async {
        let mut bench = bench_with_plan(10, 1000, PipelineMode::Optimal)?;
        // probe = 0, sequential = 1..=1000, concurrent = 1001..=2000
        let transport = MockTransport::scripted(|index| match index {
            1500 => Ok(404),
            1900 => Ok(201),
            _ => Ok(200),
        });
        match bench.execute(&transport).await {
            Err(BenchError::UnexpectedStatuses {
                expected: 200,
                found,
                transport_failures: 0,
            }) => {
                if found != BTreeSet::from([201, 404]) {
                    return Err(format!("Unexpected offending set: {:?}", found));
                }
            }
            Err(err) => return Err(format!("Unexpected error: {}", err)),
            Ok(_) => return Err("Expected concurrent failure".to_owned()),
        }
        if transport.calls() != 2001 {
            return Err(format!(
                "Expected all 1000 concurrent sends, got {} total",
                transport.calls()
            ));
        }
        Ok(())
    })
}

#[test]
fn concurrent_transport_failures_fail_the_phase() -> Result<(), String> {
    run_async_test(async {
        let mut bench = bench_with_plan(5, 100, PipelineMode::Max)?;
        let transport = MockTransport::scripted(|index| {
            if index > 150 && index % 10 == 0 {
                Err(TransportError::Connect {
                    message: "reset".to_owned(),
                })
            } else {
                Ok(200)
            }
        });
        match bench.execute(&transport).await {
            Err(BenchError::UnexpectedStatuses {
                found,
                transport_failures,
                ..
            }) => {
                if !found.is_empty() {
                    return Err(format!("No status mismatch expected: {:?}", found));
                }
                if transport_failures != 5 {
                    return Err(format!(
                        "Expected 5 transport failures, got {}",
                        transport_failures
                    ));
                }
            }
            Err(err) => return Err(format!("Unexpected error: {}", err)),
            Ok(_) => return Err("Expected concurrent failure".to_owned()),
        }
        if transport.calls() != 201 {
            return Err(format!("Expected a full drain, got {}", transport.calls()));
        }
        Ok(())
    })
}

#[test]
fn probe_connection_failure_is_unreachable() -> Result<(), String> {
    run_async_test(async {
        let mut bench = bench_with_plan(10, 100, PipelineMode::Optimal)?;
        let transport = MockTransport::refusing();
        match bench.execute(&transport).await {
            Err(BenchError::Unreachable {
                phase: Phase::Probe,
                ..
            }) => {}
            Err(err) => return Err(format!("Unexpected error: {}", err)),
            Ok(_) => return Err("Expected probe failure".to_owned()),
        }
        if transport.calls() != 1 {
            return Err(format!("Expected only the probe, got {}", transport.calls()));
        }
        Ok(())
    })
}

#[test]
fn probe_status_mismatch_is_unexpected_status() -> Result<(), String> {
    run_async_test(async {
        let mut bench = builder()?
            .expected_status(204)
            .and_then(|builder| builder.concurrency(10, 100, PipelineMode::Optimal))
            .and_then(|builder| builder.build())
            .map_err(|err| format!("build failed: {}", err))?;
        let transport = MockTransport::always(200);
        match bench.execute(&transport).await {
            Err(BenchError::UnexpectedStatus {
                phase: Phase::Probe,
                expected: 204,
                found: 200,
            }) => Ok(()),
            Err(err) => Err(format!("Unexpected error: {}", err)),
            Ok(_) => Err("Expected probe failure".to_owned()),
        }
    })
}

#[test]
fn repeated_execution_yields_same_outcome() -> Result<(), String> {
    run_async_test(async {
        let mut bench = bench_with_plan(10, 100, PipelineMode::Optimal)?;
        let transport = MockTransport::always(200);
        let first = bench.execute(&transport).await;
        let second = bench.execute(&transport).await;
        if first.is_err() || second.is_err() {
            return Err("Both runs should succeed".to_owned());
        }

        let failing = MockTransport::always(404);
        let first_failure = bench
            .execute(&failing)
            .await
            .map_err(|err| err.offending_statuses());
        let second_failure = bench
            .execute(&failing)
            .await
            .map_err(|err| err.offending_statuses());
        let expected: Result<RunResult, BTreeSet<u16>> = Err(BTreeSet::from([404]));
        if first_failure != expected || second_failure != expected {
            return Err(format!(
                "Outcomes differ: {:?} / {:?}",
                first_failure, second_failure
            ));
        }
        Ok(())
    })
}

#[test]
fn field_lookup_rejects_unknown_names() -> Result<(), String> {
    for field in Field::ALL {
        let parsed = field
            .as_str()
            .parse::<Field>()
            .map_err(|err| format!("{} did not parse: {}", field.as_str(), err))?;
        if parsed != field {
            return Err(format!("{} parsed as {:?}", field.as_str(), parsed));
        }
    }
    match "latency".parse::<Field>() {
        Err(BenchError::UnknownField { name }) if name == "latency" => Ok(()),
        Err(err) => Err(format!("Unexpected error: {}", err)),
        Ok(field) => Err(format!("Expected UnknownField, got {:?}", field)),
    }
}

#[test]
fn fields_render_configuration() -> Result<(), String> {
    let bench = Benchmark::builder()
        .target(TARGET, "post")
        .map(|builder| builder.body(Body::form([("name", "bench")])))
        .and_then(|builder| builder.concurrency(4, 200, PipelineMode::Max))
        .and_then(|builder| builder.build())
        .map_err(|err| format!("build failed: {}", err))?;

    let method = bench
        .field(Field::Method)
        .map_err(|err| format!("render failed: {}", err))?;
    if method.as_str() != Some("POST") {
        return Err(format!("Unexpected method: {}", method));
    }
    let body = bench
        .field(Field::Body)
        .map_err(|err| format!("render failed: {}", err))?;
    if body.get("name").and_then(serde_json::Value::as_str) != Some("bench") {
        return Err(format!("Unexpected body: {}", body));
    }
    let configuration = bench
        .field(Field::Configuration)
        .map_err(|err| format!("render failed: {}", err))?;
    if configuration.get("pipeline").and_then(serde_json::Value::as_str) != Some("max") {
        return Err(format!("Unexpected configuration: {}", configuration));
    }
    let result = bench
        .field(Field::Result)
        .map_err(|err| format!("render failed: {}", err))?;
    if result.get("error").and_then(serde_json::Value::as_str) != Some("uninitialized") {
        return Err(format!("Unexpected result: {}", result));
    }
    Ok(())
}
