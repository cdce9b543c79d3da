use std::collections::BTreeSet;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, trace, warn};

use crate::error::{BenchError, BenchResult, Phase, TransportError};
use crate::transport::{PoolOptions, ResponseMode, Session, Transport};

use super::config::ConcurrencyPlan;
use super::stats::ConcurrentStats;
use super::template::RequestTemplate;

/// Longest the drain loop parks when no transfer completes.
const DRAIN_PARK: Duration = Duration::from_millis(1);

enum Completion {
    Status(u16),
    Failed(TransportError),
}

/// Everything observed while draining one batch of transfers.
#[derive(Debug, Default)]
pub(crate) struct DrainReport {
    pub(crate) duration: Duration,
    pub(crate) completed: usize,
    pub(crate) statuses: BTreeSet<u16>,
    pub(crate) transport_failures: u64,
    pub(crate) first_failure: Option<TransportError>,
    pub(crate) idle_passes: u64,
}

impl DrainReport {
    fn record(&mut self, completion: Completion) {
        self.completed = self.completed.saturating_add(1);
        match completion {
            Completion::Status(status) => {
                self.statuses.insert(status);
            }
            Completion::Failed(err) => {
                self.transport_failures = self.transport_failures.saturating_add(1);
                if self.first_failure.is_none() {
                    self.first_failure = Some(err);
                }
            }
        }
    }
}

/// One transfer: wait for a free connection slot, send, release the slot.
async fn transfer<S>(session: &S, template: &RequestTemplate, slots: &Semaphore) -> Completion
where
    S: Session,
{
    let Ok(_slot) = slots.acquire().await else {
        return Completion::Failed(TransportError::Transfer {
            message: "connection slots closed".to_owned(),
        });
    };
    match session.send(template, ResponseMode::Drain).await {
        Ok(status) => Completion::Status(status),
        Err(err) => Completion::Failed(err),
    }
}

/// Drives `total` transfers through `session` from a single loop.
///
/// At most `limits.max_connections` transfers hold a connection slot at once.
/// `limits.pipeline_depth` is a per-connection depth, so the in-flight set
/// admits up to `max_connections * pipeline_depth` transfers. The loop
/// returns only once every transfer has completed.
pub(crate) async fn drain<S>(
    session: &S,
    template: &RequestTemplate,
    limits: PoolOptions,
    total: usize,
) -> DrainReport
where
    S: Session,
{
    let slots = Semaphore::new(limits.max_connections.max(1));
    let window = admission_window(limits, total);
    let mut queued = total;
    let mut in_flight = FuturesUnordered::new();
    let mut report = DrainReport::default();
    let started = Instant::now();

    loop {
        while queued > 0 && in_flight.len() < window {
            in_flight.push(transfer(session, template, &slots));
            queued = queued.saturating_sub(1);
        }
        if in_flight.is_empty() {
            break;
        }

        match timeout(DRAIN_PARK, in_flight.next()).await {
            Ok(Some(completion)) => report.record(completion),
            Ok(None) => {}
            Err(_) => {
                report.idle_passes = report.idle_passes.saturating_add(1);
                trace!(
                    in_flight = in_flight.len(),
                    queued,
                    "No transfer completed, parking"
                );
                continue;
            }
        }
        while let Some(Some(completion)) = in_flight.next().now_or_never() {
            report.record(completion);
        }
    }

    report.duration = started.elapsed();
    report
}

/// Transfers admitted to the in-flight set at once, never fewer than the
/// connection slots and never more than `total`.
pub(crate) fn admission_window(limits: PoolOptions, total: usize) -> usize {
    let connections = limits.max_connections.max(1);
    connections
        .saturating_mul(limits.pipeline_depth.max(1))
        .min(total)
        .max(1)
}

/// Issues the plan's requests concurrently and fails if any of them did not
/// return `expected`, reporting every distinct offending status.
pub(crate) async fn run_concurrent<T>(
    transport: &T,
    template: &RequestTemplate,
    plan: &ConcurrencyPlan,
    expected: u16,
) -> BenchResult<ConcurrentStats>
where
    T: Transport,
{
    let limits = PoolOptions {
        max_connections: plan.connections(),
        pipeline_depth: plan.pipeline_cap(),
    };
    let session = transport
        .open(template.options(), limits)
        .map_err(|source| BenchError::Unreachable {
            phase: Phase::Concurrent,
            source,
        })?;

    info!(
        requests = plan.total_requests(),
        connections = limits.max_connections,
        pipeline = %plan.pipeline(),
        pipeline_depth = limits.pipeline_depth,
        "Concurrent phase started"
    );
    let report = drain(&session, template, limits, plan.total_requests()).await;
    drop(session);
    debug!(
        completed = report.completed,
        idle_passes = report.idle_passes,
        "Concurrent drain finished"
    );

    reconcile(&report, expected)
}

fn reconcile(report: &DrainReport, expected: u16) -> BenchResult<ConcurrentStats> {
    let offending: BTreeSet<u16> = report
        .statuses
        .iter()
        .copied()
        .filter(|status| *status != expected)
        .collect();

    if let Some(err) = report.first_failure.as_ref() {
        warn!(
            failures = report.transport_failures,
            "Concurrent transfers failed without a response: {}",
            err
        );
    }
    if !offending.is_empty() || report.transport_failures > 0 {
        warn!(expected, found = ?offending, "Concurrent phase returned unexpected statuses");
        return Err(BenchError::UnexpectedStatuses {
            expected,
            found: offending,
            transport_failures: report.transport_failures,
        });
    }

    let stats = ConcurrentStats::new(report.completed, report.duration);
    info!(
        requests_per_second = stats.requests_per_second,
        duration_ms = stats.duration.as_secs_f64() * 1000.0,
        "Concurrent phase finished"
    );
    Ok(stats)
}
