use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::{BenchError, BenchResult, Phase};
use crate::transport::{PoolOptions, ResponseMode, Session, Transport};

use super::config::ConcurrencyPlan;
use super::stats::SequentialStats;
use super::template::RequestTemplate;

/// Issues the plan's requests one after another over a single retained
/// connection, stopping at the first failure.
pub(crate) async fn run_sequential<T>(
    transport: &T,
    template: &RequestTemplate,
    plan: &ConcurrencyPlan,
    expected: u16,
) -> BenchResult<SequentialStats>
where
    T: Transport,
{
    let total = plan.total_requests();
    let session = transport
        .open(template.options(), PoolOptions::single())
        .map_err(|source| BenchError::Unreachable {
            phase: Phase::Sequential,
            source,
        })?;

    info!(requests = total, "Sequential phase started");
    let mut samples = Vec::with_capacity(total);
    for index in 0..total {
        let started = Instant::now();
        let outcome = session.send(template, ResponseMode::Drain).await;
        let elapsed = started.elapsed();
        let status = match outcome {
            Ok(status) => status,
            Err(err) => {
                warn!(request = index.saturating_add(1), "Sequential request failed: {}", err);
                return Err(BenchError::Unreachable {
                    phase: Phase::Sequential,
                    source: err,
                });
            }
        };
        if status != expected {
            warn!(
                request = index.saturating_add(1),
                expected,
                found = status,
                "Sequential request returned unexpected status"
            );
            return Err(BenchError::UnexpectedStatus {
                phase: Phase::Sequential,
                expected,
                found: status,
            });
        }
        samples.push(elapsed);
    }
    drop(session);

    let stats = SequentialStats::from_samples(&samples);
    info!(
        requests_per_second = stats.requests_per_second,
        avg_ms = stats.latency.avg.as_secs_f64() * 1000.0,
        "Sequential phase finished"
    );
    Ok(stats)
}
