use tracing::{info, warn};

use crate::error::{BenchError, BenchResult, Phase};
use crate::transport::{PoolOptions, ResponseMode, Session, Transport};

use super::template::RequestTemplate;

/// Sends one status-only request and checks it against `expected`.
pub(crate) async fn probe<T>(
    transport: &T,
    template: &RequestTemplate,
    expected: u16,
) -> BenchResult<()>
where
    T: Transport,
{
    let unreachable = |source| BenchError::Unreachable {
        phase: Phase::Probe,
        source,
    };
    let session = transport
        .open(template.options(), PoolOptions::single())
        .map_err(unreachable)?;

    let status = match session.send(template, ResponseMode::StatusOnly).await {
        Ok(status) => status,
        Err(err) => {
            warn!("Connectivity probe failed: {}", err);
            return Err(unreachable(err));
        }
    };
    if status != expected {
        warn!(expected, found = status, "Connectivity probe returned unexpected status");
        return Err(BenchError::UnexpectedStatus {
            phase: Phase::Probe,
            expected,
            found: status,
        });
    }

    info!(url = %template.url(), status, "Target reachable");
    Ok(())
}
