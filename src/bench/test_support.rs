use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{TransportError, TransportResult};
use crate::transport::{PoolOptions, ResponseMode, Session, Transport};

use super::template::{RequestTemplate, TransportOptions};

type Script = dyn Fn(usize) -> TransportResult<u16> + Send + Sync;

struct MockState {
    script: Box<Script>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    opened: Mutex<Vec<PoolOptions>>,
    modes: Mutex<Vec<ResponseMode>>,
}

/// Deterministic transport answering each send from a script keyed by the
/// zero-based index of the call across the transport's lifetime.
#[derive(Clone)]
pub(crate) struct MockTransport {
    state: Arc<MockState>,
}

pub(crate) struct MockSession {
    state: Arc<MockState>,
}

impl MockTransport {
    pub(crate) fn scripted<F>(script: F) -> Self
    where
        F: Fn(usize) -> TransportResult<u16> + Send + Sync + 'static,
    {
        Self {
            state: Arc::new(MockState {
                script: Box::new(script),
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                opened: Mutex::new(Vec::new()),
                modes: Mutex::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn always(status: u16) -> Self {
        Self::scripted(move |_| Ok(status))
    }

    pub(crate) fn refusing() -> Self {
        Self::scripted(|_| {
            Err(TransportError::Connect {
                message: "connection refused".to_owned(),
            })
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.state.peak_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn opened(&self) -> Vec<PoolOptions> {
        self.state
            .opened
            .lock()
            .map(|opened| opened.clone())
            .unwrap_or_default()
    }

    pub(crate) fn first_mode(&self) -> Option<ResponseMode> {
        self.state
            .modes
            .lock()
            .ok()
            .and_then(|modes| modes.first().copied())
    }
}

impl Transport for MockTransport {
    type Session = MockSession;

    fn open(
        &self,
        _options: &TransportOptions,
        pool: PoolOptions,
    ) -> TransportResult<Self::Session> {
        if let Ok(mut opened) = self.state.opened.lock() {
            opened.push(pool);
        }
        Ok(MockSession {
            state: Arc::clone(&self.state),
        })
    }
}

#[async_trait]
impl Session for MockSession {
    async fn send(&self, _template: &RequestTemplate, mode: ResponseMode) -> TransportResult<u16> {
        let index = self.state.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut modes) = self.state.modes.lock() {
            modes.push(mode);
        }
        let current = self
            .state
            .in_flight
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1);
        self.state
            .peak_in_flight
            .fetch_max(current, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.state.script)(index)
    }
}

/// Session whose responses take `delay` to arrive, cycling through
/// `statuses` by call index.
pub(crate) struct SlowSession {
    delay: Duration,
    statuses: Vec<u16>,
    calls: AtomicUsize,
}

impl SlowSession {
    pub(crate) fn new(delay: Duration, statuses: Vec<u16>) -> Self {
        Self {
            delay,
            statuses,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Session for SlowSession {
    async fn send(&self, _template: &RequestTemplate, _mode: ResponseMode) -> TransportResult<u16> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        let slot = index.checked_rem(self.statuses.len()).unwrap_or(0);
        Ok(self.statuses.get(slot).copied().unwrap_or(200))
    }
}

pub(crate) fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}
