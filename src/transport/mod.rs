//! Seam between the benchmark phases and the HTTP client.
//!
//! A [`Transport`] opens [`Session`]s sized by [`PoolOptions`]; each phase of a
//! run owns the session it opened and drops it when the phase ends, which
//! closes every connection the session pooled.
mod http;

use async_trait::async_trait;

use crate::bench::{RequestTemplate, TransportOptions};
use crate::error::TransportResult;

pub use http::{ReqwestSession, ReqwestTransport};

/// What the transport does with the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Status line only; the body is never read.
    StatusOnly,
    /// Body is read to completion and discarded so the connection can be reused.
    Drain,
}

/// Connection limits a session is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    pub max_connections: usize,
    pub pipeline_depth: usize,
}

impl PoolOptions {
    /// One connection, reused by every request sent through the session.
    #[must_use]
    pub const fn single() -> Self {
        Self {
            max_connections: 1,
            pipeline_depth: 1,
        }
    }
}

#[async_trait]
pub trait Session: Send + Sync {
    /// Executes one request built from `template` and returns its status code.
    ///
    /// # Errors
    ///
    /// Returns an error when no response could be obtained at all.
    async fn send(&self, template: &RequestTemplate, mode: ResponseMode) -> TransportResult<u16>;
}

pub trait Transport: Send + Sync {
    type Session: Session;

    /// Opens a session configured with `options` and sized by `pool`.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying client cannot be built.
    fn open(&self, options: &TransportOptions, pool: PoolOptions)
    -> TransportResult<Self::Session>;
}
