use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{BenchError, BenchResult, ValidationError};

use super::engine::Benchmark;
use super::template::TransportOverrides;
use super::types::{Body, HttpMethod, PipelineMode};

const DEFAULT_EXPECTED_STATUS: u16 = 200;
/// First status code of the range reserved for server failures.
const RESERVED_STATUS_FLOOR: u16 = 500;
const MIN_CONNECTIONS: usize = 2;
const MIN_REQUESTS: usize = 100;
const DEFAULT_CONNECTIONS: usize = 10;
const DEFAULT_REQUESTS: usize = 1000;

/// Validated, immutable description of the target endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    url: Url,
    method: HttpMethod,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    expected_status: u16,
    transport: TransportOverrides,
}

impl BenchmarkConfig {
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub const fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    #[must_use]
    pub const fn expected_status(&self) -> u16 {
        self.expected_status
    }

    #[must_use]
    pub const fn transport_overrides(&self) -> &TransportOverrides {
        &self.transport
    }
}

/// Connection count, request count and pipelining policy of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConcurrencyPlan {
    connections: usize,
    requests: usize,
    pipeline: PipelineMode,
}

impl ConcurrencyPlan {
    /// Validates a plan.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when fewer than two connections or fewer than
    /// 100 requests are requested, or when requests < connections.
    pub fn new(connections: usize, requests: usize, pipeline: PipelineMode) -> BenchResult<Self> {
        if connections < MIN_CONNECTIONS {
            return Err(BenchError::invalid(ValidationError::TooFewConnections {
                connections,
            }));
        }
        if requests < MIN_REQUESTS {
            return Err(BenchError::invalid(ValidationError::TooFewRequests {
                requests,
            }));
        }
        if requests < connections {
            return Err(BenchError::invalid(
                ValidationError::RequestsBelowConnections {
                    requests,
                    connections,
                },
            ));
        }
        Ok(Self {
            connections,
            requests,
            pipeline,
        })
    }

    #[must_use]
    pub const fn connections(&self) -> usize {
        self.connections
    }

    #[must_use]
    pub const fn total_requests(&self) -> usize {
        self.requests
    }

    #[must_use]
    pub const fn pipeline(&self) -> PipelineMode {
        self.pipeline
    }

    #[must_use]
    pub const fn pipeline_cap(&self) -> usize {
        self.pipeline.cap(self.connections, self.requests)
    }
}

impl Default for ConcurrencyPlan {
    fn default() -> Self {
        Self {
            connections: DEFAULT_CONNECTIONS,
            requests: DEFAULT_REQUESTS,
            pipeline: PipelineMode::Optimal,
        }
    }
}

/// Builder for a [`Benchmark`].
///
/// Every setter leaves `self` untouched and returns a new builder, so a
/// rejected value never partially applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkBuilder {
    target: Option<(Url, HttpMethod)>,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    expected_status: u16,
    plan: ConcurrencyPlan,
    transport: TransportOverrides,
}

impl Default for BenchmarkBuilder {
    fn default() -> Self {
        Self {
            target: None,
            headers: vec![("Cache-Control".to_owned(), "no-cache".to_owned())],
            body: None,
            expected_status: DEFAULT_EXPECTED_STATUS,
            plan: ConcurrencyPlan::default(),
            transport: TransportOverrides::default(),
        }
    }
}

impl BenchmarkBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target URL and HTTP method.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when the URL is not an absolute http(s) URL
    /// with a host, or the method is not a supported verb.
    pub fn target(&self, url: &str, method: &str) -> BenchResult<Self> {
        let url = parse_target_url(url)?;
        let method = method.parse::<HttpMethod>()?;
        Ok(Self {
            target: Some((url, method)),
            ..self.clone()
        })
    }

    /// Replaces all headers. Names are unique ignoring case; a repeated name
    /// keeps its first position and takes the last value.
    #[must_use]
    pub fn headers<I, K, V>(&self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut merged: Vec<(String, String)> = Vec::new();
        for (key, value) in headers {
            let key = key.into();
            let value = value.into();
            match merged
                .iter_mut()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(&key))
            {
                Some(slot) => slot.1 = value,
                None => merged.push((key, value)),
            }
        }
        Self {
            headers: merged,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn body(&self, body: Body) -> Self {
        Self {
            body: Some(body),
            ..self.clone()
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidConfig` for any status in the 500 series.
    pub fn expected_status(&self, status: u16) -> BenchResult<Self> {
        if status >= RESERVED_STATUS_FLOOR {
            return Err(BenchError::invalid(ValidationError::ReservedStatus {
                status,
            }));
        }
        Ok(Self {
            expected_status: status,
            ..self.clone()
        })
    }

    /// # Errors
    ///
    /// See [`ConcurrencyPlan::new`].
    pub fn concurrency(
        &self,
        connections: usize,
        requests: usize,
        pipeline: PipelineMode,
    ) -> BenchResult<Self> {
        let plan = ConcurrencyPlan::new(connections, requests, pipeline)?;
        Ok(Self {
            plan,
            ..self.clone()
        })
    }

    #[must_use]
    pub fn transport(&self, overrides: TransportOverrides) -> Self {
        Self {
            transport: overrides,
            ..self.clone()
        }
    }

    /// Finalizes the configuration into an engine.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` when no target has been set.
    pub fn build(&self) -> BenchResult<Benchmark> {
        let (url, method) = self
            .target
            .clone()
            .ok_or_else(|| BenchError::invalid(ValidationError::MissingUrl))?;
        let config = BenchmarkConfig {
            url,
            method,
            headers: self.headers.clone(),
            body: self.body.clone(),
            expected_status: self.expected_status,
            transport: self.transport.clone(),
        };
        debug!(
            url = %config.url,
            method = %config.method,
            expected_status = config.expected_status,
            connections = self.plan.connections(),
            requests = self.plan.total_requests(),
            pipeline = %self.plan.pipeline(),
            "Benchmark configured"
        );
        Ok(Benchmark::new(config, self.plan))
    }
}

fn parse_target_url(value: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(value.trim()).map_err(|err| ValidationError::InvalidUrl {
        url: value.to_owned(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidUrl {
            url: value.to_owned(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ValidationError::UrlMissingHost {
            url: value.to_owned(),
        });
    }
    Ok(url)
}
