use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use super::config::BenchmarkConfig;
use super::types::{Body, HttpMethod};

pub const DEFAULT_USER_AGENT: &str = concat!("reqbench/", env!("CARGO_PKG_VERSION"));
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPolicy {
    None,
    Limited(usize),
}

/// Client-level settings every session of a run is opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    pub insecure: bool,
    pub redirect: RedirectPolicy,
    pub connect_timeout: Duration,
    /// `None` leaves the overall request time unbounded.
    pub timeout: Option<Duration>,
    pub http1_only: bool,
    pub user_agent: Option<String>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            insecure: true,
            redirect: RedirectPolicy::None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: None,
            http1_only: false,
            user_agent: Some(DEFAULT_USER_AGENT.to_owned()),
        }
    }
}

/// User overrides layered on top of [`TransportOptions::default`].
///
/// URL, method, headers and body are never taken from here; `default_headers`
/// only fill in names the configured headers do not already set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportOverrides {
    pub insecure: Option<bool>,
    /// Redirects to follow; `0` disables following.
    pub redirect: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    /// Overall request timeout; `0` means unbounded.
    pub timeout_ms: Option<u64>,
    pub http1_only: Option<bool>,
    pub user_agent: Option<String>,
    pub default_headers: BTreeMap<String, String>,
}

impl TransportOverrides {
    /// Returns `self` with every field set in `other` taking precedence.
    #[must_use]
    pub fn layered(&self, other: &TransportOverrides) -> Self {
        let mut default_headers = self.default_headers.clone();
        default_headers.extend(other.default_headers.clone());
        Self {
            insecure: other.insecure.or(self.insecure),
            redirect: other.redirect.or(self.redirect),
            connect_timeout_ms: other.connect_timeout_ms.or(self.connect_timeout_ms),
            timeout_ms: other.timeout_ms.or(self.timeout_ms),
            http1_only: other.http1_only.or(self.http1_only),
            user_agent: other.user_agent.clone().or_else(|| self.user_agent.clone()),
            default_headers,
        }
    }
}

impl TransportOptions {
    #[must_use]
    pub fn with_overrides(mut self, overrides: &TransportOverrides) -> Self {
        if let Some(insecure) = overrides.insecure {
            self.insecure = insecure;
        }
        if let Some(limit) = overrides.redirect {
            self.redirect = if limit == 0 {
                RedirectPolicy::None
            } else {
                RedirectPolicy::Limited(usize::try_from(limit).unwrap_or(usize::MAX))
            };
        }
        if let Some(ms) = overrides.connect_timeout_ms {
            self.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = overrides.timeout_ms {
            self.timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(http1_only) = overrides.http1_only {
            self.http1_only = http1_only;
        }
        if let Some(user_agent) = overrides.user_agent.as_ref() {
            self.user_agent = if user_agent.is_empty() {
                None
            } else {
                Some(user_agent.clone())
            };
        }
        self
    }
}

/// Immutable request descriptor shared by every request of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTemplate {
    method: HttpMethod,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Body>,
    options: TransportOptions,
}

impl RequestTemplate {
    #[must_use]
    pub fn new(config: &BenchmarkConfig) -> Self {
        let overrides = config.transport_overrides();
        let mut headers = config.headers().to_vec();
        for (key, value) in &overrides.default_headers {
            if !headers
                .iter()
                .any(|(existing, _)| existing.eq_ignore_ascii_case(key))
            {
                headers.push((key.clone(), value.clone()));
            }
        }

        let method = config.method();
        let body = config
            .body()
            .filter(|body| method.carries_body() && !body.is_empty())
            .cloned();

        Self {
            method,
            url: config.url().clone(),
            headers,
            body,
            options: TransportOptions::default().with_overrides(overrides),
        }
    }

    #[must_use]
    pub const fn method(&self) -> HttpMethod {
        self.method
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
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
    pub const fn options(&self) -> &TransportOptions {
        &self.options
    }

    /// Headers rendered as `Key: Value` lines, in insertion order.
    #[must_use]
    pub fn header_lines(&self) -> Vec<String> {
        self.headers
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect()
    }
}
