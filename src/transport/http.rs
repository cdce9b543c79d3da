use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Request, redirect};
use tracing::debug;

use crate::bench::{Body, RedirectPolicy, RequestTemplate, TransportOptions};
use crate::error::{TransportError, TransportResult};

use super::{PoolOptions, ResponseMode, Session, Transport};

/// [`Transport`] backed by `reqwest`, one client per session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestTransport;

#[derive(Debug)]
pub struct ReqwestSession {
    client: Client,
}

impl Transport for ReqwestTransport {
    type Session = ReqwestSession;

    fn open(
        &self,
        options: &TransportOptions,
        pool: PoolOptions,
    ) -> TransportResult<Self::Session> {
        let mut builder = Client::builder()
            .connect_timeout(options.connect_timeout)
            .pool_max_idle_per_host(pool.max_connections);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        builder = match options.redirect {
            RedirectPolicy::None => builder.redirect(redirect::Policy::none()),
            RedirectPolicy::Limited(limit) => builder.redirect(redirect::Policy::limited(limit)),
        };

        if options.insecure {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        if options.http1_only {
            builder = builder.http1_only();
        }

        if let Some(user_agent) = options.user_agent.as_ref() {
            builder = builder.user_agent(user_agent.as_str());
        }

        let client = builder.build().map_err(|err| TransportError::Build {
            message: err.to_string(),
        })?;
        debug!(
            max_connections = pool.max_connections,
            pipeline_depth = pool.pipeline_depth,
            "HTTP session opened"
        );
        Ok(ReqwestSession { client })
    }
}

#[async_trait]
impl Session for ReqwestSession {
    async fn send(&self, template: &RequestTemplate, mode: ResponseMode) -> TransportResult<u16> {
        let request = build_request(&self.client, template)?;
        let response = self.client.execute(request).await?;
        let status = response.status().as_u16();
        if matches!(mode, ResponseMode::Drain) {
            drain_response_body(response).await?;
        }
        Ok(status)
    }
}

fn build_request(client: &Client, template: &RequestTemplate) -> Result<Request, reqwest::Error> {
    let mut request_builder = client.request(template.method().into(), template.url().clone());

    for (key, value) in template.headers() {
        request_builder = request_builder.header(key, value);
    }

    request_builder = match template.body() {
        Some(Body::Raw(bytes)) => request_builder.body(bytes.clone()),
        Some(Body::Form(fields)) => request_builder.form(fields),
        None => request_builder,
    };

    request_builder.build()
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
