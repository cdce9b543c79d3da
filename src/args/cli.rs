use clap::Parser;
use std::time::Duration;

use crate::bench::{HttpMethod, PipelineMode, TransportOverrides};

use super::parsers::{
    duration_millis, parse_bool_env, parse_duration_arg, parse_form_entry, parse_header,
    parse_method, parse_pipeline,
};
use super::types::OutputFormat;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Single-endpoint HTTP benchmark - connectivity probe, sequential baseline and bounded concurrent run combined into one throughput score."
)]
pub struct BenchArgs {
    /// Target URL (absolute http or https)
    #[arg(long, short)]
    pub url: Option<String>,

    /// HTTP method (GET, POST, PUT, DELETE, HEAD, PATCH)
    #[arg(long, short = 'X', default_value = "GET", value_parser = parse_method)]
    pub method: HttpMethod,

    /// HTTP headers in 'Key: Value' format (repeatable); replaces the default Cache-Control header
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Raw request body (sent for POST, PUT and PATCH)
    #[arg(long, short, conflicts_with = "form")]
    pub data: Option<String>,

    /// Url-encoded form field in 'name=value' format (repeatable)
    #[arg(long, short = 'F', value_parser = parse_form_entry)]
    pub form: Vec<(String, String)>,

    /// Status code every response must carry
    #[arg(long = "status", short = 's', default_value = "200")]
    pub expected_status: u16,

    /// Connection ceiling for the concurrent phase
    #[arg(long, short = 'c', default_value = "10")]
    pub connections: usize,

    /// Requests issued by each of the sequential and concurrent phases
    #[arg(long, short = 'n', default_value = "1000")]
    pub requests: usize,

    /// Per-connection in-flight depth for the concurrent phase:
    /// optimal = ceil(requests / connections), max = requests
    #[arg(long, default_value = "optimal", value_parser = parse_pipeline)]
    pub pipeline: PipelineMode,

    /// Verify TLS certificates and hostnames
    #[arg(long = "verify-tls")]
    pub verify_tls: bool,

    /// Connect timeout (supports ms/s/m)
    #[arg(long = "connect-timeout", value_parser = parse_duration_arg)]
    pub connect_timeout: Option<Duration>,

    /// Overall request timeout, 0 for none (supports ms/s/m)
    #[arg(long = "timeout", value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Redirects to follow, 0 to never follow
    #[arg(long = "redirect")]
    pub redirect: Option<u32>,

    /// Restrict the client to HTTP/1.1
    #[arg(long = "http1-only")]
    pub http1_only: bool,

    /// User-Agent header sent with every request, empty to omit it
    #[arg(long = "user-agent")]
    pub user_agent: Option<String>,

    /// Path to config file (TOML or JSON); reqbench.toml or reqbench.json is used when present
    #[arg(long = "config")]
    pub config: Option<String>,

    /// Output format for the run summary
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    pub output_format: OutputFormat,

    /// Print a single field as JSON instead of the summary
    /// (result, headers, body, method, url, expectedStatus, configuration)
    #[arg(long = "field")]
    pub field: Option<String>,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable ANSI colors in log output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,

    /// Transport settings loaded from the config file's `[transport]` section.
    #[arg(skip)]
    pub transport: TransportOverrides,
}

impl BenchArgs {
    /// Transport overrides from the config file with CLI flags layered on top.
    #[must_use]
    pub fn transport_overrides(&self) -> TransportOverrides {
        let flags = TransportOverrides {
            insecure: self.verify_tls.then_some(false),
            redirect: self.redirect,
            connect_timeout_ms: self.connect_timeout.map(duration_millis),
            timeout_ms: self.timeout.map(duration_millis),
            http1_only: self.http1_only.then_some(true),
            user_agent: self.user_agent.clone(),
            ..TransportOverrides::default()
        };
        self.transport.layered(&flags)
    }
}
