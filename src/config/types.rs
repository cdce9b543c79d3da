use serde::Deserialize;

use crate::args::OutputFormat;
use crate::bench::{HttpMethod, PipelineMode, TransportOverrides};

/// Settings accepted from `reqbench.toml` / `reqbench.json`.
///
/// Every key is optional and only fills in what the command line left unset.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub url: Option<String>,
    pub method: Option<HttpMethod>,
    /// Headers in `Key: Value` form.
    pub headers: Option<Vec<String>>,
    pub data: Option<String>,
    /// Form fields in `name=value` form.
    pub form: Option<Vec<String>>,
    #[serde(alias = "expected_status")]
    pub status: Option<u16>,
    #[serde(alias = "threads")]
    pub connections: Option<usize>,
    #[serde(alias = "count")]
    pub requests: Option<usize>,
    #[serde(alias = "piping")]
    pub pipeline: Option<PipelineMode>,
    pub output_format: Option<OutputFormat>,
    pub field: Option<String>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
    pub transport: Option<TransportOverrides>,
}
