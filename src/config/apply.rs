use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{BenchArgs, parse_form_entry, parse_header};
use crate::error::{AppError, AppResult, ConfigError};

use super::types::ConfigFile;

/// Applies configuration values to CLI arguments.
///
/// A value from the file is used only when the matching flag was not given
/// on the command line.
///
/// # Errors
///
/// Returns an error when config values are invalid or conflict with each other.
pub fn apply_config(
    args: &mut BenchArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<()> {
    if config.data.is_some() && config.form.is_some() {
        return Err(AppError::config(ConfigError::Conflict {
            left: "data",
            right: "form",
        }));
    }

    if !is_cli(matches, "url")
        && let Some(url) = config.url.clone()
    {
        args.url = Some(url);
    }

    if !is_cli(matches, "method")
        && let Some(method) = config.method
    {
        args.method = method;
    }

    if !is_cli(matches, "headers")
        && let Some(headers) = config.headers.as_ref()
    {
        let mut parsed = Vec::with_capacity(headers.len());
        for header in headers {
            parsed.push(
                parse_header(header)
                    .map_err(|source| AppError::config(ConfigError::InvalidHeader { source }))?,
            );
        }
        args.headers = parsed;
    }

    // A body given on the command line replaces either body kind from the file.
    let cli_body = is_cli(matches, "data") || is_cli(matches, "form");
    if !cli_body {
        if let Some(data) = config.data.clone() {
            args.data = Some(data);
        }
        if let Some(form) = config.form.as_ref() {
            let mut parsed = Vec::with_capacity(form.len());
            for entry in form {
                parsed.push(
                    parse_form_entry(entry)
                        .map_err(|source| AppError::config(ConfigError::InvalidForm { source }))?,
                );
            }
            args.form = parsed;
        }
    }

    if !is_cli(matches, "expected_status")
        && let Some(status) = config.status
    {
        args.expected_status = status;
    }

    if !is_cli(matches, "connections")
        && let Some(connections) = config.connections
    {
        args.connections = connections;
    }

    if !is_cli(matches, "requests")
        && let Some(requests) = config.requests
    {
        args.requests = requests;
    }

    if !is_cli(matches, "pipeline")
        && let Some(pipeline) = config.pipeline
    {
        args.pipeline = pipeline;
    }

    if !is_cli(matches, "output_format")
        && let Some(format) = config.output_format
    {
        args.output_format = format;
    }

    if !is_cli(matches, "field")
        && let Some(field) = config.field.clone()
    {
        args.field = Some(field);
    }

    if !is_cli(matches, "verbose")
        && let Some(verbose) = config.verbose
    {
        args.verbose = verbose;
    }

    if !is_cli(matches, "no_color")
        && let Some(no_color) = config.no_color
    {
        args.no_color = no_color;
    }

    if let Some(transport) = config.transport.as_ref() {
        args.transport = transport.clone();
    }

    Ok(())
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}
