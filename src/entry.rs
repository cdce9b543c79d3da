use std::ffi::OsString;
use std::path::Path;

use clap::{ArgMatches, CommandFactory, FromArgMatches};

use reqbench::args::{BenchArgs, OutputFormat};
use reqbench::bench::{Benchmark, Body, Field};
use reqbench::config::{DEFAULT_CONFIG_FILES, apply_config, load_config};
use reqbench::error::{AppError, AppResult, ValidationError};
use reqbench::report;
use reqbench::transport::ReqwestTransport;

pub(crate) fn run() -> AppResult<()> {
    let Some((mut args, matches)) = parse_args()? else {
        return Ok(());
    };

    if let Some(config) = load_config(args.config.as_deref())? {
        apply_config(&mut args, &matches, &config)?;
    }

    reqbench::logger::init_logging(args.verbose, args.no_color);

    let field = args
        .field
        .as_deref()
        .map(str::parse::<Field>)
        .transpose()?;
    let mut bench = build_benchmark(&args)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| {
            AppError::validation(ValidationError::RuntimeBuildFailed {
                reason: err.to_string(),
            })
        })?;
    let outcome = runtime.block_on(bench.execute(&ReqwestTransport));

    if let Some(field) = field {
        println!("{}", serde_json::to_string_pretty(&bench.field(field)?)?);
    }
    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            tracing::error!("{}", err);
            return Err(AppError::bench(err));
        }
    };
    if field.is_some() {
        return Ok(());
    }

    match args.output_format {
        OutputFormat::Text => {
            for line in report::summary_lines(&bench, &result) {
                println!("{}", line);
            }
        }
        OutputFormat::Json => {
            let value = report::status_value(bench.result())?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn parse_args() -> AppResult<Option<(BenchArgs, ArgMatches)>> {
    let mut cmd = BenchArgs::command();
    let raw_args: Vec<OsString> = std::env::args_os().collect();

    if should_show_help(&raw_args) {
        cmd.print_help()?;
        println!();
        return Ok(None);
    }

    let matches = cmd.get_matches_from(raw_args);
    let args = BenchArgs::from_arg_matches(&matches)?;

    Ok(Some((args, matches)))
}

fn should_show_help(raw_args: &[OsString]) -> bool {
    let treat_as_empty =
        matches!(raw_args, [] | [_]) || matches!(raw_args, [_, second] if second == "--");
    if !treat_as_empty {
        return false;
    }

    !DEFAULT_CONFIG_FILES
        .iter()
        .any(|path| Path::new(path).exists())
}

/// Maps parsed arguments onto the engine builder.
fn build_benchmark(args: &BenchArgs) -> AppResult<Benchmark> {
    let url = args
        .url
        .as_deref()
        .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;

    let mut builder = Benchmark::builder().target(url, args.method.as_str())?;
    if !args.headers.is_empty() {
        builder = builder.headers(args.headers.iter().cloned());
    }
    match (args.data.as_ref(), args.form.is_empty()) {
        (Some(_), false) => {
            return Err(AppError::validation(ValidationError::BodyFormConflict));
        }
        (Some(data), true) => builder = builder.body(Body::raw(data.clone())),
        (None, false) => builder = builder.body(Body::form(args.form.iter().cloned())),
        (None, true) => {}
    }

    let bench = builder
        .expected_status(args.expected_status)?
        .concurrency(args.connections, args.requests, args.pipeline)?
        .transport(args.transport_overrides())
        .build()?;
    Ok(bench)
}
