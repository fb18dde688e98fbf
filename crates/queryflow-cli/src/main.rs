//! QueryFlow CLI - SQL dataflow compiler

use queryflow_cli::cli;
use queryflow_cli::input;
use queryflow_cli::output;

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use queryflow_core::{analyze, api_schema, AnalyzeRequest, BatchResult};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Args, OutputFormat};
use output::{format_json, format_table};

/// At least one statement failed to parse or compile.
const EXIT_FAILURE: u8 = 1;
/// Input could not be read or output could not be written.
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args);

    match run(&args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("queryflow: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

/// Logs go to stderr so they never mix with the report. `RUST_LOG` overrides `-v`.
fn init_logging(args: &Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Compiles every input and writes the report; returns whether any statement failed.
fn run(args: &Args) -> Result<bool> {
    if args.schema {
        let schema = output::json::to_json(&api_schema(), args.compact)?;
        write_output(&args.output, &schema)?;
        return Ok(false);
    }

    let sources = input::read_input(&args.files)?;
    let dialect = args.dialect.into();
    let options = args.analysis_options();
    debug!(?dialect, inputs = sources.len(), "starting analysis");

    let results: Vec<BatchResult> = sources
        .into_iter()
        .map(|source| {
            let request = AnalyzeRequest::new(source.content, dialect)
                .with_source_name(source.name)
                .with_options(options.clone());
            let batch = analyze(&request);
            info!(
                source = request.source_name.as_deref().unwrap_or_default(),
                statements = batch.summary.statement_count,
                errors = batch.summary.error_count,
                "analyzed input"
            );
            batch
        })
        .collect();

    for query in results.iter().flat_map(|batch| &batch.queries) {
        if let Some(error) = &query.error {
            warn!(
                source = query.source_name.as_deref().unwrap_or_default(),
                statement = query.statement_index + 1,
                "{error}"
            );
        }
    }

    let report = match args.format {
        OutputFormat::Json => format_json(&results, args.compact)?,
        OutputFormat::Table => {
            let colored = args.output.is_none() && io::stdout().is_terminal();
            format_table(&results, args.quiet, colored)
        }
    };
    write_output(&args.output, &report)?;

    Ok(results.iter().any(BatchResult::has_errors))
}

fn write_output(path: &Option<PathBuf>, content: &str) -> Result<()> {
    if let Some(path) = path {
        fs::write(path, content)
            .with_context(|| format!("Failed to write to {}", path.display()))?;
    } else {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        // Ensure newline at end for terminal output
        if !content.ends_with('\n') {
            writeln!(stdout).context("Failed to write to stdout")?;
        }
    }
    Ok(())
}
