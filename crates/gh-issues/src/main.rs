//! gh-issues
//!
//! A thin, machine-friendly front end to the GitHub CLI. One invocation runs
//! one command and prints exactly one response, either as tables and
//! `key: value` lines or as a single JSON document.

use anyhow::{Context, Result};
use clap::Parser;
use gh_issues::cli::{requested_output_mode, Cli};
use gh_issues::output::{ErrorRecord, ExitCode, OutputMode, Renderer};
use gh_issues::{IssueRouter, ProcessBackend, Settings};
use std::env;
use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "GH_ISSUES_LOG";

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::Failure
        }
    };

    std::process::exit(exit_code.code());
}

fn run() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => {
            // --help and --version
            e.print()?;
            return Ok(ExitCode::Success);
        }
        Err(e) => {
            render_failure(parse_error_mode(), parse_error_record(&e))?;
            return Ok(ExitCode::Failure);
        }
    };

    init_tracing(cli.verbose);

    let current_dir = env::current_dir().context("Failed to determine current directory")?;
    let settings = match Settings::from_env(&current_dir) {
        Ok(settings) => settings,
        Err(e) => {
            let mode = cli.output.unwrap_or_default();
            tracing::error!(error = %format!("{:#}", e), "configuration rejected");
            render_failure(
                mode,
                ErrorRecord::new("Invalid configuration").with_details(format!("{:#}", e)),
            )?;
            return Ok(ExitCode::Failure);
        }
    };

    let mode = cli.output.unwrap_or(settings.default_output);
    tracing::debug!(program = %settings.program, ?mode, "starting");

    let backend = ProcessBackend::new(settings.program.clone());
    let router = IssueRouter::new(backend, settings);

    let stdout = io::stdout();
    let mut renderer = Renderer::new(stdout.lock(), mode).with_color(use_color());
    let mut stdin = io::stdin().lock();

    Ok(router.execute(cli.command, &mut renderer, &mut stdin))
}

/// Logs go to stderr so stdout stays a single document.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn use_color() -> bool {
    io::stdout().is_terminal() && env::var_os("NO_COLOR").is_none()
}

fn render_failure(mode: OutputMode, record: ErrorRecord) -> Result<()> {
    let stdout = io::stdout();
    let mut renderer = Renderer::new(stdout.lock(), mode).with_color(use_color());
    match renderer.error(&record) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e.into()),
        _ => Ok(()),
    }
}

/// Mode for argument errors: `--output` if it can be read off the raw
/// arguments, else the configured default. A config that fails to load is
/// ignored here; the argument error is what gets reported.
fn parse_error_mode() -> OutputMode {
    requested_output_mode(env::args())
        .or_else(|| {
            env::current_dir()
                .ok()
                .and_then(|dir| Settings::from_env(&dir).ok())
                .map(|settings| settings.default_output)
        })
        .unwrap_or_default()
}

/// First line of a clap error as the message, the rest (usage, hints) as details.
fn parse_error_record(err: &clap::Error) -> ErrorRecord {
    let text = err.to_string();
    let mut parts = text.trim().splitn(2, '\n');
    let message = parts
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ")
        .to_string();

    match parts.next().map(str::trim).filter(|d| !d.is_empty()) {
        Some(details) => ErrorRecord::new(message).with_details(details),
        None => ErrorRecord::new(message),
    }
}
