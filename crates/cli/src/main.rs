mod render;

use std::fs;
use std::io::{self, Read};
use std::process;

use anyhow::{Context, Result};
use ariadne::Fmt;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use plotspec_core::{
    CompositorSpec, Namespace, OptsSpec, SpecError, emit_compositors, emit_options,
};
use plotspec_diagnostics::{self as diag, Diagnostic, codes};
use plotspec_registry::{OperationTable, load_registry_from_str};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::render::{Format, print_summary, render_diagnostics};

/// Name shown for the input line in pretty diagnostics.
const LINE_NAME: &str = "<line>";

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "plotspec",
    version,
    about = "Parse plot options and compositor specification lines"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    /// Registry JSON with operations, compositor definitions and namespace
    /// extensions. Without it no operations or derived names are known.
    #[arg(long, global = true)]
    registry: Option<String>,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG`
    /// takes precedence when set.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse an options line and print the options per path.
    Opts {
        /// The line to parse, or `-` to read it from stdin.
        line: String,
    },

    /// Parse a compositor line and print the definitions.
    Compositor {
        /// The line to parse, or `-` to read it from stdin.
        line: String,
    },

    /// Parse a line and print it back in canonical form.
    Format {
        /// Which grammar the line is written in.
        #[arg(value_enum)]
        kind: LineKind,
        /// The line to format, or `-` to read it from stdin.
        line: String,
    },

    /// Explain a diagnostic ID (e.g. SPEC1003).
    Explain { id: String },
}

/// Grammar selector for the `format` command.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LineKind {
    /// Options specification.
    Opts,
    /// Compositor definitions.
    Compositor,
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let format = Format::resolve_or_detect(cli.output.as_deref());

    if let Err(err) = run(cli, format) {
        match format {
            Format::Json => {
                let out = serde_json::json!({
                    "success": false,
                    "error": "command_failed",
                    "message": format!("{err:#}"),
                });
                println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
            }
            Format::Pretty => eprintln!("error: {err:#}"),
        }
        process::exit(1);
    }
}

fn run(cli: Cli, format: Format) -> Result<()> {
    let registry = cli.registry.as_deref();
    match cli.cmd {
        Cmd::Opts { line } => {
            let line = read_line(&line)?;
            let (table, namespace) = load_registry(registry, format)?;
            let result = OptsSpec::new(&table).with_namespace(namespace).parse(&line);
            report(&line, "options", result, format)
        }
        Cmd::Compositor { line } => {
            let line = read_line(&line)?;
            let (table, namespace) = load_registry(registry, format)?;
            let result = CompositorSpec::new(&table)
                .with_namespace(namespace)
                .parse(&line);
            report(&line, "definitions", result, format)
        }
        Cmd::Format { kind, line } => {
            let line = read_line(&line)?;
            let (table, namespace) = load_registry(registry, format)?;
            let result = match kind {
                LineKind::Opts => OptsSpec::new(&table)
                    .with_namespace(namespace)
                    .parse(&line)
                    .map(|spec| emit_options(&spec)),
                LineKind::Compositor => CompositorSpec::new(&table)
                    .with_namespace(namespace)
                    .parse(&line)
                    .map(|defs| emit_compositors(&defs)),
            };
            cmd_format(&line, result, format)
        }
        Cmd::Explain { id } => cmd_explain(&id, format),
    }
}

// ── Commands ────────────────────────────────────────────────────────────

/// Print a parse result. On success the value goes to stdout; on failure
/// the diagnostic is rendered and the process exits with code 1.
fn report<T: Serialize>(
    line: &str,
    key: &str,
    result: Result<T, SpecError>,
    format: Format,
) -> Result<()> {
    let (value, diagnostics) = match result {
        Ok(value) => (Some(value), Vec::new()),
        Err(err) => (None, vec![err.to_diagnostic()]),
    };

    match format {
        Format::Json => {
            let mut out = serde_json::Map::new();
            out.insert(key.to_string(), serde_json::to_value(&value)?);
            out.insert("diagnostics".into(), serde_json::to_value(&diagnostics)?);
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            if let Some(value) = &value {
                println!("{}", serde_json::to_string_pretty(value)?);
            }
            render_diagnostics(line, LINE_NAME, &diagnostics);
            print_summary(&diagnostics);
        }
    }

    exit_on_errors(&diagnostics);
    Ok(())
}

fn cmd_format(line: &str, result: Result<String, SpecError>, format: Format) -> Result<()> {
    let diagnostics = match &result {
        Ok(_) => Vec::new(),
        Err(err) => vec![err.to_diagnostic()],
    };

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "formatted": result.as_ref().ok(),
                "changed": result.as_ref().ok().map(|f| f != line.trim()),
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            if let Ok(formatted) = &result {
                println!("{formatted}");
            }
            render_diagnostics(line, LINE_NAME, &diagnostics);
            print_summary(&diagnostics);
        }
    }

    exit_on_errors(&diagnostics);
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let text = diag::explain(id);
            let out = serde_json::json!({
                "id": id,
                "explanation": text,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // The explanation is the command's output, so stdout.
            if let Some(text) = diag::explain(id) {
                println!("{}: {}", id.fg(ariadne::Color::Cyan), text);
            } else {
                println!("{id}: (no explanation available)");
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Log to stderr. `RUST_LOG` wins; otherwise `-v` flags pick the level.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Exit with code 1 if any diagnostic is an error.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics
        .iter()
        .any(|d| matches!(d.severity, diag::Severity::Error))
    {
        process::exit(1);
    }
}

/// The line argument, or stdin when it is `-` (one trailing newline
/// removed).
fn read_line(arg: &str) -> Result<String> {
    if arg != "-" {
        return Ok(arg.to_string());
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read line from stdin")?;
    let trimmed = buf
        .strip_suffix('\n')
        .map(|s| s.strip_suffix('\r').unwrap_or(s))
        .unwrap_or(&buf);
    Ok(trimmed.to_string())
}

/// The registry table and the namespace it extends.
fn load_registry(path: Option<&str>, format: Format) -> Result<(OperationTable, Namespace)> {
    let table = resolve_registry(path, format)?;
    let namespace = Namespace::default().extend_from_config(&table.namespace);
    Ok((table, namespace))
}

/// Load the registry file, or an empty table when none is given.
///
/// An unreadable file is a command failure; a file that fails validation is
/// reported as a `SPEC4001` diagnostic.
fn resolve_registry(path: Option<&str>, format: Format) -> Result<OperationTable> {
    let Some(path) = path else {
        return Ok(OperationTable::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read registry file '{path}'"))?;
    match load_registry_from_str(&json) {
        Ok(table) => {
            tracing::info!(
                path,
                operations = table.operations.len(),
                definitions = table.definitions.len(),
                "loaded registry"
            );
            Ok(table)
        }
        Err(err) => {
            let diagnostics = vec![Diagnostic::error(
                codes::REGISTRY_INVALID,
                format!("invalid registry file '{path}': {err}"),
                None,
            )];
            match format {
                Format::Json => {
                    let out = serde_json::json!({ "diagnostics": diagnostics });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                }
                Format::Pretty => {
                    render_diagnostics(&json, path, &diagnostics);
                    print_summary(&diagnostics);
                }
            }
            process::exit(1);
        }
    }
}
