//! CLI for the performance gate.
//!
//! This crate provides the `perf-gate` command with two modes: `compare`
//! checks a current benchmark run against a baseline, and `validate` checks a
//! single run against absolute thresholds.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use perf_gate_benchmarks::console::{ComparisonConsole, ValidationConsole};
use perf_gate_benchmarks::io::write_report;
use perf_gate_benchmarks::markdown::{ComparisonMarkdown, ValidationMarkdown};
use perf_gate_benchmarks::{
    run_comparison, run_validation, CompareRequest, GateOutcome, Tolerance, ValidateRequest,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Performance gate CLI.
#[derive(Parser, Debug)]
#[command(name = "perf-gate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Diagnostic log level, written to stderr.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compare a current benchmark run against a baseline.
    ///
    /// Fails when any shared metric regressed by more than the tolerance.
    Compare {
        /// Baseline benchmark results (JSON).
        baseline: PathBuf,

        /// Current benchmark results (JSON).
        current: PathBuf,

        /// Relative change treated as noise, as a fraction (0.10 = 10%).
        #[arg(long, default_value_t = Tolerance::DEFAULT.fraction())]
        tolerance: f64,

        /// Write a markdown comparison report to this file.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report regressions without failing.
        #[arg(long)]
        warn_only: bool,
    },

    /// Validate a benchmark run against absolute thresholds.
    ///
    /// Fails when any available gated metric exceeds its limit.
    Validate {
        /// Benchmark results (JSON).
        benchmark_file: PathBuf,

        /// Report failures without failing.
        #[arg(long)]
        warn_only: bool,

        /// Fail on threshold violations (the default).
        #[arg(long)]
        strict: bool,

        /// Write a markdown performance report to this file.
        #[arg(long)]
        report: Option<PathBuf>,

        /// Also list passed and skipped checks.
        #[arg(short, long)]
        verbose: bool,

        /// TOML file overriding the default thresholds.
        #[arg(long)]
        thresholds: Option<PathBuf>,
    },
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Verdicts and path resolution
    Info,
    /// Skipped entries and omitted values
    Debug,
    /// Everything
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Install the stderr log subscriber.
pub fn init_tracing(level: LogLevel) {
    // Ignore a second install, e.g. when embedded in a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level.directive()))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI with the process arguments.
///
/// # Returns
///
/// The process exit code: 0 when the gate passed or `--warn-only` was given,
/// 1 when it failed.
///
/// # Errors
///
/// Returns an error if an input cannot be loaded or an argument is invalid.
pub fn run() -> Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return usage_exit(&err),
    };
    init_tracing(cli.log_level);
    execute(cli.command)
}

/// Execute a parsed command.
pub fn execute(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Compare {
            baseline,
            current,
            tolerance,
            output,
            warn_only,
        } => {
            let request = CompareRequest {
                baseline,
                current,
                tolerance: Tolerance::new(tolerance)?,
            };
            let run = run_comparison(&request).context("comparison failed")?;

            print!(
                "{}",
                ComparisonConsole {
                    result: &run.result,
                    baseline: &request.baseline,
                    current: &request.current,
                }
            );

            if let Some(path) = output {
                let report = ComparisonMarkdown {
                    result: &run.result,
                    baseline: &request.baseline,
                    current: &request.current,
                }
                .to_string();
                save_report(&path, &report);
            }

            Ok(finish(run.outcome(), warn_only))
        }
        Commands::Validate {
            benchmark_file,
            warn_only,
            strict: _,
            report,
            verbose,
            thresholds,
        } => {
            println!("[INFO] Validating performance gates...");
            println!("   Input: {}", benchmark_file.display());
            println!(
                "   Mode: {}",
                if warn_only { "warn-only" } else { "strict" }
            );

            let request = ValidateRequest {
                path: benchmark_file,
                thresholds,
            };
            let run = run_validation(&request).context("validation failed")?;

            println!(
                "   Found: {} benchmark(s), summary: {}",
                run.document.benchmark_count(),
                if run.document.has_summary() { "yes" } else { "no" }
            );

            print!(
                "{}",
                ValidationConsole {
                    result: &run.result,
                    verbose,
                }
            );

            if let Some(path) = report {
                let markdown = ValidationMarkdown {
                    document: &run.document,
                    result: &run.result,
                    table: &run.table,
                    generated_at: Utc::now(),
                }
                .to_string();
                save_report(&path, &markdown);
            }

            Ok(finish(run.outcome(), warn_only))
        }
    }
}

/// Print a clap error, help or version text. Usage errors exit 1.
fn usage_exit(err: &clap::Error) -> Result<ExitCode> {
    err.print().context("failed to print usage")?;
    if err.use_stderr() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn finish(outcome: GateOutcome, warn_only: bool) -> ExitCode {
    if !outcome.is_passed() && warn_only {
        println!();
        println!("[WARN] Running in warn-only mode - not failing the build");
    }
    ExitCode::from(outcome.exit_code(warn_only))
}

fn save_report(path: &Path, content: &str) {
    match write_report(path, content) {
        Ok(()) => {
            info!(path = %path.display(), "Report written");
            println!();
            println!("Report written to: {}", path.display());
        }
        Err(err) => {
            let err = anyhow::Error::new(err);
            warn!("Failed to write report: {err:#}");
            eprintln!("Warning: {err:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compare_defaults() {
        let cli = Cli::try_parse_from(["perf-gate", "compare", "a.json", "b.json"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Warn);
        match cli.command {
            Commands::Compare {
                tolerance,
                output,
                warn_only,
                ..
            } => {
                assert_eq!(tolerance, 0.10);
                assert!(output.is_none());
                assert!(!warn_only);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_validate_flags() {
        let cli = Cli::try_parse_from([
            "perf-gate",
            "validate",
            "bench.json",
            "--warn-only",
            "--strict",
            "-v",
            "--report",
            "out.md",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.command {
            Commands::Validate {
                benchmark_file,
                warn_only,
                strict,
                report,
                verbose,
                thresholds,
            } => {
                assert_eq!(benchmark_file, PathBuf::from("bench.json"));
                assert!(warn_only && strict && verbose);
                assert_eq!(report, Some(PathBuf::from("out.md")));
                assert!(thresholds.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_usage_errors_use_stderr() {
        let err = Cli::try_parse_from([
            "perf-gate",
            "compare",
            "a.json",
            "b.json",
            "--tolerance",
            "abc",
        ])
        .unwrap_err();
        assert!(err.use_stderr());

        let help = Cli::try_parse_from(["perf-gate", "--help"]).unwrap_err();
        assert!(!help.use_stderr());
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Cli::try_parse_from(["perf-gate"]).is_err());
    }
}
