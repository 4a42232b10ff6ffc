//! Performance gate CLI entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    match perf_gate_cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
