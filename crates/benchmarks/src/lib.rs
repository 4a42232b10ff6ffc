//! Performance regression gate for a 1 kHz real-time loop.
//!
//! This crate turns benchmark snapshots into a pass/fail verdict, either by
//! comparing a current run against a baseline or by checking a single run
//! against absolute latency budgets.
//!
//! # Quick Start
//!
//! ```no_run
//! use perf_gate_benchmarks::{run_validation, ValidateRequest};
//!
//! let run = run_validation(&ValidateRequest {
//!     path: "benchmark_results.json".into(),
//!     thresholds: None,
//! })?;
//!
//! for failure in run.result.failed() {
//!     println!("{}: {:?} exceeds {}", failure.name, failure.value, failure.threshold);
//! }
//! # Ok::<(), perf_gate_benchmarks::GateError>(())
//! ```
//!
//! # Modules
//!
//! - [`result`] - Benchmark snapshot document
//! - [`io`] - Reading snapshots and writing reports
//! - [`metric`] - Normalized metric types
//! - [`extract`] - Metric extraction from snapshots
//! - [`compare`] - Baseline comparison and change classification
//! - [`threshold`] - Absolute threshold validation
//! - [`console`] - Console reports
//! - [`markdown`] - Markdown reports
//! - [`gate`] - End-to-end gate runs

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod compare;
pub mod console;
pub mod error;
pub mod extract;
pub mod gate;
pub mod io;
pub mod markdown;
pub mod metric;
pub mod result;
pub mod threshold;

pub use compare::{ChangeKind, ComparisonResult, MetricComparison, Tolerance};
pub use error::{GateError, LoadError, ReportError, ThresholdConfigError};
pub use gate::{
    run_comparison, run_validation, CompareRequest, ComparisonRun, GateOutcome, ValidateRequest,
    ValidationRun,
};
pub use metric::{GateKind, Metric, MetricSet, Polarity, Unit};
pub use result::{BenchmarkDocument, BenchmarkEntry};
pub use threshold::{ThresholdRule, ThresholdStatus, ThresholdTable, ValidationResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_c_missed_ticks_fail_the_gate() {
        let document: BenchmarkDocument =
            r#"{"summary": {"missed_tick_rate": 0.00002}}"#.parse().unwrap();
        let result = threshold::validate(&extract::extract(&document), &ThresholdTable::default());

        assert!(!result.passed);
        let outcome = if result.passed {
            GateOutcome::Passed
        } else {
            GateOutcome::Failed
        };
        assert_eq!(outcome.exit_code(false), 1);
        assert_eq!(outcome.exit_code(true), 0);
    }

    #[test]
    fn test_metrics_carry_units() {
        let document: BenchmarkDocument = r#"{
            "summary": {"rt_loop_us": 900},
            "benchmarks": [{"name": "rt_timing_1khz", "percentiles": {"p99": 2500}}]
        }"#
        .parse()
        .unwrap();
        let metrics = extract::extract(&document);

        assert_eq!(metrics["rt_loop_us"].unit(), Unit::Microseconds);
        assert_eq!(metrics["rt_timing_1khz/p99"].value(), 2.5);
    }
}
