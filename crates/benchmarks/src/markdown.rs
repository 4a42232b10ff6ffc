//! Markdown output generation for gate runs.
//!
//! This module provides the report artifacts attached to pull requests:
//! a comparison report for baseline runs and a performance report for
//! threshold runs.

use crate::compare::{ComparisonResult, MetricComparison};
use crate::metric::format_value;
use crate::result::BenchmarkDocument;
use crate::threshold::{ThresholdStatus, ThresholdTable, ValidationResult};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;
use std::path::Path;

/// Markdown report for a baseline comparison.
pub struct ComparisonMarkdown<'a> {
    /// Comparison to render.
    pub result: &'a ComparisonResult,
    /// Baseline snapshot path.
    pub baseline: &'a Path,
    /// Current snapshot path.
    pub current: &'a Path,
}

impl fmt::Display for ComparisonMarkdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let regressions = result.regressions();
        let improvements = result.improvements();

        writeln!(f, "# Benchmark Comparison Report")?;
        writeln!(f)?;
        writeln!(f, "**Baseline:** `{}`", file_name(self.baseline))?;
        writeln!(f, "**Current:** `{}`", file_name(self.current))?;
        writeln!(f, "**Tolerance:** {}", result.tolerance)?;
        writeln!(f)?;

        if regressions.is_empty() {
            writeln!(f, "## Summary: No Regressions Detected")?;
        } else {
            writeln!(f, "## Summary: {} Regression(s) Detected", regressions.len())?;
        }
        writeln!(f)?;

        if !regressions.is_empty() {
            writeln!(f, "### Regressions")?;
            writeln!(f)?;
            write_change_table(f, &regressions)?;
        }

        if !improvements.is_empty() {
            writeln!(f, "### Improvements")?;
            writeln!(f)?;
            write_change_table(f, &improvements)?;
        }

        writeln!(f, "### All Metrics")?;
        writeln!(f)?;
        writeln!(f, "| Status | Metric | Baseline | Current | Change |")?;
        writeln!(f, "|--------|--------|----------|---------|--------|")?;
        for metric in &result.metrics {
            writeln!(
                f,
                "| {} | {} | {} | {} | {} |",
                metric.change.label(),
                metric.label,
                format_value(metric.baseline_value, metric.unit),
                format_value(metric.current_value, metric.unit),
                metric.change_display()
            )?;
        }
        writeln!(f)
    }
}

fn write_change_table(f: &mut fmt::Formatter<'_>, metrics: &[&MetricComparison]) -> fmt::Result {
    writeln!(f, "| Metric | Baseline | Current | Change |")?;
    writeln!(f, "|--------|----------|---------|--------|")?;
    for metric in metrics {
        writeln!(
            f,
            "| {} | {} | {} | {} |",
            metric.label,
            format_value(metric.baseline_value, metric.unit),
            format_value(metric.current_value, metric.unit),
            metric.change_display()
        )?;
    }
    writeln!(f)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Markdown performance report for a threshold validation.
pub struct ValidationMarkdown<'a> {
    /// Snapshot that was validated, for the raw data section.
    pub document: &'a BenchmarkDocument,
    /// Validation to render.
    pub result: &'a ValidationResult,
    /// Table the snapshot was validated against.
    pub table: &'a ThresholdTable,
    /// Report timestamp.
    pub generated_at: DateTime<Utc>,
}

impl fmt::Display for ValidationMarkdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let status = if result.is_vacuous() {
            "NO DATA (all checks skipped)"
        } else if result.passed {
            "PASSED"
        } else {
            "FAILED"
        };

        writeln!(f, "# Performance Gate Report")?;
        writeln!(f)?;
        writeln!(f, "Generated: {}", self.generated_at.to_rfc3339())?;
        writeln!(f)?;
        writeln!(f, "## Performance Gates Status")?;
        writeln!(f)?;
        writeln!(f, "**Overall Status**: {status}")?;
        writeln!(f)?;

        writeln!(f, "### Thresholds")?;
        writeln!(f)?;
        writeln!(f, "| Gate | Threshold | Unit | Description |")?;
        writeln!(f, "|------|-----------|------|-------------|")?;
        for (gate, rule) in self.table.rules() {
            writeln!(
                f,
                "| {} | {} | {} | {} |",
                gate.summary_label(),
                rule.limit,
                rule.unit,
                rule.description
            )?;
        }
        writeln!(f)?;

        writeln!(f, "### Results")?;
        writeln!(f)?;
        if result.is_vacuous() {
            writeln!(f, "_No gated metrics were present in the input._")?;
        } else {
            writeln!(f, "| Metric | Source | Value | Threshold | Status |")?;
            writeln!(f, "|--------|--------|-------|-----------|--------|")?;
            for check in &result.results {
                let status = match check.status {
                    ThresholdStatus::Passed => "PASS",
                    ThresholdStatus::Failed => "FAIL",
                    ThresholdStatus::Skipped => continue,
                };
                let value = check
                    .value
                    .map_or_else(|| "n/a".to_string(), |v| format_value(v, check.unit));
                writeln!(
                    f,
                    "| {} | `{}` | {} | {} | {} |",
                    check.name,
                    check.source,
                    value,
                    format_value(check.threshold, check.unit),
                    status
                )?;
            }
        }
        let skipped = result.with_status(ThresholdStatus::Skipped).len();
        if skipped > 0 {
            writeln!(f)?;
            writeln!(f, "{skipped} check(s) skipped (metric not available in input).")?;
        }
        writeln!(f)?;

        writeln!(f, "### Raw Benchmark Data")?;
        writeln!(f)?;

        if let Some(summary) = self.document.summary.as_ref().filter(|s| !s.is_empty()) {
            let pretty = serde_json::to_string_pretty(summary).map_err(|_| fmt::Error)?;
            writeln!(f, "#### Summary")?;
            writeln!(f, "```json")?;
            writeln!(f, "{pretty}")?;
            writeln!(f, "```")?;
            writeln!(f)?;
        }

        let entries = self.document.entries();
        if !entries.is_empty() {
            writeln!(f, "#### Benchmarks")?;
            for entry in entries {
                writeln!(f)?;
                writeln!(f, "**{}**", entry.name)?;
                match entry.sample_count {
                    Some(count) => writeln!(f, "- Sample count: {count}")?,
                    None => writeln!(f, "- Sample count: N/A")?,
                }
                if entry.percentiles.is_some() {
                    writeln!(f, "- P50: {} ns", raw(entry.percentile("p50")))?;
                    writeln!(f, "- P99: {} ns", raw(entry.percentile("p99")))?;
                }
            }
        }

        Ok(())
    }
}

fn raw(value: Option<&Value>) -> String {
    value.map_or_else(|| "N/A".to_string(), Value::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{compare, Tolerance};
    use crate::extract::extract;
    use crate::io::parse_document;
    use crate::threshold::validate;
    use chrono::TimeZone;

    fn comparison(baseline: &str, current: &str) -> ComparisonResult {
        compare(
            &extract(&parse_document(baseline).unwrap()),
            &extract(&parse_document(current).unwrap()),
            Tolerance::DEFAULT,
        )
    }

    #[test]
    fn test_comparison_report_tables() {
        let result = comparison(
            r#"{"summary": {"jitter_p99_ms": 0.20, "rt_loop_us": 900, "processing_time_p99_us": 200}}"#,
            r#"{"summary": {"jitter_p99_ms": 0.30, "rt_loop_us": 905, "processing_time_p99_us": 100}}"#,
        );
        let report = ComparisonMarkdown {
            result: &result,
            baseline: Path::new("/tmp/ci/baseline.json"),
            current: Path::new("/tmp/ci/current.json"),
        }
        .to_string();

        assert!(report.starts_with("# Benchmark Comparison Report"));
        assert!(report.contains("**Baseline:** `baseline.json`"));
        assert!(report.contains("**Tolerance:** 10%"));
        assert!(report.contains("## Summary: 1 Regression(s) Detected"));
        assert!(report.contains("### Regressions"));
        assert!(report.contains("| P99 Jitter | 0.2000ms | 0.3000ms | +50.0% |"));
        assert!(report.contains("### Improvements"));
        assert!(report.contains("| Processing Time (P99) | 200.00us | 100.00us | -50.0% |"));
        assert!(report.contains("| Unchanged | RT Loop Time | 900.00us | 905.00us | +0.6% |"));
    }

    #[test]
    fn test_comparison_report_without_regressions() {
        let result = comparison(
            r#"{"summary": {"rt_loop_us": 900}}"#,
            r#"{"summary": {"rt_loop_us": 900}}"#,
        );
        let report = ComparisonMarkdown {
            result: &result,
            baseline: Path::new("a.json"),
            current: Path::new("b.json"),
        }
        .to_string();

        assert!(report.contains("## Summary: No Regressions Detected"));
        assert!(!report.contains("### Regressions"));
        assert!(!report.contains("### Improvements"));
        assert!(report.contains("### All Metrics"));
    }

    #[test]
    fn test_zero_baseline_labelled() {
        let result = comparison(
            r#"{"benchmarks": [{"name": "rt_timing_1khz", "custom_metrics": {"rt_heap_allocs": 0}}]}"#,
            r#"{"benchmarks": [{"name": "rt_timing_1khz", "custom_metrics": {"rt_heap_allocs": 4}}]}"#,
        );
        let report = ComparisonMarkdown {
            result: &result,
            baseline: Path::new("a.json"),
            current: Path::new("b.json"),
        }
        .to_string();

        assert!(report.contains("| rt_timing_1khz/rt_heap_allocs | 0.000000 | 4.00 | new (was 0) |"));
    }

    #[test]
    fn test_validation_report() {
        let document = parse_document(
            r#"{
                "summary": {"missed_tick_rate": 0.00002, "rt_loop_us": 800},
                "benchmarks": [{"name": "rt_timing_1khz", "percentiles": {"p50": 1200, "p99": 4000}, "sample_count": 5000}]
            }"#,
        )
        .unwrap();
        let table = ThresholdTable::default();
        let result = validate(&extract(&document), &table);
        let generated_at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        let report = ValidationMarkdown {
            document: &document,
            result: &result,
            table: &table,
            generated_at,
        }
        .to_string();

        assert!(report.contains("Generated: 2025-01-02T03:04:05+00:00"));
        assert!(report.contains("**Overall Status**: FAILED"));
        assert!(report.contains("| Missed Tick Rate | 0.00001 |  | Missed tick rate ratio (0.001% = 0.00001) |"));
        assert!(report.contains(
            "| Missed Tick Rate | `summary.missed_tick_rate` | 2.00e-5 | 1.00e-5 | FAIL |"
        ));
        assert!(report.contains("| RT Loop Total | `summary.rt_loop_us` | 800.00us | 1000.00us | PASS |"));
        assert!(!report.contains("| Processing Time P99 | `summary"));
        assert!(report.contains("3 check(s) skipped"));
        assert!(report.contains("\"rt_loop_us\": 800"));
        assert!(report.contains("**rt_timing_1khz**"));
        assert!(report.contains("- Sample count: 5000"));
        assert!(report.contains("- P99: 4000 ns"));
    }

    #[test]
    fn test_validation_report_no_data() {
        let document = parse_document("{}").unwrap();
        let table = ThresholdTable::default();
        let result = validate(&extract(&document), &table);

        let report = ValidationMarkdown {
            document: &document,
            result: &result,
            table: &table,
            generated_at: Utc::now(),
        }
        .to_string();

        assert!(report.contains("**Overall Status**: NO DATA (all checks skipped)"));
        assert!(report.contains("_No gated metrics were present in the input._"));
        assert!(!report.contains("#### Summary"));
    }
}
