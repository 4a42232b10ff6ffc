//! Console output for gate runs.
//!
//! Each renderer is a small borrowing wrapper implementing [`Display`], so
//! callers can `print!` it or turn it into a `String` for tests.
//!
//! [`Display`]: std::fmt::Display

use crate::compare::{ComparisonResult, MetricComparison};
use crate::metric::{format_value, Polarity};
use crate::threshold::{ThresholdResult, ThresholdStatus, ValidationResult};
use colored::Colorize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const RULE: &str = "============================================================";
const SUB_RULE: &str = "----------------------------------------";

/// Console summary of a baseline comparison.
pub struct ComparisonConsole<'a> {
    /// Comparison to render.
    pub result: &'a ComparisonResult,
    /// Baseline snapshot path.
    pub baseline: &'a Path,
    /// Current snapshot path.
    pub current: &'a Path,
}

impl fmt::Display for ComparisonConsole<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let regressions = result.regressions();
        let improvements = result.improvements();

        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Benchmark Comparison Results")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Baseline: {}", self.baseline.display())?;
        writeln!(f, "Current:  {}", self.current.display())?;
        writeln!(f, "Tolerance: {}", result.tolerance)?;
        writeln!(f)?;

        if !regressions.is_empty() {
            writeln!(f, "{}", "REGRESSIONS DETECTED:".red().bold())?;
            write_comparisons(f, &regressions)?;
        }

        if !improvements.is_empty() {
            writeln!(f, "{}", "IMPROVEMENTS:".green().bold())?;
            write_comparisons(f, &improvements)?;
        }

        writeln!(f, "{RULE}")?;
        writeln!(f, "Total metrics compared: {}", result.metrics.len())?;
        writeln!(f, "  Regressions:   {}", regressions.len())?;
        writeln!(f, "  Improvements:  {}", improvements.len())?;
        writeln!(f, "  Unchanged:     {}", result.unchanged_count())?;
        writeln!(f)?;

        if result.metrics.is_empty() {
            writeln!(
                f,
                "{}",
                "RESULT: PASSED - No metrics in common between baseline and current".yellow()
            )
        } else if result.has_regressions() {
            writeln!(
                f,
                "{}",
                "RESULT: FAILED - Performance regressions detected".red().bold()
            )
        } else {
            writeln!(
                f,
                "{}",
                "RESULT: PASSED - No performance regressions detected".green().bold()
            )
        }
    }
}

fn write_comparisons(f: &mut fmt::Formatter<'_>, metrics: &[&MetricComparison]) -> fmt::Result {
    writeln!(f, "{SUB_RULE}")?;
    for metric in metrics {
        writeln!(f, "  {}", metric.label)?;
        writeln!(f, "    Baseline: {}", format_value(metric.baseline_value, metric.unit))?;
        writeln!(f, "    Current:  {}", format_value(metric.current_value, metric.unit))?;
        writeln!(f, "    Change:   {}", metric.change_display())?;
    }
    writeln!(f)
}

/// Console report of a threshold validation.
///
/// Failures are always listed. Passes and skips only appear when `verbose`.
pub struct ValidationConsole<'a> {
    /// Validation to render.
    pub result: &'a ValidationResult,
    /// Also list passed and skipped checks.
    pub verbose: bool,
}

impl fmt::Display for ValidationConsole<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;
        let failed = result.failed();
        let passed = result.with_status(ThresholdStatus::Passed);
        let skipped = result.with_status(ThresholdStatus::Skipped);

        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Performance Gate Validation Report")?;
        writeln!(f, "{RULE}")?;

        if !failed.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", "[FAIL] FAILED METRICS:".red().bold())?;
            writeln!(f, "{SUB_RULE}")?;
            for check in &failed {
                writeln!(f, "  {}", CheckLine(check))?;
                writeln!(f, "     -> Source: {}", check.source)?;
                writeln!(f, "     -> {}", check.description)?;
            }
        }

        if self.verbose && !passed.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", "[PASS] PASSED METRICS:".green())?;
            writeln!(f, "{SUB_RULE}")?;
            for check in &passed {
                writeln!(f, "  {}", CheckLine(check))?;
            }
        }

        if self.verbose && !skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", "[SKIP] SKIPPED METRICS (not available in input):".yellow())?;
            writeln!(f, "{SUB_RULE}")?;
            for check in &skipped {
                writeln!(f, "  {}", check.name)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "{RULE}")?;
        writeln!(
            f,
            "Summary: {}/{} metrics passed",
            passed.len(),
            result.checked_count()
        )?;
        writeln!(f)?;

        if result.is_vacuous() {
            writeln!(
                f,
                "{}",
                "[SKIP] No gated metrics found in input; nothing was validated.".yellow().bold()
            )?;
            return writeln!(f, "   {} check(s) skipped for missing data", skipped.len());
        }

        if result.passed {
            writeln!(f, "{}", "[PASS] All performance gates PASSED!".green().bold())?;
            writeln!(f, "   Requirements validated:")?;
            let mut by_requirement: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
            for check in &passed {
                let tag = check.gate.requirement().unwrap_or("other");
                by_requirement.entry(tag).or_default().push(&check.name);
            }
            for (tag, names) in by_requirement {
                writeln!(f, "   - {tag}: {}", names.join(", "))?;
            }
            return Ok(());
        }

        writeln!(f, "{}", "[FAIL] Performance gate validation FAILED!".red().bold())?;
        writeln!(f, "   {} metric(s) exceeded threshold(s)", failed.len())?;
        writeln!(f)?;
        writeln!(f, "   Failed requirements:")?;
        for check in &failed {
            let comparator = match check.polarity {
                Polarity::LowerIsBetter => ">",
                Polarity::HigherIsBetter => "<",
            };
            let prefix = check
                .gate
                .requirement()
                .map(|tag| format!("{tag}: "))
                .unwrap_or_default();
            writeln!(
                f,
                "   - {prefix}{} = {} {comparator} {} (source: {})",
                check.name,
                display_value(check),
                format_value(check.threshold, check.unit),
                check.source
            )?;
        }
        Ok(())
    }
}

/// `[TAG] name: value (limit: threshold)`
struct CheckLine<'a>(&'a ThresholdResult);

impl fmt::Display for CheckLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = self.0;
        write!(
            f,
            "{} {}: {} (limit: {})",
            check.status.tag(),
            check.name,
            display_value(check),
            format_value(check.threshold, check.unit)
        )
    }
}

fn display_value(check: &ThresholdResult) -> String {
    check
        .value
        .map_or_else(|| "n/a".to_string(), |v| format_value(v, check.unit))
}
