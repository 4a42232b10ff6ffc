// Copyright 2025 Perf Gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Baseline-versus-current change classification.
//!
//! Only metrics present in both runs are compared. A metric that appears in
//! just one of them is excluded rather than treated as a regression.
//!
//! # Zero baselines
//!
//! A percent change against a zero baseline is undefined. When the current
//! value is also zero the metric is unchanged; otherwise the change is pinned
//! to `+100` (lower-is-better) or `-100` (higher-is-better) so that it always
//! classifies as a regression, and the comparison is marked
//! [`MetricComparison::from_zero`] so reports can label it instead of
//! presenting the number as a real ratio.

use crate::error::GateError;
use crate::metric::{MetricSet, Polarity, Unit};
use std::fmt;

/// Relative tolerance as a fraction in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tolerance(f64);

impl Tolerance {
    /// Default tolerance of 10%.
    pub const DEFAULT: Tolerance = Tolerance(0.10);

    /// Create a tolerance, rejecting values outside `0.0..=1.0`.
    pub fn new(fraction: f64) -> Result<Self, GateError> {
        if fraction.is_finite() && (0.0..=1.0).contains(&fraction) {
            Ok(Self(fraction))
        } else {
            Err(GateError::InvalidTolerance(fraction))
        }
    }

    /// Tolerance as a fraction, e.g. `0.10`.
    pub fn fraction(self) -> f64 {
        self.0
    }

    /// Tolerance as a percentage, e.g. `10.0`.
    pub fn percent(self) -> f64 {
        self.0 * 100.0
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.percent())
    }
}

/// How a metric moved between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Worse by more than the tolerance.
    Regression,
    /// Better by more than the tolerance.
    Improvement,
    /// Within the tolerance band.
    Unchanged,
}

impl ChangeKind {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Regression => "Regression",
            Self::Improvement => "Improvement",
            Self::Unchanged => "Unchanged",
        }
    }
}

/// Comparison of one metric across baseline and current runs.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricComparison {
    /// Metric name.
    pub name: String,
    /// Display name.
    pub label: String,
    /// Baseline value.
    pub baseline_value: f64,
    /// Current value.
    pub current_value: f64,
    /// Unit of both values.
    pub unit: Unit,
    /// Signed percent change relative to the baseline.
    pub change_percent: f64,
    /// Classification of the change.
    pub change: ChangeKind,
    /// Direction of improvement.
    pub polarity: Polarity,
    /// The baseline was zero and the current value is not.
    pub from_zero: bool,
}

impl MetricComparison {
    /// Change column text: a signed percentage, or `new (was 0)` when the
    /// baseline was zero.
    pub fn change_display(&self) -> String {
        if self.from_zero {
            return "new (was 0)".to_string();
        }
        let sign = if self.change_percent > 0.0 { "+" } else { "" };
        format!("{sign}{:.1}%", self.change_percent)
    }
}

/// Result of comparing two metric sets.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    /// Tolerance used for classification.
    pub tolerance: Tolerance,
    /// Every compared metric, sorted by name.
    pub metrics: Vec<MetricComparison>,
}

impl ComparisonResult {
    /// Comparisons classified as regressions, in name order.
    pub fn regressions(&self) -> Vec<&MetricComparison> {
        self.with_change(ChangeKind::Regression)
    }

    /// Comparisons classified as improvements, in name order.
    pub fn improvements(&self) -> Vec<&MetricComparison> {
        self.with_change(ChangeKind::Improvement)
    }

    /// Number of comparisons within tolerance.
    pub fn unchanged_count(&self) -> usize {
        self.with_change(ChangeKind::Unchanged).len()
    }

    /// Whether any metric regressed.
    pub fn has_regressions(&self) -> bool {
        self.metrics.iter().any(|m| m.change == ChangeKind::Regression)
    }

    fn with_change(&self, change: ChangeKind) -> Vec<&MetricComparison> {
        self.metrics.iter().filter(|m| m.change == change).collect()
    }
}

/// Percent change from `baseline` to `current`.
///
/// Returns the change and whether the zero-baseline rule applied.
pub fn change_percent(baseline: f64, current: f64, polarity: Polarity) -> (f64, bool) {
    if baseline == 0.0 {
        if current == 0.0 {
            return (0.0, false);
        }
        let pinned = if polarity.lower_is_better() { 100.0 } else { -100.0 };
        return (pinned, true);
    }

    (((current - baseline) / baseline.abs()) * 100.0, false)
}

/// Classify a percent change against a tolerance.
pub fn classify_change(
    change_percent: f64,
    tolerance: Tolerance,
    polarity: Polarity,
) -> ChangeKind {
    let tolerance_percent = tolerance.percent();

    // Flip the sign so positive always means "worse".
    let worsening = match polarity {
        Polarity::LowerIsBetter => change_percent,
        Polarity::HigherIsBetter => -change_percent,
    };

    if worsening > tolerance_percent {
        ChangeKind::Regression
    } else if worsening < -tolerance_percent {
        ChangeKind::Improvement
    } else {
        ChangeKind::Unchanged
    }
}

/// Compare the metrics present in both sets.
pub fn compare(
    baseline: &MetricSet,
    current: &MetricSet,
    tolerance: Tolerance,
) -> ComparisonResult {
    // BTreeMap iteration keeps the output sorted by name.
    let metrics = baseline
        .iter()
        .filter_map(|(name, base)| {
            let cur = current.get(name)?;
            let polarity = base.polarity();
            let (change, from_zero) = change_percent(base.value(), cur.value(), polarity);
            // A value appearing over a zero baseline regresses at any tolerance.
            let kind = if from_zero {
                ChangeKind::Regression
            } else {
                classify_change(change, tolerance, polarity)
            };

            Some(MetricComparison {
                name: name.clone(),
                label: base.label().to_string(),
                baseline_value: base.value(),
                current_value: cur.value(),
                unit: base.unit(),
                change_percent: change,
                change: kind,
                polarity,
                from_zero,
            })
        })
        .collect();

    ComparisonResult { tolerance, metrics }
}
