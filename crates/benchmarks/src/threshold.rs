// Copyright 2025 Perf Gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Absolute threshold validation.
//!
//! A [`ThresholdTable`] holds one [`ThresholdRule`] per [`GateKind`]. Rules
//! for gates with a summary metric are always reported, as `skipped` when the
//! snapshot lacks the metric. Per-benchmark metrics carrying a gate are then
//! checked against the same rule.
//!
//! Skipped checks never affect the verdict, so a snapshot with no gated
//! metrics passes vacuously. Callers should use
//! [`ValidationResult::is_vacuous`] to present that case differently from a
//! real pass.
//!
//! # Configuration
//!
//! The default table encodes the 1 kHz loop budget. A TOML file can override
//! individual gates:
//!
//! ```toml
//! [gates.jitter_p99]
//! limit = 0.2
//!
//! [gates.rt_heap_allocs]
//! limit = 0
//! description = "Heap allocations on the RT path"
//! ```

use crate::error::ThresholdConfigError;
use crate::metric::{GateKind, Metric, MetricScope, MetricSet, Polarity, Unit};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Result type for threshold configuration.
pub type Result<T> = std::result::Result<T, ThresholdConfigError>;

/// Limit for one gate.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdRule {
    /// Limit value, in `unit`.
    pub limit: f64,
    /// Unit the limit is expressed in.
    pub unit: Unit,
    /// Lower-is-better rules pass at or below the limit; higher-is-better at
    /// or above.
    pub polarity: Polarity,
    /// Human-readable description.
    pub description: String,
}

impl ThresholdRule {
    /// Create a lower-is-better rule.
    pub fn at_most(limit: f64, unit: Unit, description: impl Into<String>) -> Self {
        Self {
            limit,
            unit,
            polarity: Polarity::LowerIsBetter,
            description: description.into(),
        }
    }

    /// Create a higher-is-better rule.
    pub fn at_least(limit: f64, unit: Unit, description: impl Into<String>) -> Self {
        Self {
            limit,
            unit,
            polarity: Polarity::HigherIsBetter,
            description: description.into(),
        }
    }

    /// Whether `value` (in the rule's unit) satisfies the limit.
    pub fn admits(&self, value: f64) -> bool {
        match self.polarity {
            Polarity::LowerIsBetter => value <= self.limit,
            Polarity::HigherIsBetter => value >= self.limit,
        }
    }
}

/// Immutable set of limits, one per gate.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    rules: BTreeMap<GateKind, ThresholdRule>,
}

impl Default for ThresholdTable {
    /// Budget for a 1 kHz loop: 1000us total, 0.25ms P99 jitter, 0.001%
    /// missed ticks, 50us/200us median/P99 processing, 2ms P99 end-to-end
    /// latency and no heap allocations on the RT path.
    fn default() -> Self {
        Self::new([
            (
                GateKind::RtLoop,
                ThresholdRule::at_most(1000.0, Unit::Microseconds, "Total RT loop time @ 1kHz"),
            ),
            (
                GateKind::JitterP99,
                ThresholdRule::at_most(0.25, Unit::Milliseconds, "P99 jitter at 1kHz"),
            ),
            (
                GateKind::MissedTickRate,
                ThresholdRule::at_most(
                    0.00001,
                    Unit::Ratio,
                    "Missed tick rate ratio (0.001% = 0.00001)",
                ),
            ),
            (
                GateKind::ProcessingMedian,
                ThresholdRule::at_most(50.0, Unit::Microseconds, "Median processing time per tick"),
            ),
            (
                GateKind::ProcessingP99,
                ThresholdRule::at_most(200.0, Unit::Microseconds, "P99 processing time per tick"),
            ),
            (
                GateKind::E2eLatencyP99,
                ThresholdRule::at_most(2000.0, Unit::Microseconds, "E2E latency P99"),
            ),
            (
                GateKind::RtHeapAllocs,
                ThresholdRule::at_most(0.0, Unit::Count, "RT heap allocations (must be 0)"),
            ),
        ])
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThresholdFile {
    #[serde(default)]
    gates: BTreeMap<String, RuleOverride>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleOverride {
    limit: Option<f64>,
    description: Option<String>,
}

impl ThresholdTable {
    /// Build a table from explicit rules. Gates without a rule are not checked.
    pub fn new(rules: impl IntoIterator<Item = (GateKind, ThresholdRule)>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    /// Rule for a gate.
    pub fn rule(&self, gate: GateKind) -> Option<&ThresholdRule> {
        self.rules.get(&gate)
    }

    /// All rules in gate order.
    pub fn rules(&self) -> impl Iterator<Item = (GateKind, &ThresholdRule)> {
        self.rules.iter().map(|(gate, rule)| (*gate, rule))
    }

    /// Apply TOML overrides on top of the default table.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ThresholdFile = toml::from_str(content)?;
        let mut table = Self::default();

        for (key, change) in file.gates {
            let gate = GateKind::from_key(&key)
                .ok_or_else(|| ThresholdConfigError::UnknownGate(key.clone()))?;
            let Some(rule) = table.rules.get_mut(&gate) else {
                continue;
            };

            if let Some(limit) = change.limit {
                if !limit.is_finite() {
                    return Err(ThresholdConfigError::InvalidLimit { gate: key, limit });
                }
                debug!(gate = %gate, old = rule.limit, new = limit, "Overriding threshold");
                rule.limit = limit;
            }
            if let Some(description) = change.description {
                rule.description = description;
            }
        }

        Ok(table)
    }

    /// Load TOML overrides from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ThresholdConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Outcome of a single threshold check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThresholdStatus {
    /// Within the limit.
    Passed,
    /// Outside the limit.
    Failed,
    /// Metric not available.
    Skipped,
}

impl ThresholdStatus {
    /// Bracketed console tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Passed => "[PASS]",
            Self::Failed => "[FAIL]",
            Self::Skipped => "[SKIP]",
        }
    }
}

/// One metric checked against one limit.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdResult {
    /// Result name, e.g. `P99 Jitter` or `rt_timing_1khz - Missed Ticks`.
    pub name: String,
    /// Measured value in `unit`, absent when skipped.
    pub value: Option<f64>,
    /// Limit in `unit`.
    pub threshold: f64,
    /// Unit of value and threshold.
    pub unit: Unit,
    /// Direction the limit bounds.
    pub polarity: Polarity,
    /// Check outcome.
    pub status: ThresholdStatus,
    /// Human-readable description.
    pub description: String,
    /// Where the value came from in the snapshot.
    pub source: String,
    /// Gate the check belongs to.
    pub gate: GateKind,
}

/// All threshold checks for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Every check, summary gates first.
    pub results: Vec<ThresholdResult>,
    /// True iff every non-skipped check passed.
    pub passed: bool,
}

impl ValidationResult {
    /// Checks with the given status, in report order.
    pub fn with_status(&self, status: ThresholdStatus) -> Vec<&ThresholdResult> {
        self.results.iter().filter(|r| r.status == status).collect()
    }

    /// Failed checks.
    pub fn failed(&self) -> Vec<&ThresholdResult> {
        self.with_status(ThresholdStatus::Failed)
    }

    /// Number of checks that were actually evaluated.
    pub fn checked_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status != ThresholdStatus::Skipped)
            .count()
    }

    /// Whether the verdict rests on no evaluated checks at all.
    pub fn is_vacuous(&self) -> bool {
        self.checked_count() == 0
    }
}

/// Check every gate in `table` against `metrics`.
pub fn validate(metrics: &MetricSet, table: &ThresholdTable) -> ValidationResult {
    let mut results = Vec::new();

    for (gate, rule) in table.rules() {
        let Some(name) = gate.summary_metric() else {
            continue;
        };
        let metric = metrics
            .get(name)
            .filter(|m| *m.scope() == MetricScope::Summary);
        let source = metric.map_or_else(|| format!("summary.{name}"), |m| m.source().to_string());
        results.push(check(
            gate.summary_label().to_string(),
            gate,
            metric,
            rule,
            rule.description.clone(),
            source,
        ));
    }

    for metric in metrics.values() {
        let (MetricScope::Benchmark(bench), Some(gate)) = (metric.scope(), metric.gate()) else {
            continue;
        };
        let Some(rule) = table.rule(gate) else {
            continue;
        };
        results.push(check(
            format!("{bench} - {}", gate.benchmark_suffix()),
            gate,
            Some(metric),
            rule,
            format!("{} for {bench}", rule.description),
            metric.source().to_string(),
        ));
    }

    let passed = results
        .iter()
        .filter(|r| r.status != ThresholdStatus::Skipped)
        .all(|r| r.status == ThresholdStatus::Passed);

    ValidationResult { results, passed }
}

fn check(
    name: String,
    gate: GateKind,
    metric: Option<&Metric>,
    rule: &ThresholdRule,
    description: String,
    source: String,
) -> ThresholdResult {
    let value = metric.and_then(|m| {
        let converted = m.unit().convert(m.value(), rule.unit);
        if converted.is_none() {
            debug!(metric = m.name(), from = %m.unit(), to = %rule.unit, "Incompatible units");
        }
        converted
    });

    let (status, description) = match value {
        None => (ThresholdStatus::Skipped, format!("{description} (not available)")),
        Some(v) if rule.admits(v) => (ThresholdStatus::Passed, description),
        Some(_) => (ThresholdStatus::Failed, description),
    };

    ThresholdResult {
        name,
        value,
        threshold: rule.limit,
        unit: rule.unit,
        polarity: rule.polarity,
        status,
        description,
        source,
        gate,
    }
}
