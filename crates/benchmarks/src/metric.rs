// Copyright 2025 Perf Gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Normalized metric types.
//!
//! A [`Metric`] is the only currency passed between extraction, comparison,
//! validation and reporting. Metrics are built exclusively by
//! [`crate::extract`], so every value downstream carries a unit and polarity
//! that came from one place.

use std::collections::BTreeMap;
use std::fmt;

/// Extracted metrics keyed by name. Iteration order is name order.
pub type MetricSet = BTreeMap<String, Metric>;

/// Unit of a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// Microseconds
    Microseconds,
    /// Milliseconds
    Milliseconds,
    /// Dimensionless ratio in `0.0..=1.0`
    Ratio,
    /// Dimensionless count
    Count,
}

impl Unit {
    /// Suffix appended to formatted values.
    pub fn label(self) -> &'static str {
        match self {
            Self::Microseconds => "us",
            Self::Milliseconds => "ms",
            Self::Ratio | Self::Count => "",
        }
    }

    /// Convert `value` from this unit into `target`.
    ///
    /// Returns `None` for incompatible units.
    pub fn convert(self, value: f64, target: Unit) -> Option<f64> {
        match (self, target) {
            (a, b) if a == b => Some(value),
            (Self::Microseconds, Self::Milliseconds) => Some(value / 1000.0),
            (Self::Milliseconds, Self::Microseconds) => Some(value * 1000.0),
            _ => None,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which direction of change is good for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Polarity {
    /// Timings, rates and counts: smaller is better.
    #[default]
    LowerIsBetter,
    /// Throughput-style metrics: larger is better.
    HigherIsBetter,
}

impl Polarity {
    /// Whether lower values are better.
    pub fn lower_is_better(self) -> bool {
        matches!(self, Self::LowerIsBetter)
    }
}

/// Absolute-threshold category a metric feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GateKind {
    /// Total RT loop time
    RtLoop,
    /// P99 tick jitter
    JitterP99,
    /// Ratio of missed ticks
    MissedTickRate,
    /// Median per-tick processing time
    ProcessingMedian,
    /// P99 per-tick processing time
    ProcessingP99,
    /// End-to-end latency P99
    E2eLatencyP99,
    /// Heap allocations on the RT path
    RtHeapAllocs,
}

impl GateKind {
    /// All gates in report order.
    pub const ALL: [GateKind; 7] = [
        GateKind::RtLoop,
        GateKind::JitterP99,
        GateKind::MissedTickRate,
        GateKind::ProcessingMedian,
        GateKind::ProcessingP99,
        GateKind::E2eLatencyP99,
        GateKind::RtHeapAllocs,
    ];

    /// Configuration key for this gate.
    pub fn key(self) -> &'static str {
        match self {
            Self::RtLoop => "rt_loop",
            Self::JitterP99 => "jitter_p99",
            Self::MissedTickRate => "missed_tick_rate",
            Self::ProcessingMedian => "processing_median",
            Self::ProcessingP99 => "processing_p99",
            Self::E2eLatencyP99 => "e2e_latency_p99",
            Self::RtHeapAllocs => "rt_heap_allocs",
        }
    }

    /// Parse a configuration key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|gate| gate.key() == key)
    }

    /// Name of the summary metric checked by this gate, if any.
    pub fn summary_metric(self) -> Option<&'static str> {
        match self {
            Self::RtLoop => Some("rt_loop_us"),
            Self::JitterP99 => Some("jitter_p99_ms"),
            Self::MissedTickRate => Some("missed_tick_rate"),
            Self::ProcessingMedian => Some("processing_time_median_us"),
            Self::ProcessingP99 => Some("processing_time_p99_us"),
            Self::E2eLatencyP99 | Self::RtHeapAllocs => None,
        }
    }

    /// Result name for the summary-level check.
    pub fn summary_label(self) -> &'static str {
        match self {
            Self::RtLoop => "RT Loop Total",
            Self::JitterP99 => "P99 Jitter",
            Self::MissedTickRate => "Missed Tick Rate",
            Self::ProcessingMedian => "Processing Time Median",
            Self::ProcessingP99 => "Processing Time P99",
            Self::E2eLatencyP99 => "E2E Latency P99",
            Self::RtHeapAllocs => "RT Heap Allocs",
        }
    }

    /// Suffix for per-benchmark result names, `<bench> - <suffix>`.
    pub fn benchmark_suffix(self) -> &'static str {
        match self {
            Self::RtLoop => "RT Loop",
            Self::JitterP99 => "Jitter P99",
            Self::MissedTickRate => "Missed Ticks",
            Self::ProcessingMedian => "Processing Median",
            Self::ProcessingP99 => "Processing P99",
            Self::E2eLatencyP99 => "E2E Latency P99",
            Self::RtHeapAllocs => "RT Heap Allocs",
        }
    }

    /// Requirement tag the gate enforces.
    pub fn requirement(self) -> Option<&'static str> {
        match self {
            Self::RtLoop | Self::JitterP99 | Self::MissedTickRate => Some("14.3"),
            Self::ProcessingMedian | Self::ProcessingP99 => Some("14.4"),
            Self::E2eLatencyP99 | Self::RtHeapAllocs => None,
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Where in the snapshot a metric came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricScope {
    /// The aggregate `summary` section.
    Summary,
    /// A named benchmark entry.
    Benchmark(String),
}

/// One extracted, unit-normalized metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    name: String,
    label: String,
    value: f64,
    unit: Unit,
    polarity: Polarity,
    source: String,
    scope: MetricScope,
    gate: Option<GateKind>,
}

impl Metric {
    pub(crate) fn new(
        name: impl Into<String>,
        value: f64,
        unit: Unit,
        polarity: Polarity,
        source: impl Into<String>,
        scope: MetricScope,
    ) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            value,
            unit,
            polarity,
            source: source.into(),
            scope,
            gate: None,
        }
    }

    pub(crate) fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub(crate) fn with_gate(mut self, gate: Option<GateKind>) -> Self {
        self.gate = gate;
        self
    }

    /// Stable identifier, e.g. `rt_loop_us` or `rt_timing_1khz/p99`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Numeric value in [`Metric::unit`].
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Unit of the value.
    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Direction of improvement.
    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    /// Path of the value in the source document.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Section the metric came from.
    pub fn scope(&self) -> &MetricScope {
        &self.scope
    }

    /// Absolute threshold this metric feeds, if any.
    pub fn gate(&self) -> Option<GateKind> {
        self.gate
    }
}

/// Format a value with precision chosen by magnitude, followed by the unit.
///
/// Very small ratios such as missed-tick rates stay legible instead of
/// rounding to zero.
pub fn format_value(value: f64, unit: Unit) -> String {
    let magnitude = value.abs();
    let unit = unit.label();
    if magnitude < 1e-4 && value != 0.0 {
        format!("{value:.2e}{unit}")
    } else if magnitude < 1e-2 {
        format!("{value:.6}{unit}")
    } else if magnitude < 1.0 {
        format!("{value:.4}{unit}")
    } else {
        format!("{value:.2}{unit}")
    }
}
