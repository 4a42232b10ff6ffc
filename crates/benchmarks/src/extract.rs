// Copyright 2025 Perf Gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Metric extraction from benchmark snapshots.
//!
//! Two shapes feed the same [`MetricSet`]:
//!
//! - the aggregate `summary` section, where a fixed set of well-known keys is
//!   recognised and everything else is ignored;
//! - each benchmark entry, whose `percentiles` (nanoseconds) and
//!   `custom_metrics` sub-fields yield up to five `<bench>/<field>` metrics.
//!
//! Missing or non-numeric fields simply produce no metric.

use crate::metric::{GateKind, Metric, MetricScope, MetricSet, Polarity, Unit};
use crate::result::{BenchmarkDocument, BenchmarkEntry};
use serde_json::{Map, Value};
use tracing::debug;

const NANOS_PER_MICRO: f64 = 1000.0;
const MICROS_PER_MILLI: f64 = 1000.0;

/// Role a benchmark plays, inferred from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchmarkRole {
    /// Tick precision / jitter measurement.
    Jitter,
    /// Pipeline processing-time measurement.
    Processing,
    /// Anything else.
    General,
}

/// Name-derived classification of a benchmark entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkClass {
    /// Whether the entry measures the real-time loop and is subject to
    /// absolute thresholds.
    pub realtime: bool,
    /// What the entry's percentiles measure.
    pub role: BenchmarkRole,
}

/// Classify a benchmark by case-insensitive substring match on its name.
///
/// Jitter and processing entries carry percentile fields of the same shape,
/// so the name is the only thing that tells them apart.
pub fn classify_benchmark(name: &str) -> BenchmarkClass {
    let name = name.to_lowercase();

    let realtime = name.contains("rt_timing") || name.contains("1khz");
    let jitter = name.contains("tick_precision") || name.contains("jitter");
    let processing =
        name.contains("pipeline_processing") || (name.contains("processing") && !jitter);

    let role = if jitter {
        BenchmarkRole::Jitter
    } else if processing {
        BenchmarkRole::Processing
    } else {
        BenchmarkRole::General
    };

    BenchmarkClass { realtime, role }
}

struct SummaryKey {
    key: &'static str,
    label: &'static str,
    unit: Unit,
    gate: GateKind,
}

const SUMMARY_KEYS: [SummaryKey; 5] = [
    SummaryKey {
        key: "rt_loop_us",
        label: "RT Loop Time",
        unit: Unit::Microseconds,
        gate: GateKind::RtLoop,
    },
    SummaryKey {
        key: "jitter_p99_ms",
        label: "P99 Jitter",
        unit: Unit::Milliseconds,
        gate: GateKind::JitterP99,
    },
    SummaryKey {
        key: "missed_tick_rate",
        label: "Missed Tick Rate",
        unit: Unit::Ratio,
        gate: GateKind::MissedTickRate,
    },
    SummaryKey {
        key: "processing_time_median_us",
        label: "Processing Time (Median)",
        unit: Unit::Microseconds,
        gate: GateKind::ProcessingMedian,
    },
    SummaryKey {
        key: "processing_time_p99_us",
        label: "Processing Time (P99)",
        unit: Unit::Microseconds,
        gate: GateKind::ProcessingP99,
    },
];

/// Summary key accepted for jitter when `jitter_p99_ms` is absent.
const JITTER_US_KEY: &str = "jitter_p99_us";

/// Extract every recognised metric from a document.
pub fn extract(document: &BenchmarkDocument) -> MetricSet {
    let mut metrics = MetricSet::new();

    if let Some(summary) = &document.summary {
        extract_summary(summary, &mut metrics);
    }

    for entry in document.entries() {
        extract_entry(entry, &mut metrics);
    }

    debug!(count = metrics.len(), "Extracted metrics");
    metrics
}

fn extract_summary(summary: &Map<String, Value>, metrics: &mut MetricSet) {
    for known in &SUMMARY_KEYS {
        let source = format!("summary.{}", known.key);
        if let Some(value) = numeric(summary.get(known.key), &source) {
            let metric = Metric::new(
                known.key,
                value,
                known.unit,
                Polarity::LowerIsBetter,
                source,
                MetricScope::Summary,
            );
            insert(metrics, metric.with_label(known.label).with_gate(Some(known.gate)));
        }
    }

    // Normalise a microsecond jitter summary into the millisecond metric.
    if !metrics.contains_key("jitter_p99_ms") {
        let source = format!("summary.{JITTER_US_KEY}");
        if let Some(micros) = numeric(summary.get(JITTER_US_KEY), &source) {
            let metric = Metric::new(
                "jitter_p99_ms",
                micros / MICROS_PER_MILLI,
                Unit::Milliseconds,
                Polarity::LowerIsBetter,
                source,
                MetricScope::Summary,
            );
            insert(metrics, metric.with_label("P99 Jitter").with_gate(Some(GateKind::JitterP99)));
        }
    }
}

fn extract_entry(entry: &BenchmarkEntry, metrics: &mut MetricSet) {
    let name = entry.name.as_str();
    let class = classify_benchmark(name);
    let gated = |gate: GateKind| class.realtime.then_some(gate);
    let scope = || MetricScope::Benchmark(name.to_string());

    let p50_gate = match class.role {
        BenchmarkRole::Processing => gated(GateKind::ProcessingMedian),
        _ => None,
    };
    let p99_gate = match class.role {
        BenchmarkRole::Jitter => gated(GateKind::JitterP99),
        BenchmarkRole::Processing => gated(GateKind::ProcessingP99),
        BenchmarkRole::General => None,
    };

    for (key, gate) in [("p50", p50_gate), ("p99", p99_gate)] {
        let source = format!("benchmarks[{name}].percentiles.{key}");
        if let Some(nanos) = numeric(entry.percentile(key), &source) {
            insert(
                metrics,
                Metric::new(
                    format!("{name}/{key}"),
                    nanos / NANOS_PER_MICRO,
                    Unit::Microseconds,
                    Polarity::LowerIsBetter,
                    source,
                    scope(),
                )
                .with_gate(gate),
            );
        }
    }

    let custom = [
        ("missed_tick_rate", "missed_tick_rate", Unit::Ratio, GateKind::MissedTickRate),
        ("e2e_latency_p99_us", "e2e_latency_p99", Unit::Microseconds, GateKind::E2eLatencyP99),
        ("rt_heap_allocs", "rt_heap_allocs", Unit::Count, GateKind::RtHeapAllocs),
    ];
    for (key, suffix, unit, gate) in custom {
        let source = format!("benchmarks[{name}].custom_metrics.{key}");
        if let Some(value) = numeric(entry.custom_metric(key), &source) {
            let metric = Metric::new(
                format!("{name}/{suffix}"),
                value,
                unit,
                Polarity::LowerIsBetter,
                source,
                scope(),
            );
            insert(metrics, metric.with_gate(gated(gate)));
        }
    }
}

fn numeric(value: Option<&Value>, source: &str) -> Option<f64> {
    let value = value?;
    let number = value.as_f64();
    if number.is_none() {
        debug!(source, %value, "Omitting non-numeric metric value");
    }
    number
}

fn insert(metrics: &mut MetricSet, metric: Metric) {
    metrics.insert(metric.name().to_string(), metric);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::parse_document;
    use serde_json::json;

    fn extract_json(value: Value) -> MetricSet {
        extract(&BenchmarkDocument::from_value(value, "test").unwrap())
    }

    #[test]
    fn test_classify_benchmark_roles() {
        let jitter = classify_benchmark("rt_timing/Tick_Precision_1kHz");
        assert!(jitter.realtime);
        assert_eq!(jitter.role, BenchmarkRole::Jitter);

        let processing = classify_benchmark("rt_timing/pipeline_processing");
        assert!(processing.realtime);
        assert_eq!(processing.role, BenchmarkRole::Processing);

        let jitter_processing = classify_benchmark("jitter_under_processing_load");
        assert!(!jitter_processing.realtime);
        assert_eq!(jitter_processing.role, BenchmarkRole::Jitter);

        let general = classify_benchmark("crypto_sign");
        assert!(!general.realtime);
        assert_eq!(general.role, BenchmarkRole::General);
    }

    #[test]
    fn test_summary_keys_extracted() {
        let metrics = extract_json(json!({"summary": {
            "rt_loop_us": 900.0,
            "jitter_p99_ms": 0.2,
            "missed_tick_rate": 0.000001,
            "processing_time_median_us": 40,
            "processing_time_p99_us": 150,
            "cpu_model": "unknown-key"
        }}));

        assert_eq!(metrics.len(), 5);
        let rt = &metrics["rt_loop_us"];
        assert_eq!(rt.value(), 900.0);
        assert_eq!(rt.unit(), Unit::Microseconds);
        assert_eq!(rt.label(), "RT Loop Time");
        assert_eq!(rt.gate(), Some(GateKind::RtLoop));
        assert_eq!(rt.source(), "summary.rt_loop_us");
        assert!(metrics.values().all(|m| m.polarity().lower_is_better()));
    }

    #[test]
    fn test_jitter_us_normalised_to_ms() {
        let metrics = extract_json(json!({"summary": {"jitter_p99_us": 250.0}}));
        let jitter = &metrics["jitter_p99_ms"];
        assert_eq!(jitter.value(), 0.25);
        assert_eq!(jitter.unit(), Unit::Milliseconds);
        assert_eq!(jitter.source(), "summary.jitter_p99_us");
    }

    #[test]
    fn test_jitter_ms_wins_over_us() {
        let metrics = extract_json(json!({"summary": {"jitter_p99_ms": 0.1, "jitter_p99_us": 900.0}}));
        assert_eq!(metrics["jitter_p99_ms"].value(), 0.1);
    }

    #[test]
    fn test_entry_percentiles_converted_to_micros() {
        let metrics = extract_json(json!({"benchmarks": [{
            "name": "rt_timing/pipeline_processing",
            "percentiles": {"p50": 40000, "p99": 150000, "p95": 1}
        }]}));

        assert_eq!(metrics.len(), 2);
        let p50 = &metrics["rt_timing/pipeline_processing/p50"];
        assert_eq!(p50.value(), 40.0);
        assert_eq!(p50.unit(), Unit::Microseconds);
        assert_eq!(p50.gate(), Some(GateKind::ProcessingMedian));
        assert_eq!(
            metrics["rt_timing/pipeline_processing/p99"].gate(),
            Some(GateKind::ProcessingP99)
        );
    }

    #[test]
    fn test_jitter_entry_routes_only_p99() {
        let metrics = extract_json(json!({"benchmarks": [{
            "name": "rt_timing/tick_precision_1khz",
            "percentiles": {"p50": 1000, "p99": 200000}
        }]}));

        assert_eq!(metrics["rt_timing/tick_precision_1khz/p50"].gate(), None);
        assert_eq!(
            metrics["rt_timing/tick_precision_1khz/p99"].gate(),
            Some(GateKind::JitterP99)
        );
    }

    #[test]
    fn test_custom_metrics_extracted() {
        let metrics = extract_json(json!({"benchmarks": [{
            "name": "rt_timing_1khz",
            "custom_metrics": {
                "missed_tick_rate": 0.000005,
                "e2e_latency_p99_us": 1500.0,
                "rt_heap_allocs": 0,
                "cache_misses": 12
            }
        }]}));

        assert_eq!(metrics.len(), 3);
        assert_eq!(metrics["rt_timing_1khz/missed_tick_rate"].unit(), Unit::Ratio);
        assert_eq!(metrics["rt_timing_1khz/e2e_latency_p99"].value(), 1500.0);
        assert_eq!(metrics["rt_timing_1khz/rt_heap_allocs"].unit(), Unit::Count);
        assert_eq!(
            metrics["rt_timing_1khz/rt_heap_allocs"].gate(),
            Some(GateKind::RtHeapAllocs)
        );
    }

    #[test]
    fn test_non_realtime_entries_are_not_gated() {
        let metrics = extract_json(json!({"benchmarks": [{
            "name": "crypto_processing",
            "percentiles": {"p50": 1000, "p99": 2000},
            "custom_metrics": {"rt_heap_allocs": 3}
        }]}));

        assert_eq!(metrics.len(), 3);
        assert!(metrics.values().all(|m| m.gate().is_none()));
    }

    #[test]
    fn test_non_numeric_values_omitted() {
        let metrics = extract_json(json!({
            "summary": {"rt_loop_us": "fast", "missed_tick_rate": null},
            "benchmarks": [{"name": "b", "percentiles": {"p50": "1ms", "p99": 3000}}]
        }));

        assert_eq!(metrics.len(), 1);
        assert!(metrics.contains_key("b/p99"));
    }

    #[test]
    fn test_duplicate_entries_overwrite() {
        let metrics = extract_json(json!({"benchmarks": [
            {"name": "dup", "percentiles": {"p99": 1000}},
            {"name": "dup", "percentiles": {"p99": 5000}}
        ]}));

        assert_eq!(metrics.len(), 1);
        assert_eq!(metrics["dup/p99"].value(), 5.0);
    }

    #[test]
    fn test_empty_document_yields_no_metrics() {
        let doc = parse_document(r#"{"benchmarks": []}"#).unwrap();
        assert!(extract(&doc).is_empty());
    }
}
