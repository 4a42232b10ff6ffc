//! Benchmark snapshot types.
//!
//! This module provides the in-memory shape of one benchmark snapshot as
//! emitted by the real-time timing benchmarks. Only the top-level layout is
//! enforced here; individual fields are interpreted by the extractor.

use crate::error::LoadError;
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::debug;

/// Name used for benchmark entries that carry no `name` string.
pub const UNKNOWN_BENCHMARK: &str = "unknown";

/// One named benchmark's results.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkEntry {
    /// Benchmark name.
    pub name: String,
    /// Percentile timings in nanoseconds, keyed `p50`, `p99`, ...
    pub percentiles: Option<Map<String, Value>>,
    /// Arbitrary named measurements such as `missed_tick_rate`.
    pub custom_metrics: Option<Map<String, Value>>,
    /// Number of samples the producer collected.
    pub sample_count: Option<u64>,
}

impl BenchmarkEntry {
    /// Build an entry from a JSON object, ignoring fields of unexpected type.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let name = object
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_BENCHMARK)
            .to_string();

        Self {
            percentiles: object.get("percentiles").and_then(Value::as_object).cloned(),
            custom_metrics: object
                .get("custom_metrics")
                .and_then(Value::as_object)
                .cloned(),
            sample_count: object.get("sample_count").and_then(Value::as_u64),
            name,
        }
    }

    /// Look up a percentile value by key.
    pub fn percentile(&self, key: &str) -> Option<&Value> {
        self.percentiles.as_ref().and_then(|p| p.get(key))
    }

    /// Look up a custom metric value by key.
    pub fn custom_metric(&self, key: &str) -> Option<&Value> {
        self.custom_metrics.as_ref().and_then(|c| c.get(key))
    }
}

/// A parsed benchmark snapshot.
///
/// Either section may be absent. A document with neither yields no metrics,
/// which is not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkDocument {
    /// Aggregate scalar metrics.
    pub summary: Option<Map<String, Value>>,
    /// Per-benchmark entries in document order.
    pub benchmarks: Option<Vec<BenchmarkEntry>>,
}

impl BenchmarkDocument {
    /// Build a document from an already-parsed JSON value.
    ///
    /// `origin` names the input (a path or `<stream>`) for error messages.
    pub fn from_value(value: Value, origin: &str) -> Result<Self, LoadError> {
        let Value::Object(mut root) = value else {
            return Err(shape_error(origin, "top level is not a JSON object"));
        };

        let summary = match root.remove("summary") {
            None | Some(Value::Null) => None,
            Some(Value::Object(summary)) => Some(summary),
            Some(_) => return Err(shape_error(origin, "`summary` is not an object")),
        };

        let benchmarks = match root.remove("benchmarks") {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(
                items
                    .iter()
                    .enumerate()
                    .filter_map(|(index, item)| match item.as_object() {
                        Some(object) => Some(BenchmarkEntry::from_object(object)),
                        None => {
                            debug!(index, "Skipping benchmark entry that is not an object");
                            None
                        }
                    })
                    .collect(),
            ),
            Some(_) => return Err(shape_error(origin, "`benchmarks` is not an array")),
        };

        Ok(Self {
            summary,
            benchmarks,
        })
    }

    /// Benchmark entries, empty when the section is absent.
    pub fn entries(&self) -> &[BenchmarkEntry] {
        self.benchmarks.as_deref().unwrap_or_default()
    }

    /// Number of benchmark entries.
    pub fn benchmark_count(&self) -> usize {
        self.entries().len()
    }

    /// Whether a non-empty summary section is present.
    pub fn has_summary(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| !s.is_empty())
    }
}

impl FromStr for BenchmarkDocument {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::io::parse_document(s)
    }
}

fn shape_error(origin: &str, reason: &str) -> LoadError {
    LoadError::Shape {
        origin: origin.to_string(),
        reason: reason.to_string(),
    }
}
