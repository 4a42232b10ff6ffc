// Copyright 2025 Perf Gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the performance gate.
//!
//! Missing metrics are deliberately absent from this taxonomy: a metric that
//! a snapshot does not carry is reported as skipped or excluded, never raised.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a benchmark snapshot.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The snapshot file does not exist.
    #[error("Benchmark file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The snapshot could not be read.
    #[error("Failed to read {}", path.display())]
    Io {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The snapshot is not valid JSON.
    #[error("Failed to parse benchmark JSON in {origin}")]
    Json {
        /// File path or stream description
        origin: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// The snapshot is JSON but does not have the expected top-level shape.
    #[error("Malformed benchmark document in {origin}: {reason}")]
    Shape {
        /// File path or stream description
        origin: String,
        /// What was wrong
        reason: String,
    },
}

impl LoadError {
    /// Whether this error means the input could not be parsed (as opposed to
    /// not found or unreadable).
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Json { .. } | Self::Shape { .. })
    }
}

/// Errors raised while loading a threshold table.
#[derive(Debug, Error)]
pub enum ThresholdConfigError {
    /// The thresholds file could not be read.
    #[error("Failed to read thresholds file {}", path.display())]
    Io {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The thresholds file is not valid TOML for the expected schema.
    #[error("Invalid thresholds file")]
    Parse(#[from] toml::de::Error),

    /// A gate name that the validator does not know.
    #[error("Unknown gate '{0}' in thresholds file")]
    UnknownGate(String),

    /// A limit that is not a finite number.
    #[error("Invalid limit for gate '{gate}': {limit}")]
    InvalidLimit {
        /// Gate key
        gate: String,
        /// Offending limit
        limit: f64,
    },
}

/// Errors raised while writing a report artifact.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report could not be written.
    #[error("Could not write report to {}", path.display())]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Errors that abort a gate run before a verdict is reached.
#[derive(Debug, Error)]
pub enum GateError {
    /// An input snapshot could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The thresholds configuration could not be loaded.
    #[error(transparent)]
    Thresholds(#[from] ThresholdConfigError),

    /// The comparison tolerance is out of range.
    #[error("Tolerance must be between 0 and 1 (e.g., 0.10 for 10%), got {0}")]
    InvalidTolerance(f64),
}

/// Result type for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_path() {
        let err = LoadError::NotFound {
            path: PathBuf::from("missing.json"),
        };
        assert_eq!(err.to_string(), "Benchmark file not found: missing.json");
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_shape_error_is_malformed() {
        let err = LoadError::Shape {
            origin: "<stdin>".to_string(),
            reason: "top level is not an object".to_string(),
        };
        assert!(err.is_malformed());
    }

    #[test]
    fn test_cause_is_chained_not_repeated() {
        use std::error::Error as _;

        let err = LoadError::Io {
            path: PathBuf::from("b.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };
        assert_eq!(err.to_string(), "Failed to read b.json");
        assert_eq!(err.source().unwrap().to_string(), "access denied");

        let err = ReportError::Write {
            path: PathBuf::from("out.md"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such directory"),
        };
        assert!(!err.to_string().contains("no such directory"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_gate_error_wraps_load_error_transparently() {
        let err: GateError = LoadError::NotFound {
            path: PathBuf::from("a.json"),
        }
        .into();
        assert_eq!(err.to_string(), "Benchmark file not found: a.json");
    }
}
