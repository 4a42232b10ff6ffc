//! I/O operations for benchmark snapshots and reports.
//!
//! This module provides functionality to read benchmark snapshots from the
//! filesystem or any reader, and to write rendered reports back out.

use crate::error::{LoadError, ReportError};
use crate::result::BenchmarkDocument;
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory the benchmark producer writes its results into, relative to the
/// workspace root.
pub const PRODUCER_DIR: &str = "crates/engine";

/// Origin label used for snapshots read from a stream.
const STREAM_ORIGIN: &str = "<stream>";

/// Resolve a snapshot path, falling back to the producer's crate directory.
///
/// Returns the input unchanged when it exists, or when no fallback exists
/// either, so the caller reports the path the user actually gave.
pub fn resolve_benchmark_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    if path.exists() || path.is_absolute() {
        return path.to_path_buf();
    }

    let candidate = Path::new(PRODUCER_DIR).join(path);
    if candidate.exists() {
        info!(
            requested = %path.display(),
            resolved = %candidate.display(),
            "Benchmark file not found at requested path; using producer directory"
        );
        return candidate;
    }

    path.to_path_buf()
}

/// Load a benchmark snapshot from a file.
pub fn load_document(path: impl AsRef<Path>) -> Result<BenchmarkDocument, LoadError> {
    let path = resolve_benchmark_path(path);
    if !path.exists() {
        return Err(LoadError::NotFound { path });
    }

    let content = fs::read(&path).map_err(|source| LoadError::Io {
        path: path.clone(),
        source,
    })?;

    debug!(path = %path.display(), bytes = content.len(), "Loaded benchmark file");
    parse_with_origin(&content, &path.display().to_string())
}

/// Read a benchmark snapshot from a byte stream.
pub fn read_document(mut reader: impl Read) -> Result<BenchmarkDocument, LoadError> {
    let mut content = Vec::new();
    reader
        .read_to_end(&mut content)
        .map_err(|source| LoadError::Io {
            path: PathBuf::from(STREAM_ORIGIN),
            source,
        })?;
    parse_with_origin(&content, STREAM_ORIGIN)
}

/// Parse a benchmark snapshot from a string.
pub fn parse_document(content: &str) -> Result<BenchmarkDocument, LoadError> {
    parse_with_origin(content.as_bytes(), STREAM_ORIGIN)
}

// Invalid UTF-8 is reported as a JSON error.
fn parse_with_origin(content: &[u8], origin: &str) -> Result<BenchmarkDocument, LoadError> {
    let value: Value = serde_json::from_slice(content).map_err(|source| LoadError::Json {
        origin: origin.to_string(),
        source,
    })?;
    BenchmarkDocument::from_value(value, origin)
}

/// Write a rendered report to a file.
pub fn write_report(path: impl AsRef<Path>, content: &str) -> Result<(), ReportError> {
    let path = path.as_ref();
    fs::write(path, content).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_load_missing_file() {
        let err = load_document("definitely/not/here.json").unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_load_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        fs::write(&path, r#"{"summary": {"rt_loop_us": 900}}"#).unwrap();

        let doc = load_document(&path).unwrap();
        assert!(doc.has_summary());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("bench.json"));
    }

    #[test]
    fn test_invalid_utf8_file_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        fs::write(&path, [b'{', 0xff, 0xfe, b'}']).unwrap();

        let err = load_document(&path).unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(err, LoadError::Json { .. }));
    }

    #[test]
    fn test_read_document_from_stream() {
        let doc = read_document(Cursor::new(r#"{"benchmarks": []}"#)).unwrap();
        assert_eq!(doc.benchmark_count(), 0);
        assert!(doc.benchmarks.is_some());
    }

    #[test]
    fn test_truncated_stream_is_malformed() {
        let err = read_document(Cursor::new(r#"{"summary": {"rt_loop_us": 9"#)).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_write_report_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_report(&path, "# Report\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Report\n");
    }

    #[test]
    fn test_write_report_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/report.md");
        let err = write_report(&path, "x").unwrap_err();
        assert!(err.to_string().contains("report.md"));
    }
}
