// Copyright 2025 Perf Gate Contributors
// SPDX-License-Identifier: Apache-2.0

//! Gate runs.
//!
//! Each mode loads its inputs, extracts metrics and produces a result plus
//! the documents needed to render reports. Rendering and exit handling stay
//! with the caller.

use crate::compare::{compare, ComparisonResult, Tolerance};
use crate::error::Result;
use crate::extract::extract;
use crate::io::load_document;
use crate::result::BenchmarkDocument;
use crate::threshold::{validate, ThresholdTable, ValidationResult};
use std::path::PathBuf;
use tracing::info;

/// Final verdict of a gate run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No regression or threshold failure.
    Passed,
    /// At least one regression or failed threshold.
    Failed,
}

impl GateOutcome {
    /// Process exit code. `warn_only` reports failures without failing.
    pub fn exit_code(self, warn_only: bool) -> u8 {
        match self {
            Self::Failed if !warn_only => 1,
            _ => 0,
        }
    }

    /// Whether the gate passed.
    pub fn is_passed(self) -> bool {
        self == Self::Passed
    }
}

/// Inputs for a baseline comparison.
#[derive(Debug, Clone)]
pub struct CompareRequest {
    /// Baseline snapshot path.
    pub baseline: PathBuf,
    /// Current snapshot path.
    pub current: PathBuf,
    /// Relative change treated as noise.
    pub tolerance: Tolerance,
}

/// Inputs for a threshold validation.
#[derive(Debug, Clone)]
pub struct ValidateRequest {
    /// Snapshot to validate.
    pub path: PathBuf,
    /// Optional TOML overrides for the default threshold table.
    pub thresholds: Option<PathBuf>,
}

/// A finished comparison.
#[derive(Debug)]
pub struct ComparisonRun {
    /// Baseline snapshot.
    pub baseline: BenchmarkDocument,
    /// Current snapshot.
    pub current: BenchmarkDocument,
    /// Per-metric comparison.
    pub result: ComparisonResult,
}

impl ComparisonRun {
    /// Verdict of the run.
    pub fn outcome(&self) -> GateOutcome {
        if self.result.has_regressions() {
            GateOutcome::Failed
        } else {
            GateOutcome::Passed
        }
    }
}

/// A finished validation.
#[derive(Debug)]
pub struct ValidationRun {
    /// Validated snapshot.
    pub document: BenchmarkDocument,
    /// Table the snapshot was checked against.
    pub table: ThresholdTable,
    /// Per-check results.
    pub result: ValidationResult,
}

impl ValidationRun {
    /// Verdict of the run.
    pub fn outcome(&self) -> GateOutcome {
        if self.result.passed {
            GateOutcome::Passed
        } else {
            GateOutcome::Failed
        }
    }
}

/// Compare a current snapshot against a baseline.
///
/// # Errors
///
/// Returns an error if either snapshot cannot be loaded.
pub fn run_comparison(request: &CompareRequest) -> Result<ComparisonRun> {
    let baseline = load_document(&request.baseline)?;
    let current = load_document(&request.current)?;

    let result = compare(&extract(&baseline), &extract(&current), request.tolerance);
    info!(
        compared = result.metrics.len(),
        regressions = result.regressions().len(),
        improvements = result.improvements().len(),
        tolerance = %result.tolerance,
        "Comparison complete"
    );

    Ok(ComparisonRun {
        baseline,
        current,
        result,
    })
}

/// Validate a snapshot against absolute thresholds.
///
/// # Errors
///
/// Returns an error if the snapshot or the thresholds file cannot be loaded.
pub fn run_validation(request: &ValidateRequest) -> Result<ValidationRun> {
    let table = match &request.thresholds {
        Some(path) => ThresholdTable::load(path)?,
        None => ThresholdTable::default(),
    };
    let document = load_document(&request.path)?;

    let result = validate(&extract(&document), &table);
    info!(
        checked = result.checked_count(),
        failed = result.failed().len(),
        passed = result.passed,
        "Validation complete"
    );

    Ok(ValidationRun {
        document,
        table,
        result,
    })
}
