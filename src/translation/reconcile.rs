/*!
 * Result reconciliation.
 *
 * Settled outcomes come back in input order; reconciliation folds them
 * into the segment records they were derived from, substitutes an
 * explicit placeholder for anything untranslated, and produces a
 * machine-readable failure report that the standalone retry run consumes.
 */

use serde::{Deserialize, Serialize};
use std::path::Path;

use anyhow::{Context, Result};

use crate::errors::ReconcileError;
use crate::segment_processor::SegmentRecord;

use super::retry::{BatchResult, FinalState};

/// Placeholder written in place of a failed segment's content
pub fn placeholder(id: &str) -> String {
    format!("[untranslated: {}]", id)
}

/// One failed unit in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEntry {
    /// Unit identifier, matches the record id
    pub id: String,

    /// Last error message observed
    pub reason: String,

    /// Attempts made before giving up
    pub attempts: u32,

    /// Whether a retry run may still recover it
    pub retryable: bool,
}

/// Machine-readable report of everything a run failed to translate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    pub failures: Vec<FailureEntry>,
}

impl FailureReport {
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Load a report saved by an earlier run
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read failure report: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Malformed failure report: {}", path.display()))
    }

    /// Save the report next to the translated output
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self).context("Failed to serialize failure report")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write failure report: {}", path.display()))
    }
}

/// Fold settled content outcomes into the records they came from.
///
/// Outcomes must cover the records one-to-one, in order; anything else
/// is a reconciliation bug surfaced as an error rather than silently
/// misaligned output. Failed units keep their slot with a placeholder
/// body, so output length and order always match the input.
pub fn merge(
    records: &[SegmentRecord],
    result: &BatchResult,
) -> Result<(Vec<SegmentRecord>, FailureReport), ReconcileError> {
    if result.outcomes.len() != records.len() {
        return Err(ReconcileError::LengthMismatch {
            expected: records.len(),
            actual: result.outcomes.len(),
        });
    }

    let mut merged = records.to_vec();
    let mut report = FailureReport::default();

    for outcome in &result.outcomes {
        let record = merged
            .get_mut(outcome.ordinal)
            .ok_or(ReconcileError::UnknownOrdinal(outcome.ordinal))?;

        match &outcome.state {
            FinalState::Translated(text) => {
                record.content = text.clone();
            }
            FinalState::Failed { reason, retryable } => {
                record.content = placeholder(&outcome.id);
                report.failures.push(FailureEntry {
                    id: outcome.id.clone(),
                    reason: reason.clone(),
                    attempts: outcome.attempts,
                    retryable: *retryable,
                });
            }
        }
    }

    Ok((merged, report))
}

/// Patch an existing translated document with recovered outcomes.
///
/// Used by the standalone retry run: only units that now translated are
/// touched, everything else keeps its current content. Returns the
/// failures that still remain.
pub fn patch(
    records: &mut [SegmentRecord],
    result: &BatchResult,
) -> Result<FailureReport, ReconcileError> {
    let mut report = FailureReport::default();

    for outcome in &result.outcomes {
        let record = records
            .get_mut(outcome.ordinal)
            .ok_or(ReconcileError::UnknownOrdinal(outcome.ordinal))?;

        match &outcome.state {
            FinalState::Translated(text) => {
                record.content = text.clone();
            }
            FinalState::Failed { reason, retryable } => {
                report.failures.push(FailureEntry {
                    id: outcome.id.clone(),
                    reason: reason.clone(),
                    attempts: outcome.attempts,
                    retryable: *retryable,
                });
            }
        }
    }

    Ok(report)
}
