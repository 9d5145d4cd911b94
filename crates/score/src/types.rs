//! Result value types and the engine's error contract.
//!
//! The engine either returns a complete `ComplianceScoreResult` or raises
//! a `ScoreError`; there is no partial or degraded result. Everything the
//! caller needs to audit the arithmetic -- per-step completion breakdown,
//! per-step timing entries, the deviation list -- rides along in the
//! result rather than being recomputable on demand.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use time::OffsetDateTime;

use cuvee_core::{SkipReason, StepType};

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors the engine can raise. All are synchronous data-contract
/// violations on the caller's side; none are retryable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// Protocol has no steps -- compliance is undefined, nothing to measure.
    EmptyProtocol { protocol_id: String },
    /// The execution window is negative: `start_date` after the
    /// observation cutoff. Elapsed-day arithmetic is impossible.
    InvalidExecutionWindow {
        execution_id: String,
        start_date: String,
        cutoff: String,
    },
    /// A completion references a step that is not in the supplied list.
    /// Silently dropping it would mis-state the score.
    OrphanCompletion {
        completion_id: String,
        step_id: String,
    },
    /// A skip record is malformed: no reason, or a reason the
    /// classification table does not cover (enum drift).
    InvalidSkipRecord {
        completion_id: String,
        message: String,
    },
    /// The scoring configuration is inconsistent (overlapping or
    /// non-exhaustive skip classification, weights not summing to 1).
    InvalidConfig { message: String },
}

impl fmt::Display for ScoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreError::EmptyProtocol { protocol_id } => {
                write!(f, "protocol '{}' has no steps to score", protocol_id)
            }
            ScoreError::InvalidExecutionWindow {
                execution_id,
                start_date,
                cutoff,
            } => {
                write!(
                    f,
                    "execution '{}' has an invalid window: start {} is after {}",
                    execution_id, start_date, cutoff
                )
            }
            ScoreError::OrphanCompletion {
                completion_id,
                step_id,
            } => {
                write!(
                    f,
                    "completion '{}' references unknown step '{}'",
                    completion_id, step_id
                )
            }
            ScoreError::InvalidSkipRecord {
                completion_id,
                message,
            } => {
                write!(f, "invalid skip record '{}': {}", completion_id, message)
            }
            ScoreError::InvalidConfig { message } => {
                write!(f, "invalid scoring config: {}", message)
            }
        }
    }
}

impl std::error::Error for ScoreError {}

// ──────────────────────────────────────────────
// Completion sub-score
// ──────────────────────────────────────────────

/// Where a step currently stands against its protocol obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionStanding {
    /// Completed (all expected occurrences, for repeatable steps).
    Completed,
    /// Repeatable step with some but not all expected occurrences done.
    Partial,
    SkippedJustified,
    SkippedUnjustified,
    /// Due, no completion and no skip record.
    Missed,
    /// Expected day has not arrived; excluded from scoring.
    NotYetDue,
}

impl CompletionStanding {
    /// Wire-format name, used by CLI text output.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStanding::Completed => "COMPLETED",
            CompletionStanding::Partial => "PARTIAL",
            CompletionStanding::SkippedJustified => "SKIPPED_JUSTIFIED",
            CompletionStanding::SkippedUnjustified => "SKIPPED_UNJUSTIFIED",
            CompletionStanding::Missed => "MISSED",
            CompletionStanding::NotYetDue => "NOT_YET_DUE",
        }
    }
}

/// One row of the completion-score audit trail. Every protocol step gets
/// exactly one row, not-yet-due steps included (with zero weight), so the
/// breakdown always mirrors the protocol definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepCompletionBreakdown {
    pub step_id: String,
    pub step_order: u32,
    pub weight: Decimal,
    pub earned: Decimal,
    pub status: CompletionStanding,
}

/// The 0-100 weighted completion sub-score plus the raw fraction it was
/// computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedCompletionScore {
    pub score: Decimal,
    /// Raw numerator: criticality-weighted credit earned.
    pub earned: Decimal,
    /// Raw denominator: total criticality weight of due steps.
    pub total_weight: Decimal,
    pub breakdown: Vec<StepCompletionBreakdown>,
}

// ──────────────────────────────────────────────
// Timing sub-score
// ──────────────────────────────────────────────

/// Timing entry for one completed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepTimingEntry {
    pub step_id: String,
    pub step_order: u32,
    /// Hours past the deadline (due timestamp + tolerance); 0 when within
    /// tolerance.
    pub lateness_hours: Decimal,
    /// Whole days of lateness; drives the tiered penalty.
    pub days_late: u32,
    /// This step's 0-100 timing score after the per-day deduction.
    pub score: Decimal,
    pub weight: Decimal,
}

/// The 0-100 timing sub-score: criticality-weighted average over steps
/// that were actually completed. 100 when nothing was completed -- no
/// lateness observed because there was nothing to be late on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingScore {
    pub score: Decimal,
    pub entries: Vec<StepTimingEntry>,
}

// ──────────────────────────────────────────────
// Deviations
// ──────────────────────────────────────────────

/// How a step deviated from ideal adherence.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviationKind {
    /// Past the deadline with no completion and no skip record.
    Overdue { hours_overdue: Decimal },
    /// Completed outside tolerance.
    Late {
        lateness_hours: Decimal,
        days_late: u32,
    },
    /// Skipped, with the engine's classification of the reason.
    Skipped { reason: SkipReason, justified: bool },
}

/// One step that deviated from the protocol. Ordered by `step_order` in
/// the deviation list; on-time and not-yet-due steps never appear.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepDeviation {
    pub step_id: String,
    pub step_order: u32,
    pub step_type: StepType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on_step_id: Option<String>,
    #[serde(flatten)]
    pub kind: DeviationKind,
}

// ──────────────────────────────────────────────
// Aggregate result
// ──────────────────────────────────────────────

/// The full output of one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceScoreResult {
    /// `round(completion_weight x completion + timing_weight x timing, 2)`,
    /// clamped to [0, 100].
    pub compliance_score: Decimal,
    pub weighted_completion: WeightedCompletionScore,
    pub timing: TimingScore,
    pub deviations: Vec<StepDeviation>,
}

// ──────────────────────────────────────────────
// Status helpers
// ──────────────────────────────────────────────

/// A step past its deadline with nothing on record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverdueStep {
    pub step_id: String,
    pub step_order: u32,
    pub step_type: StepType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub deadline: OffsetDateTime,
    pub hours_overdue: Decimal,
}

/// Current standing of one step, for display between scoring runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepStatusRow {
    pub step_id: String,
    pub step_order: u32,
    pub step_type: StepType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub standing: CompletionStanding,
    #[serde(with = "time::serde::rfc3339")]
    pub due_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub deadline: OffsetDateTime,
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
