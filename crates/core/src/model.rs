//! Entity value types read by the scoring engine.
//!
//! These are snapshots of rows owned by the excluded persistence layer,
//! not live ORM objects (ADR-036 redesign note: the engine must never
//! trigger hidden I/O mid-calculation). Wire form is the serde
//! representation: RFC 3339 timestamps, SCREAMING_SNAKE_CASE enum values,
//! decimals as strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

// ──────────────────────────────────────────────
// Protocol and steps
// ──────────────────────────────────────────────

/// A varietal-specific fermentation protocol template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protocol {
    pub id: String,
    /// Grape varietal the template was written for (display only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub varietal: Option<String>,
    /// Expected fermentation length in days. Must be positive.
    pub expected_duration_days: u32,
}

/// Category of work a protocol step represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepType {
    Initialization,
    Monitoring,
    Additions,
    CapManagement,
    PostFermentation,
    QualityCheck,
}

impl StepType {
    /// Wire-format name, used by CLI text output.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Initialization => "INITIALIZATION",
            StepType::Monitoring => "MONITORING",
            StepType::Additions => "ADDITIONS",
            StepType::CapManagement => "CAP_MANAGEMENT",
            StepType::PostFermentation => "POST_FERMENTATION",
            StepType::QualityCheck => "QUALITY_CHECK",
        }
    }
}

/// One required step of a protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    /// 1-indexed position within the protocol; unique per protocol.
    pub step_order: u32,
    pub step_type: StepType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Day offset from fermentation start at which the step falls due.
    pub expected_day: u32,
    /// Symmetric lateness allowance around the due timestamp.
    pub tolerance_hours: u32,
    /// Fine-grained importance, 0-100. Zero-criticality steps still score
    /// with a default weight of 1.
    pub criticality_score: Decimal,
    /// Coarse flag; `criticality_score` is the fine-grained version.
    pub is_critical: bool,
    /// Expected once per remaining day rather than once total.
    pub can_repeat_daily: bool,
    /// Informational dependency, consumed only for deviation annotation.
    /// The engine does not enforce dependency ordering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on_step_id: Option<String>,
}

// ──────────────────────────────────────────────
// Execution and completion history
// ──────────────────────────────────────────────

/// Lifecycle state of a protocol execution. Transitions are owned by the
/// excluded service layer; the engine only reads the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    NotStarted,
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::NotStarted => "NOT_STARTED",
            ExecutionStatus::Active => "ACTIVE",
            ExecutionStatus::Paused => "PAUSED",
            ExecutionStatus::Completed => "COMPLETED",
            ExecutionStatus::Abandoned => "ABANDONED",
        }
    }
}

/// One execution of a protocol against a fermentation (1:1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    pub protocol_id: String,
    pub fermentation_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub start_date: OffsetDateTime,
    pub status: ExecutionStatus,
    /// Set when the execution reached COMPLETED or ABANDONED; caps the
    /// elapsed-day window so a finished execution's score does not drift
    /// when re-scored later.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub ended_at: Option<OffsetDateTime>,
    /// Last score written back by the engine's caller. The engine itself
    /// is stateless and never writes this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compliance_score: Option<Decimal>,
}

/// Fixed vocabulary of reasons a step may be skipped.
///
/// The justified/unjustified partition is NOT part of this type -- it is
/// scoring policy, owned by `ScoringConfig` in the engine so that the
/// classification can be tuned and is validated for exhaustiveness there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    EquipmentFailure,
    FermentationEnded,
    FermentationFailed,
    ConditionNotMet,
    WinemakerDiscretion,
    Other,
}

impl SkipReason {
    /// Every member of the vocabulary, for exhaustiveness checks.
    pub const ALL: [SkipReason; 6] = [
        SkipReason::EquipmentFailure,
        SkipReason::FermentationEnded,
        SkipReason::FermentationFailed,
        SkipReason::ConditionNotMet,
        SkipReason::WinemakerDiscretion,
        SkipReason::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EquipmentFailure => "EQUIPMENT_FAILURE",
            SkipReason::FermentationEnded => "FERMENTATION_ENDED",
            SkipReason::FermentationFailed => "FERMENTATION_FAILED",
            SkipReason::ConditionNotMet => "CONDITION_NOT_MET",
            SkipReason::WinemakerDiscretion => "WINEMAKER_DISCRETION",
            SkipReason::Other => "OTHER",
        }
    }
}

/// Audit record of one step being completed or skipped. 0..N per step per
/// execution; the engine selects the effective record.
///
/// Upstream invariant, assumed true on input and re-checked by snapshot
/// validation: a record is never both completed and skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepCompletion {
    pub id: String,
    pub execution_id: String,
    pub step_id: String,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(default)]
    pub was_skipped: bool,
    /// Mandatory when `was_skipped` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<SkipReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_type_wire_values() {
        let json = serde_json::to_string(&StepType::CapManagement).unwrap();
        assert_eq!(json, "\"CAP_MANAGEMENT\"");
        let back: StepType = serde_json::from_str("\"POST_FERMENTATION\"").unwrap();
        assert_eq!(back, StepType::PostFermentation);
    }

    #[test]
    fn skip_reason_vocabulary_is_closed() {
        let bad: Result<SkipReason, _> = serde_json::from_str("\"RAN_OUT_OF_COFFEE\"");
        assert!(bad.is_err());
        assert_eq!(SkipReason::ALL.len(), 6);
    }

    #[test]
    fn execution_parses_rfc3339_start_date() {
        let json = r#"{
            "id": "exec-1",
            "protocol_id": "prot-1",
            "fermentation_id": "ferm-1",
            "start_date": "2025-09-10T08:00:00Z",
            "status": "ACTIVE"
        }"#;
        let exec: Execution = serde_json::from_str(json).unwrap();
        assert_eq!(exec.status, ExecutionStatus::Active);
        assert_eq!(exec.start_date.year(), 2025);
        assert!(exec.ended_at.is_none());
        assert!(exec.compliance_score.is_none());
    }

    #[test]
    fn completion_defaults_to_not_skipped() {
        let json = r#"{
            "id": "c-1",
            "execution_id": "exec-1",
            "step_id": "s-1",
            "completed_at": "2025-09-10T10:00:00Z"
        }"#;
        let rec: StepCompletion = serde_json::from_str(json).unwrap();
        assert!(!rec.was_skipped);
        assert!(rec.skip_reason.is_none());
    }
}
