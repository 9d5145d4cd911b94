//! The snapshot hand-off format: everything the scoring engine needs,
//! materialized once by the caller.
//!
//! `observed_at` is "now" as seen by the caller. Carrying it inside the
//! snapshot keeps the engine a pure function of its argument: two calls
//! with the same snapshot produce bit-identical results regardless of
//! when they run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::error::SnapshotError;
use crate::model::{Execution, Protocol, Step, StepCompletion};

/// Point-in-time view of one protocol execution, ready for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSnapshot {
    pub protocol: Protocol,
    pub steps: Vec<Step>,
    pub execution: Execution,
    pub completions: Vec<StepCompletion>,
    #[serde(with = "time::serde::rfc3339")]
    pub observed_at: OffsetDateTime,
}

impl ExecutionSnapshot {
    /// Parse a snapshot from its canonical JSON form and validate
    /// structural integrity.
    pub fn from_json_str(json: &str) -> Result<ExecutionSnapshot, SnapshotError> {
        let snapshot: ExecutionSnapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check the structural invariants the persistence layer is supposed
    /// to guarantee. The engine assumes these hold; hand-built snapshots
    /// go through here before scoring.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.protocol.expected_duration_days == 0 {
            return Err(SnapshotError::ZeroDuration {
                protocol_id: self.protocol.id.clone(),
            });
        }

        if self.execution.protocol_id != self.protocol.id {
            return Err(SnapshotError::ProtocolMismatch {
                execution_id: self.execution.id.clone(),
                referenced: self.execution.protocol_id.clone(),
                carried: self.protocol.id.clone(),
            });
        }

        let mut ids_seen: BTreeMap<&str, ()> = BTreeMap::new();
        let mut orders_seen: BTreeMap<u32, &str> = BTreeMap::new();
        for step in &self.steps {
            if ids_seen.insert(step.id.as_str(), ()).is_some() {
                return Err(SnapshotError::DuplicateStepId {
                    step_id: step.id.clone(),
                });
            }
            if let Some(first) = orders_seen.insert(step.step_order, step.id.as_str()) {
                return Err(SnapshotError::DuplicateStepOrder {
                    step_order: step.step_order,
                    first: first.to_string(),
                    second: step.id.clone(),
                });
            }
        }

        for record in &self.completions {
            if record.execution_id != self.execution.id {
                return Err(SnapshotError::ExecutionMismatch {
                    completion_id: record.id.clone(),
                    referenced: record.execution_id.clone(),
                    carried: self.execution.id.clone(),
                });
            }
            if record.was_skipped && record.completed_at.is_some() {
                return Err(SnapshotError::CompletedAndSkipped {
                    completion_id: record.id.clone(),
                });
            }
        }

        Ok(())
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
