//! Structural errors raised while loading or validating a snapshot.

/// All errors the snapshot loader can return.
///
/// These are data-integrity failures on the caller side of the engine
/// contract: the scoring engine itself never sees a snapshot that failed
/// these checks.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Snapshot JSON failed to parse or deserialize.
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two steps share an id within the protocol.
    #[error("duplicate step id: {step_id}")]
    DuplicateStepId { step_id: String },

    /// Two steps share a step_order within the protocol.
    #[error("duplicate step_order {step_order} on steps {first} and {second}")]
    DuplicateStepOrder {
        step_order: u32,
        first: String,
        second: String,
    },

    /// Protocol declares a zero-day expected duration.
    #[error("protocol {protocol_id} has expected_duration_days = 0")]
    ZeroDuration { protocol_id: String },

    /// Execution references a different protocol than the snapshot carries.
    #[error("execution {execution_id} references protocol {referenced}, snapshot carries {carried}")]
    ProtocolMismatch {
        execution_id: String,
        referenced: String,
        carried: String,
    },

    /// A completion record belongs to a different execution.
    #[error("completion {completion_id} belongs to execution {referenced}, snapshot execution is {carried}")]
    ExecutionMismatch {
        completion_id: String,
        referenced: String,
        carried: String,
    },

    /// A completion record is both completed and skipped.
    #[error("completion {completion_id} is both completed and skipped")]
    CompletedAndSkipped { completion_id: String },
}
