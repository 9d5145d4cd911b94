//! Cuvee domain model -- fermentation protocols, protocol executions, and
//! the snapshot hand-off format consumed by the compliance scoring engine.
//!
//! Everything in this crate is a plain immutable value type. The service
//! layer that owns persistence materializes a full `ExecutionSnapshot`
//! (protocol, steps, execution, completion history, observation time) and
//! hands it to `cuvee-score`; nothing here lazy-loads, fetches, or mutates.

pub mod error;
pub mod model;
pub mod snapshot;

pub use error::SnapshotError;
pub use model::{
    Execution, ExecutionStatus, Protocol, SkipReason, Step, StepCompletion, StepType,
};
pub use snapshot::ExecutionSnapshot;
