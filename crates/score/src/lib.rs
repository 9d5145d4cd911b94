//! Cuvee compliance scorer -- accepts an execution snapshot, produces a
//! 0-100 compliance score with a full audit trail.
//!
//! The engine consumes a materialized `ExecutionSnapshot` (protocol,
//! steps, execution, completion history, observation time), runs the
//! window/observation pass, computes the weighted-completion and timing
//! sub-scores, detects deviations, and blends the sub-scores 70/30 per
//! ADR-036. It is a pure function: no I/O, no clocks, no mutation of
//! inputs -- identical snapshots produce bit-identical results.

pub mod completion;
pub mod config;
pub mod deviation;
mod numeric;
pub mod observe;
pub mod timing;
pub mod types;
pub mod window;

use rust_decimal::Decimal;

use cuvee_core::ExecutionSnapshot;

pub use config::{ScoringConfig, SkipClass};
pub use types::{
    ComplianceScoreResult, CompletionStanding, DeviationKind, OverdueStep, ScoreError,
    StepCompletionBreakdown, StepDeviation, StepStatusRow, StepTimingEntry, TimingScore,
    WeightedCompletionScore,
};
pub use window::ExecutionWindow;

use crate::numeric::{hours_from_seconds, round2};
use crate::observe::observe_steps;

/// Score one execution against its protocol.
///
/// This is the top-level public API. The caller materializes the
/// snapshot (already tenant-filtered and authorization-checked) and
/// persists `compliance_score` back onto the execution afterwards; the
/// engine only computes.
///
/// # Errors
/// * `EmptyProtocol` -- no steps to measure
/// * `InvalidExecutionWindow` -- start after the observation cutoff
/// * `OrphanCompletion` -- completion for a step not in the list
/// * `InvalidSkipRecord` -- skip without a reason, or one the
///   classification table does not cover
/// * `InvalidConfig` -- inconsistent scoring policy
///
/// "No completions yet" is not an error: nothing due scores a vacuous
/// 100/100 with an empty deviation list.
pub fn calculate_compliance(
    snapshot: &ExecutionSnapshot,
    config: &ScoringConfig,
) -> Result<ComplianceScoreResult, ScoreError> {
    config.validate()?;
    if snapshot.steps.is_empty() {
        return Err(ScoreError::EmptyProtocol {
            protocol_id: snapshot.protocol.id.clone(),
        });
    }

    let window = ExecutionWindow::for_execution(
        &snapshot.execution,
        &snapshot.protocol,
        snapshot.observed_at,
    )?;
    let observations = observe_steps(snapshot, &window, config)?;

    let weighted_completion = completion::weighted_completion(&observations, config);
    let timing = timing::timing_score(&observations, config);
    let deviations = deviation::detect_deviations(&observations, &window);

    // Blend the already-rounded sub-scores so the published weighting law
    // holds exactly against the values returned in this same result.
    let blended =
        config.completion_weight * weighted_completion.score + config.timing_weight * timing.score;
    let compliance_score = round2(blended).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);

    Ok(ComplianceScoreResult {
        compliance_score,
        weighted_completion,
        timing,
        deviations,
    })
}

/// Steps past their deadline with nothing on record, ordered by
/// `step_order`. Built on the same observation pass as the score, so the
/// two can never disagree.
pub fn overdue_steps(snapshot: &ExecutionSnapshot) -> Result<Vec<OverdueStep>, ScoreError> {
    let config = ScoringConfig::default();
    if snapshot.steps.is_empty() {
        return Err(ScoreError::EmptyProtocol {
            protocol_id: snapshot.protocol.id.clone(),
        });
    }
    let window = ExecutionWindow::for_execution(
        &snapshot.execution,
        &snapshot.protocol,
        snapshot.observed_at,
    )?;
    let observations = observe_steps(snapshot, &window, &config)?;

    Ok(observations
        .iter()
        .filter(|obs| obs.due && obs.effective.is_none())
        .filter_map(|obs| {
            let overdue = window.overdue_seconds(obs.step);
            if overdue > 0 {
                Some(OverdueStep {
                    step_id: obs.step.id.clone(),
                    step_order: obs.step.step_order,
                    step_type: obs.step.step_type,
                    name: obs.step.name.clone(),
                    deadline: window.deadline(obs.step),
                    hours_overdue: hours_from_seconds(overdue),
                })
            } else {
                None
            }
        })
        .collect())
}

/// Current standing of every protocol step, ordered by `step_order`.
pub fn step_statuses(
    snapshot: &ExecutionSnapshot,
    config: &ScoringConfig,
) -> Result<Vec<StepStatusRow>, ScoreError> {
    config.validate()?;
    if snapshot.steps.is_empty() {
        return Err(ScoreError::EmptyProtocol {
            protocol_id: snapshot.protocol.id.clone(),
        });
    }
    let window = ExecutionWindow::for_execution(
        &snapshot.execution,
        &snapshot.protocol,
        snapshot.observed_at,
    )?;
    let observations = observe_steps(snapshot, &window, config)?;

    Ok(observations
        .iter()
        .map(|obs| StepStatusRow {
            step_id: obs.step.id.clone(),
            step_order: obs.step.step_order,
            step_type: obs.step.step_type,
            name: obs.step.name.clone(),
            standing: obs.standing(),
            due_at: window.due_at(obs.step),
            deadline: window.deadline(obs.step),
        })
        .collect())
}

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────
