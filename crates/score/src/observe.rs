//! The observation pass: turn raw snapshot data into one validated,
//! fully-resolved observation per step before any arithmetic happens.
//!
//! Orphan completions and malformed skip records are rejected here, so
//! the calculators downstream never see inconsistent data. Observations
//! come out sorted by `step_order`; every downstream artifact inherits
//! that ordering.

use std::collections::{BTreeMap, BTreeSet};

use time::OffsetDateTime;

use cuvee_core::{ExecutionSnapshot, SkipReason, Step, StepCompletion};

use crate::config::{ScoringConfig, SkipClass};
use crate::types::ScoreError;
use crate::window::ExecutionWindow;

/// The record that decides a step's fate when several exist.
#[derive(Debug, Clone)]
pub enum EffectiveRecord<'a> {
    Completed {
        record: &'a StepCompletion,
        completed_at: OffsetDateTime,
    },
    Skipped {
        record: &'a StepCompletion,
        reason: SkipReason,
        class: SkipClass,
    },
}

/// Everything the calculators need to know about one step.
#[derive(Debug, Clone)]
pub struct StepObservation<'a> {
    pub step: &'a Step,
    /// In scope for scoring: the expected day has arrived (and, for
    /// repeatable steps, at least one occurrence falls inside the
    /// protocol duration).
    pub due: bool,
    /// Occurrences owed: 1 for a due one-shot step, the daily count for
    /// a due repeatable step, 0 when not due.
    pub expected_occurrences: u32,
    /// Distinct days on which a completion was recorded (repeatable
    /// steps), or 0/1 for one-shot steps.
    pub completed_occurrences: u32,
    pub effective: Option<EffectiveRecord<'a>>,
    /// Lateness of the effective completion past the deadline, in whole
    /// seconds. `None` when nothing was completed.
    pub lateness_seconds: Option<i64>,
}

impl StepObservation<'_> {
    pub fn standing(&self) -> crate::types::CompletionStanding {
        use crate::types::CompletionStanding;
        if !self.due {
            return CompletionStanding::NotYetDue;
        }
        match &self.effective {
            Some(EffectiveRecord::Completed { .. }) => {
                if self.step.can_repeat_daily
                    && self.completed_occurrences < self.expected_occurrences
                {
                    CompletionStanding::Partial
                } else {
                    CompletionStanding::Completed
                }
            }
            Some(EffectiveRecord::Skipped {
                class: SkipClass::Justified,
                ..
            }) => CompletionStanding::SkippedJustified,
            Some(EffectiveRecord::Skipped {
                class: SkipClass::Unjustified,
                ..
            }) => CompletionStanding::SkippedUnjustified,
            None => CompletionStanding::Missed,
        }
    }
}

/// Resolve one observation per step, sorted by `step_order`.
pub fn observe_steps<'a>(
    snapshot: &'a ExecutionSnapshot,
    window: &ExecutionWindow,
    config: &ScoringConfig,
) -> Result<Vec<StepObservation<'a>>, ScoreError> {
    let known_steps: BTreeSet<&str> = snapshot.steps.iter().map(|s| s.id.as_str()).collect();

    // Validate every record up front, in input order, so the first bad
    // record is reported deterministically.
    let mut by_step: BTreeMap<&str, Vec<&'a StepCompletion>> = BTreeMap::new();
    for record in &snapshot.completions {
        if !known_steps.contains(record.step_id.as_str()) {
            return Err(ScoreError::OrphanCompletion {
                completion_id: record.id.clone(),
                step_id: record.step_id.clone(),
            });
        }
        if record.was_skipped {
            let reason =
                record
                    .skip_reason
                    .ok_or_else(|| ScoreError::InvalidSkipRecord {
                        completion_id: record.id.clone(),
                        message: "skipped without a skip_reason".to_string(),
                    })?;
            if config.classify(reason).is_none() {
                return Err(ScoreError::InvalidSkipRecord {
                    completion_id: record.id.clone(),
                    message: format!(
                        "skip_reason {} is outside the classification table",
                        reason.as_str()
                    ),
                });
            }
        }
        by_step
            .entry(record.step_id.as_str())
            .or_default()
            .push(record);
    }

    let mut ordered: Vec<&Step> = snapshot.steps.iter().collect();
    ordered.sort_by_key(|s| s.step_order);

    let empty: Vec<&StepCompletion> = Vec::new();
    let mut observations = Vec::with_capacity(ordered.len());
    for step in ordered {
        let records = by_step.get(step.id.as_str()).unwrap_or(&empty);
        observations.push(observe_one(step, records, window, config));
    }
    Ok(observations)
}

fn observe_one<'a>(
    step: &'a Step,
    records: &[&'a StepCompletion],
    window: &ExecutionWindow,
    config: &ScoringConfig,
) -> StepObservation<'a> {
    let expected_occurrences = if step.can_repeat_daily {
        window.expected_occurrences(step)
    } else if window.is_due(step) {
        1
    } else {
        0
    };
    let due = expected_occurrences > 0;

    let completions: Vec<(&'a StepCompletion, OffsetDateTime)> = records
        .iter()
        .filter_map(|r| r.completed_at.map(|at| (*r, at)))
        .collect();

    let completed_occurrences = if step.can_repeat_daily {
        let days: BTreeSet<u32> = completions
            .iter()
            .map(|(_, at)| window.day_index(*at))
            .collect();
        u32::try_from(days.len()).unwrap_or(u32::MAX)
    } else {
        u32::from(!completions.is_empty())
    };

    // Most recent completion wins: latest completed_at, record order as
    // the tie-break. A timestamped completion beats any skip record; a
    // step that was skipped and later performed was performed. Among
    // pure skips the last record in creation order wins.
    let effective = if let Some((record, completed_at)) = completions
        .iter()
        .enumerate()
        .max_by_key(|(idx, &(_, at))| (at, *idx))
        .map(|(_, pair)| *pair)
    {
        Some(EffectiveRecord::Completed {
            record,
            completed_at,
        })
    } else {
        records
            .iter()
            .rev()
            .copied()
            .find(|r| r.was_skipped)
            .map(|record| {
                // Both checked during the validation sweep above.
                let reason = record.skip_reason.unwrap_or(SkipReason::Other);
                let class = config.classify(reason).unwrap_or(SkipClass::Unjustified);
                EffectiveRecord::Skipped {
                    record,
                    reason,
                    class,
                }
            })
    };

    let lateness_seconds = match &effective {
        Some(EffectiveRecord::Completed { completed_at, .. }) => {
            if step.can_repeat_daily {
                // Timed against the cadence's first deadline, using the
                // earliest completion on record.
                completions
                    .iter()
                    .map(|(_, at)| *at)
                    .min()
                    .map(|at| window.lateness_seconds(step, at))
            } else {
                Some(window.lateness_seconds(step, *completed_at))
            }
        }
        _ => None,
    };

    StepObservation {
        step,
        due,
        expected_occurrences,
        completed_occurrences,
        effective,
        lateness_seconds,
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
