//! Deviation detector.
//!
//! Enumerates every step that strayed from ideal adherence -- overdue
//! with nothing on record, completed late, or skipped -- for display and
//! audit, independent of the numeric score. Ordered by `step_order` so
//! the list is stable across runs and matches the protocol definition.

use crate::numeric::hours_from_seconds;
use crate::observe::{EffectiveRecord, StepObservation};
use crate::types::{DeviationKind, StepDeviation};
use crate::window::ExecutionWindow;

const SECONDS_PER_DAY: i64 = 86_400;

pub fn detect_deviations(
    observations: &[StepObservation<'_>],
    window: &ExecutionWindow,
) -> Vec<StepDeviation> {
    let mut deviations = Vec::new();

    for obs in observations {
        if !obs.due {
            continue;
        }
        let kind = match &obs.effective {
            Some(EffectiveRecord::Skipped { reason, class, .. }) => Some(DeviationKind::Skipped {
                reason: *reason,
                justified: *class == crate::config::SkipClass::Justified,
            }),
            Some(EffectiveRecord::Completed { .. }) => {
                let lateness = obs.lateness_seconds.unwrap_or(0);
                if lateness > 0 {
                    Some(DeviationKind::Late {
                        lateness_hours: hours_from_seconds(lateness),
                        days_late: u32::try_from(lateness / SECONDS_PER_DAY).unwrap_or(u32::MAX),
                    })
                } else {
                    None
                }
            }
            None => {
                let overdue = window.overdue_seconds(obs.step);
                if overdue > 0 {
                    Some(DeviationKind::Overdue {
                        hours_overdue: hours_from_seconds(overdue),
                    })
                } else {
                    // Due today, still inside tolerance: the completion
                    // score already withholds credit; not yet a violation.
                    None
                }
            }
        };

        if let Some(kind) = kind {
            deviations.push(StepDeviation {
                step_id: obs.step.id.clone(),
                step_order: obs.step.step_order,
                step_type: obs.step.step_type,
                name: obs.step.name.clone(),
                depends_on_step_id: obs.step.depends_on_step_id.clone(),
                kind,
            });
        }
    }

    deviations
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
