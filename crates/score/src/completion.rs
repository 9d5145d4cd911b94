//! Weighted completion sub-score.
//!
//! Measures what fraction of the required criticality-weighted work was
//! actually done: full credit for completions, partial credit
//! (`justified_skip_credit_ratio`) for justified skips, nothing for
//! unjustified skips or steps left unaddressed past their day. Steps not
//! yet due stay out of both sides of the fraction -- not-yet-due is not
//! a deviation.

use rust_decimal::Decimal;

use crate::config::ScoringConfig;
use crate::numeric::{round2, weight_or_default};
use crate::observe::StepObservation;
use crate::types::{CompletionStanding, StepCompletionBreakdown, WeightedCompletionScore};

pub fn weighted_completion(
    observations: &[StepObservation<'_>],
    config: &ScoringConfig,
) -> WeightedCompletionScore {
    let mut earned_total = Decimal::ZERO;
    let mut weight_total = Decimal::ZERO;
    let mut breakdown = Vec::with_capacity(observations.len());

    for obs in observations {
        let status = obs.standing();
        if status == CompletionStanding::NotYetDue {
            breakdown.push(StepCompletionBreakdown {
                step_id: obs.step.id.clone(),
                step_order: obs.step.step_order,
                weight: Decimal::ZERO,
                earned: Decimal::ZERO,
                status,
            });
            continue;
        }

        let unit = weight_or_default(obs.step.criticality_score);
        // A repeatable step carries one unit of weight per occurrence it
        // owes, so a ten-day cadence outweighs a one-shot addition of
        // equal criticality.
        let weight = unit * Decimal::from(obs.expected_occurrences);
        let earned = match status {
            CompletionStanding::Completed => weight,
            CompletionStanding::Partial => {
                let done = obs.completed_occurrences.min(obs.expected_occurrences);
                unit * Decimal::from(done)
            }
            CompletionStanding::SkippedJustified => config.justified_skip_credit_ratio * weight,
            CompletionStanding::SkippedUnjustified
            | CompletionStanding::Missed
            | CompletionStanding::NotYetDue => Decimal::ZERO,
        };

        earned_total += earned;
        weight_total += weight;
        breakdown.push(StepCompletionBreakdown {
            step_id: obs.step.id.clone(),
            step_order: obs.step.step_order,
            weight: weight.normalize(),
            earned: earned.normalize(),
            status,
        });
    }

    // Nothing due yet: vacuously compliant, by definition -- not an error.
    let score = if weight_total.is_zero() {
        Decimal::ONE_HUNDRED
    } else {
        round2(earned_total / weight_total * Decimal::ONE_HUNDRED)
    };

    WeightedCompletionScore {
        score,
        earned: earned_total.normalize(),
        total_weight: weight_total.normalize(),
        breakdown,
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
