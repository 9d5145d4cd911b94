//! Timing sub-score.
//!
//! Penalizes lateness independently of whether the work got done: only
//! steps with an effective completion enter the pool, each starting at
//! 100 and losing `late_penalty_per_day` percentage points per full day
//! past its deadline, floored at 0. The aggregate is the
//! criticality-weighted average; an empty pool scores 100.

use rust_decimal::Decimal;

use crate::config::ScoringConfig;
use crate::numeric::{hours_from_seconds, round2, weight_or_default};
use crate::observe::{EffectiveRecord, StepObservation};
use crate::types::{StepTimingEntry, TimingScore};

const SECONDS_PER_DAY: i64 = 86_400;

pub fn timing_score(observations: &[StepObservation<'_>], config: &ScoringConfig) -> TimingScore {
    let mut weighted_sum = Decimal::ZERO;
    let mut weight_total = Decimal::ZERO;
    let mut entries = Vec::new();

    for obs in observations {
        if !obs.due {
            continue;
        }
        if !matches!(obs.effective, Some(EffectiveRecord::Completed { .. })) {
            continue;
        }
        let lateness = obs.lateness_seconds.unwrap_or(0);
        let days_late = u32::try_from(lateness / SECONDS_PER_DAY).unwrap_or(u32::MAX);
        let penalty = config.late_penalty_per_day * Decimal::from(days_late);
        let score = (Decimal::ONE_HUNDRED - penalty).max(Decimal::ZERO);
        let weight = weight_or_default(obs.step.criticality_score);

        weighted_sum += score * weight;
        weight_total += weight;
        entries.push(StepTimingEntry {
            step_id: obs.step.id.clone(),
            step_order: obs.step.step_order,
            lateness_hours: hours_from_seconds(lateness),
            days_late,
            score: score.normalize(),
            weight: weight.normalize(),
        });
    }

    let score = if weight_total.is_zero() {
        Decimal::ONE_HUNDRED
    } else {
        round2(weighted_sum / weight_total)
    };

    TimingScore { score, entries }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::observe_steps;
    use crate::window::ExecutionWindow;
    use cuvee_core::{
        Execution, ExecutionSnapshot, ExecutionStatus, Protocol, SkipReason, Step, StepCompletion,
        StepType,
    };
    use std::str::FromStr;
    use time::macros::datetime;
    use time::OffsetDateTime;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn step(id: &str, order: u32, expected_day: u32, criticality: &str) -> Step {
        Step {
            id: id.to_string(),
            step_order: order,
            step_type: StepType::QualityCheck,
            name: None,
            expected_day,
            tolerance_hours: 12,
            criticality_score: dec(criticality),
            is_critical: false,
            can_repeat_daily: false,
            depends_on_step_id: None,
        }
    }

    fn completed(id: &str, step_id: &str, at: OffsetDateTime) -> StepCompletion {
        StepCompletion {
            id: id.to_string(),
            execution_id: "exec-1".to_string(),
            step_id: step_id.to_string(),
            completed_at: Some(at),
            was_skipped: false,
            skip_reason: None,
            recorded_by: None,
            notes: None,
        }
    }

    fn skipped(id: &str, step_id: &str) -> StepCompletion {
        StepCompletion {
            id: id.to_string(),
            execution_id: "exec-1".to_string(),
            step_id: step_id.to_string(),
            completed_at: None,
            was_skipped: true,
            skip_reason: Some(SkipReason::EquipmentFailure),
            recorded_by: None,
            notes: None,
        }
    }

    fn snapshot(steps: Vec<Step>, completions: Vec<StepCompletion>) -> ExecutionSnapshot {
        ExecutionSnapshot {
            protocol: Protocol {
                id: "prot-1".to_string(),
                varietal: None,
                expected_duration_days: 14,
            },
            steps,
            execution: Execution {
                id: "exec-1".to_string(),
                protocol_id: "prot-1".to_string(),
                fermentation_id: "ferm-1".to_string(),
                start_date: datetime!(2025-09-10 08:00 UTC),
                status: ExecutionStatus::Active,
                ended_at: None,
                compliance_score: None,
            },
            completions,
            observed_at: datetime!(2025-09-20 08:00 UTC),
        }
    }

    fn compute(snap: &ExecutionSnapshot) -> TimingScore {
        let config = ScoringConfig::default();
        let window = ExecutionWindow::for_execution(
            &snap.execution,
            &snap.protocol,
            snap.observed_at,
        )
        .unwrap();
        let observations = observe_steps(snap, &window, &config).unwrap();
        timing_score(&observations, &config)
    }

    #[test]
    fn on_time_scores_full_marks() {
        let snap = snapshot(
            vec![step("s1", 1, 0, "100")],
            vec![completed("c1", "s1", datetime!(2025-09-10 08:00 UTC))],
        );
        let result = compute(&snap);
        assert_eq!(result.score, dec("100"));
        assert_eq!(result.entries[0].days_late, 0);
    }

    #[test]
    fn within_tolerance_scores_full_marks() {
        let snap = snapshot(
            vec![step("s1", 1, 0, "100")],
            vec![completed("c1", "s1", datetime!(2025-09-10 19:00 UTC))],
        );
        let result = compute(&snap);
        assert_eq!(result.score, dec("100"));
        assert_eq!(result.entries[0].lateness_hours, Decimal::ZERO);
    }

    #[test]
    fn three_days_late_loses_six_points() {
        // Deadline day 0 + 12h tolerance; completed exactly 72h past it.
        let snap = snapshot(
            vec![step("s1", 1, 0, "100")],
            vec![completed("c1", "s1", datetime!(2025-09-13 20:00 UTC))],
        );
        let result = compute(&snap);
        assert_eq!(result.score, dec("94"));
        assert_eq!(result.entries[0].days_late, 3);
        assert_eq!(result.entries[0].lateness_hours, dec("72"));
    }

    #[test]
    fn lateness_under_a_full_day_deducts_nothing() {
        let snap = snapshot(
            vec![step("s1", 1, 0, "100")],
            vec![completed("c1", "s1", datetime!(2025-09-11 10:00 UTC))],
        );
        let result = compute(&snap);
        // 14 hours past deadline: late, but no full day elapsed.
        assert_eq!(result.score, dec("100"));
        assert_eq!(result.entries[0].days_late, 0);
        assert_eq!(result.entries[0].lateness_hours, dec("14"));
    }

    #[test]
    fn step_score_floors_at_zero() {
        // 60 full days late would be -20 without the floor.
        let mut snap = snapshot(
            vec![step("s1", 1, 0, "100")],
            vec![completed("c1", "s1", datetime!(2025-11-09 20:00 UTC))],
        );
        snap.observed_at = datetime!(2025-11-10 08:00 UTC);
        let result = compute(&snap);
        assert_eq!(result.entries[0].score, Decimal::ZERO);
        assert_eq!(result.score, Decimal::ZERO);
    }

    #[test]
    fn skipped_steps_never_enter_the_pool() {
        let snap = snapshot(
            vec![step("s1", 1, 0, "100"), step("s2", 2, 0, "100")],
            vec![
                completed("c1", "s1", datetime!(2025-09-10 09:00 UTC)),
                skipped("c2", "s2"),
            ],
        );
        let result = compute(&snap);
        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.score, dec("100"));
    }

    #[test]
    fn empty_pool_scores_one_hundred() {
        let snap = snapshot(vec![step("s1", 1, 0, "100")], vec![]);
        let result = compute(&snap);
        assert_eq!(result.score, dec("100"));
        assert!(result.entries.is_empty());
    }

    #[test]
    fn aggregate_is_criticality_weighted() {
        // A on time (weight 100), B two days late -> 96 (weight 50):
        // (100x100 + 96x50) / 150 = 98.67 after rounding.
        let snap = snapshot(
            vec![step("a", 1, 0, "100"), step("b", 2, 1, "50")],
            vec![
                completed("c1", "a", datetime!(2025-09-10 09:00 UTC)),
                completed("c2", "b", datetime!(2025-09-13 20:00 UTC)),
            ],
        );
        let result = compute(&snap);
        assert_eq!(result.score, dec("98.67"));
    }
}
