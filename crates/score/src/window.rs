//! Elapsed-time window for one execution.
//!
//! All temporal context is fixed once, up front, from the snapshot; no
//! stage of the engine consults a clock. The cutoff is `observed_at`,
//! or `ended_at` when the execution already finished before then -- a
//! finished fermentation re-scored months later reproduces the score it
//! had when it ended.

use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use cuvee_core::{Execution, ExecutionStatus, Protocol, Step};

use crate::types::ScoreError;

/// The execution's position in time, computed once per scoring run.
#[derive(Debug, Clone)]
pub struct ExecutionWindow {
    pub start_date: OffsetDateTime,
    /// End of the observable window: min(observed_at, ended_at).
    pub cutoff: OffsetDateTime,
    /// Whole days elapsed between start and cutoff.
    pub elapsed_days: u32,
    /// Protocol's expected fermentation length in days.
    pub duration_days: u32,
    started: bool,
}

impl ExecutionWindow {
    pub fn for_execution(
        execution: &Execution,
        protocol: &Protocol,
        observed_at: OffsetDateTime,
    ) -> Result<ExecutionWindow, ScoreError> {
        let cutoff = match execution.ended_at {
            Some(ended) if ended < observed_at => ended,
            _ => observed_at,
        };
        if cutoff < execution.start_date {
            return Err(ScoreError::InvalidExecutionWindow {
                execution_id: execution.id.clone(),
                start_date: rfc3339(execution.start_date),
                cutoff: rfc3339(cutoff),
            });
        }
        let elapsed = (cutoff - execution.start_date).whole_days();
        Ok(ExecutionWindow {
            start_date: execution.start_date,
            cutoff,
            elapsed_days: u32::try_from(elapsed).unwrap_or(u32::MAX),
            duration_days: protocol.expected_duration_days,
            started: execution.status != ExecutionStatus::NotStarted,
        })
    }

    /// Whether the step's expected day has arrived. NOT_STARTED
    /// executions have nothing due: the state machine says work has not
    /// begun, so nothing can be owed yet.
    pub fn is_due(&self, step: &Step) -> bool {
        self.started && step.expected_day <= self.elapsed_days
    }

    /// Absolute timestamp the step falls due.
    pub fn due_at(&self, step: &Step) -> OffsetDateTime {
        self.start_date + Duration::days(i64::from(step.expected_day))
    }

    /// Due timestamp plus the step's tolerance allowance.
    pub fn deadline(&self, step: &Step) -> OffsetDateTime {
        self.due_at(step) + Duration::hours(i64::from(step.tolerance_hours))
    }

    /// Whole seconds a completion landed past the deadline; 0 within
    /// tolerance.
    pub fn lateness_seconds(&self, step: &Step, completed_at: OffsetDateTime) -> i64 {
        (completed_at - self.deadline(step)).whole_seconds().max(0)
    }

    /// Whole seconds the cutoff sits past the step's deadline; 0 when
    /// the deadline has not passed.
    pub fn overdue_seconds(&self, step: &Step) -> i64 {
        (self.cutoff - self.deadline(step)).whole_seconds().max(0)
    }

    /// How many daily occurrences a repeatable step owes: one per day
    /// from `expected_day` through min(elapsed, expected duration)
    /// inclusive. Completions cannot be owed for days that have not
    /// happened.
    pub fn expected_occurrences(&self, step: &Step) -> u32 {
        if !self.is_due(step) {
            return 0;
        }
        let last_day = self.elapsed_days.min(self.duration_days);
        if step.expected_day > last_day {
            return 0;
        }
        last_day - step.expected_day + 1
    }

    /// Day offset of a timestamp relative to fermentation start, floored
    /// at 0 (a record stamped before start counts as day 0).
    pub fn day_index(&self, at: OffsetDateTime) -> u32 {
        let days = (at - self.start_date).whole_days().max(0);
        u32::try_from(days).unwrap_or(u32::MAX)
    }
}

fn rfc3339(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use cuvee_core::StepType;
    use rust_decimal::Decimal;
    use time::macros::datetime;

    fn execution(status: ExecutionStatus) -> Execution {
        Execution {
            id: "exec-1".to_string(),
            protocol_id: "prot-1".to_string(),
            fermentation_id: "ferm-1".to_string(),
            start_date: datetime!(2025-09-10 08:00 UTC),
            status,
            ended_at: None,
            compliance_score: None,
        }
    }

    fn protocol() -> Protocol {
        Protocol {
            id: "prot-1".to_string(),
            varietal: None,
            expected_duration_days: 7,
        }
    }

    fn step(expected_day: u32, tolerance_hours: u32, repeat: bool) -> Step {
        Step {
            id: "s-1".to_string(),
            step_order: 1,
            step_type: StepType::Monitoring,
            name: None,
            expected_day,
            tolerance_hours,
            criticality_score: Decimal::from(50),
            is_critical: false,
            can_repeat_daily: repeat,
            depends_on_step_id: None,
        }
    }

    fn window_at(observed: OffsetDateTime) -> ExecutionWindow {
        ExecutionWindow::for_execution(&execution(ExecutionStatus::Active), &protocol(), observed)
            .unwrap()
    }

    #[test]
    fn elapsed_days_are_whole_days() {
        let w = window_at(datetime!(2025-09-14 07:59 UTC));
        assert_eq!(w.elapsed_days, 3);
        let w = window_at(datetime!(2025-09-14 08:00 UTC));
        assert_eq!(w.elapsed_days, 4);
    }

    #[test]
    fn start_after_cutoff_is_invalid() {
        let result = ExecutionWindow::for_execution(
            &execution(ExecutionStatus::Active),
            &protocol(),
            datetime!(2025-09-09 08:00 UTC),
        );
        assert!(matches!(
            result,
            Err(ScoreError::InvalidExecutionWindow { .. })
        ));
    }

    #[test]
    fn ended_at_caps_the_window() {
        let mut exec = execution(ExecutionStatus::Completed);
        exec.ended_at = Some(datetime!(2025-09-13 08:00 UTC));
        let w =
            ExecutionWindow::for_execution(&exec, &protocol(), datetime!(2025-12-01 00:00 UTC))
                .unwrap();
        assert_eq!(w.elapsed_days, 3);
        assert_eq!(w.cutoff, datetime!(2025-09-13 08:00 UTC));
    }

    #[test]
    fn not_started_has_nothing_due() {
        let w = ExecutionWindow::for_execution(
            &execution(ExecutionStatus::NotStarted),
            &protocol(),
            datetime!(2025-09-14 08:00 UTC),
        )
        .unwrap();
        assert!(!w.is_due(&step(0, 0, false)));
    }

    #[test]
    fn due_day_granularity() {
        let w = window_at(datetime!(2025-09-12 08:00 UTC)); // elapsed 2
        assert!(w.is_due(&step(2, 0, false)));
        assert!(!w.is_due(&step(3, 0, false)));
    }

    #[test]
    fn deadline_adds_tolerance() {
        let w = window_at(datetime!(2025-09-14 08:00 UTC));
        let s = step(1, 12, false);
        assert_eq!(w.due_at(&s), datetime!(2025-09-11 08:00 UTC));
        assert_eq!(w.deadline(&s), datetime!(2025-09-11 20:00 UTC));
    }

    #[test]
    fn lateness_floors_at_zero() {
        let w = window_at(datetime!(2025-09-14 08:00 UTC));
        let s = step(1, 12, false);
        assert_eq!(w.lateness_seconds(&s, datetime!(2025-09-11 19:00 UTC)), 0);
        assert_eq!(
            w.lateness_seconds(&s, datetime!(2025-09-13 20:00 UTC)),
            172_800
        );
    }

    #[test]
    fn repeatable_occurrences_span_due_day_through_elapsed() {
        let w = window_at(datetime!(2025-09-14 08:00 UTC)); // elapsed 4
        assert_eq!(w.expected_occurrences(&step(1, 0, true)), 4); // days 1..=4
        assert_eq!(w.expected_occurrences(&step(0, 0, true)), 5); // days 0..=4
    }

    #[test]
    fn repeatable_occurrences_cap_at_protocol_duration() {
        let w = window_at(datetime!(2025-09-30 08:00 UTC)); // elapsed 20, duration 7
        assert_eq!(w.expected_occurrences(&step(1, 0, true)), 7); // days 1..=7
    }

    #[test]
    fn repeatable_beyond_duration_owes_nothing() {
        let w = window_at(datetime!(2025-09-30 08:00 UTC)); // elapsed 20, duration 7
        assert_eq!(w.expected_occurrences(&step(9, 0, true)), 0);
    }
}
