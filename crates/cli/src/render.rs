//! Human-readable rendering for `cuvee score --output text`,
//! `cuvee explain`, and `cuvee overdue`.

use cuvee_core::ExecutionSnapshot;
use cuvee_score::{
    ComplianceScoreResult, DeviationKind, OverdueStep, ScoringConfig, StepStatusRow,
};

/// One-screen summary printed by `cuvee score` in text mode.
pub fn print_score_summary(
    snapshot: &ExecutionSnapshot,
    result: &ComplianceScoreResult,
    quiet: bool,
) {
    if !quiet {
        println!(
            "Execution {} / protocol {} ({})",
            snapshot.execution.id,
            snapshot.protocol.id,
            snapshot.execution.status.as_str()
        );
    }
    println!("Compliance score: {}", result.compliance_score);
    println!(
        "  completion {} ({} / {} weighted credit)",
        result.weighted_completion.score,
        result.weighted_completion.earned,
        result.weighted_completion.total_weight
    );
    println!("  timing     {}", result.timing.score);
    if result.deviations.is_empty() {
        if !quiet {
            println!("No deviations.");
        }
    } else {
        println!("Deviations:");
        for deviation in &result.deviations {
            println!("  {}", describe_deviation(deviation_label(deviation), deviation));
        }
    }
}

/// Full step-by-step narrative printed by `cuvee explain`.
pub fn print_explanation(
    snapshot: &ExecutionSnapshot,
    config: &ScoringConfig,
    result: &ComplianceScoreResult,
    statuses: &[StepStatusRow],
) {
    println!("EXECUTION SUMMARY");
    println!(
        "  Protocol:  {}{}",
        snapshot.protocol.id,
        snapshot
            .protocol
            .varietal
            .as_deref()
            .map(|v| format!(" ({})", v))
            .unwrap_or_default()
    );
    println!("  Execution: {}", snapshot.execution.id);
    println!("  Status:    {}", snapshot.execution.status.as_str());
    println!(
        "  Blend:     {} completion / {} timing",
        config.completion_weight, config.timing_weight
    );
    println!();

    println!("SCORES");
    println!("  Compliance: {}", result.compliance_score);
    println!(
        "  Completion: {}  (earned {} of {} weighted credit)",
        result.weighted_completion.score,
        result.weighted_completion.earned,
        result.weighted_completion.total_weight
    );
    println!("  Timing:     {}", result.timing.score);
    println!();

    println!("STEP BREAKDOWN");
    for (row, entry) in statuses.iter().zip(&result.weighted_completion.breakdown) {
        let name = row.name.as_deref().unwrap_or(row.step_id.as_str());
        println!(
            "  [{}] {} ({}): {}, weight {}, earned {}",
            row.step_order,
            name,
            row.step_type.as_str(),
            row.standing.as_str(),
            entry.weight,
            entry.earned
        );
    }
    println!();

    if result.deviations.is_empty() {
        println!("DEVIATIONS: none");
    } else {
        println!("DEVIATIONS");
        for deviation in &result.deviations {
            println!("  {}", describe_deviation(deviation_label(deviation), deviation));
        }
    }
}

/// Overdue-step report printed by `cuvee overdue` in text mode.
pub fn print_overdue(overdue: &[OverdueStep], quiet: bool) {
    if overdue.is_empty() {
        if !quiet {
            println!("No overdue steps.");
        }
        return;
    }
    println!("Overdue steps:");
    for step in overdue {
        let name = step.name.as_deref().unwrap_or(step.step_id.as_str());
        println!(
            "  [{}] {} ({}): {}h past deadline",
            step.step_order,
            name,
            step.step_type.as_str(),
            step.hours_overdue
        );
    }
}

fn deviation_label(deviation: &cuvee_score::StepDeviation) -> String {
    deviation
        .name
        .clone()
        .unwrap_or_else(|| deviation.step_id.clone())
}

fn describe_deviation(label: String, deviation: &cuvee_score::StepDeviation) -> String {
    match &deviation.kind {
        DeviationKind::Overdue { hours_overdue } => format!(
            "[{}] {}: overdue, {}h past deadline",
            deviation.step_order, label, hours_overdue
        ),
        DeviationKind::Late {
            lateness_hours,
            days_late,
        } => format!(
            "[{}] {}: completed late by {}h ({} full days past tolerance)",
            deviation.step_order, label, lateness_hours, days_late
        ),
        DeviationKind::Skipped { reason, justified } => format!(
            "[{}] {}: skipped ({}, {})",
            deviation.step_order,
            label,
            reason.as_str(),
            if *justified { "justified" } else { "unjustified" }
        ),
    }
}
