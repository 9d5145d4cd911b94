//! Decimal helpers for the scoring path.
//!
//! All score arithmetic uses `rust_decimal::Decimal` with
//! `RoundingStrategy::MidpointNearestEven` -- the rounding ADR-036 means
//! by `round(x, 2)`. No `f64` anywhere in the scoring path.

use rust_decimal::{Decimal, RoundingStrategy};

const SECONDS_PER_HOUR: i64 = 3_600;

/// Round to two decimal places (banker's rounding) and strip trailing
/// zeros so the wire form of a score is stable regardless of the scale
/// the arithmetic happened to produce.
pub(crate) fn round2(val: Decimal) -> Decimal {
    val.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
        .normalize()
}

/// Per-step weight: `criticality_score`, or 1 when the criticality is
/// zero. A zero-weight step must neither vanish from scoring nor
/// divide-by-zero the aggregate.
pub(crate) fn weight_or_default(criticality: Decimal) -> Decimal {
    if criticality.is_zero() {
        Decimal::ONE
    } else {
        criticality
    }
}

/// Whole seconds expressed as fractional hours, rounded for reporting.
pub(crate) fn hours_from_seconds(seconds: i64) -> Decimal {
    round2(Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
