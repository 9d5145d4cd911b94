//! Tunable scoring policy.
//!
//! ADR-036 fixes the numbers (70/30 blend, 0.6 justified-skip credit,
//! 2 percentage points per late day) but requires them to live in one
//! explicit value object rather than inline at use sites, so a future
//! ADR revision is a config change, not a code hunt. `Default` carries
//! the ADR-036 values; the CLI can load an override file.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use cuvee_core::SkipReason;

use crate::types::ScoreError;

/// Which side of the skip-credit policy a reason falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipClass {
    Justified,
    Unjustified,
}

/// The complete scoring policy for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Share of the final score carried by weighted completion (0.70).
    pub completion_weight: Decimal,
    /// Share carried by timing (0.30). Must sum with the above to 1.
    pub timing_weight: Decimal,
    /// Credit ratio a justified skip earns against full completion (0.6).
    pub justified_skip_credit_ratio: Decimal,
    /// Percentage points deducted per full day of lateness (2).
    pub late_penalty_per_day: Decimal,
    /// Skip reasons that earn partial credit.
    pub justified_skip_reasons: BTreeSet<SkipReason>,
    /// Skip reasons that earn nothing. Together with the justified set
    /// this must partition the whole vocabulary.
    pub unjustified_skip_reasons: BTreeSet<SkipReason>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            completion_weight: Decimal::new(70, 2),
            timing_weight: Decimal::new(30, 2),
            justified_skip_credit_ratio: Decimal::new(6, 1),
            late_penalty_per_day: Decimal::from(2),
            justified_skip_reasons: [
                SkipReason::EquipmentFailure,
                SkipReason::FermentationEnded,
                SkipReason::FermentationFailed,
                SkipReason::ConditionNotMet,
            ]
            .into_iter()
            .collect(),
            unjustified_skip_reasons: [SkipReason::WinemakerDiscretion, SkipReason::Other]
                .into_iter()
                .collect(),
        }
    }
}

impl ScoringConfig {
    /// Check the config is usable: weights blend to 1, ratios are sane,
    /// and the two classification sets are a disjoint, exhaustive
    /// partition of the skip-reason vocabulary. Guards against silent
    /// fall-through when a new skip reason is added to the model but not
    /// to the policy.
    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.completion_weight + self.timing_weight != Decimal::ONE {
            return Err(ScoreError::InvalidConfig {
                message: format!(
                    "completion_weight {} + timing_weight {} must equal 1",
                    self.completion_weight, self.timing_weight
                ),
            });
        }
        if self.completion_weight.is_sign_negative() || self.timing_weight.is_sign_negative() {
            return Err(ScoreError::InvalidConfig {
                message: "aggregate weights must not be negative".to_string(),
            });
        }
        if self.justified_skip_credit_ratio < Decimal::ZERO
            || self.justified_skip_credit_ratio > Decimal::ONE
        {
            return Err(ScoreError::InvalidConfig {
                message: format!(
                    "justified_skip_credit_ratio {} must be within [0, 1]",
                    self.justified_skip_credit_ratio
                ),
            });
        }
        if self.late_penalty_per_day.is_sign_negative() {
            return Err(ScoreError::InvalidConfig {
                message: format!(
                    "late_penalty_per_day {} must not be negative",
                    self.late_penalty_per_day
                ),
            });
        }

        if let Some(both) = self
            .justified_skip_reasons
            .intersection(&self.unjustified_skip_reasons)
            .next()
        {
            return Err(ScoreError::InvalidConfig {
                message: format!(
                    "skip reason {} is classified both justified and unjustified",
                    both.as_str()
                ),
            });
        }
        for reason in SkipReason::ALL {
            if self.classify(reason).is_none() {
                return Err(ScoreError::InvalidConfig {
                    message: format!("skip reason {} is not classified", reason.as_str()),
                });
            }
        }
        Ok(())
    }

    /// Look up a reason in the classification table. `None` means the
    /// table does not cover it (callers turn that into
    /// `InvalidSkipRecord` or `InvalidConfig` depending on where the gap
    /// surfaced).
    pub fn classify(&self, reason: SkipReason) -> Option<SkipClass> {
        if self.justified_skip_reasons.contains(&reason) {
            Some(SkipClass::Justified)
        } else if self.unjustified_skip_reasons.contains(&reason) {
            Some(SkipClass::Unjustified)
        } else {
            None
        }
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
