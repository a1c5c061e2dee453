//! Compaction policy
//!
//! Tombstoned slots stay in place until enough of the table is dead, then a
//! single filtering pass drops them. Requiring a large dead fraction keeps the
//! total compaction work linear in the number of records replayed.

use serde::{Deserialize, Serialize};

use crate::error::ReplayError;

/// Configuration for slot compaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionConfig {
    /// Compaction never runs at or below this many total slots
    pub min_total_slots: u64,
    /// Numerator of the dead-slot fraction that triggers compaction
    pub dead_ratio_numerator: u64,
    /// Denominator of the dead-slot fraction that triggers compaction
    pub dead_ratio_denominator: u64,
    /// Run compaction automatically after each processed record
    pub auto_compact: bool,
}

impl Default for CompactionConfig {
    fn default() -> Self {
        Self {
            min_total_slots: 10,
            dead_ratio_numerator: 3,
            dead_ratio_denominator: 4, // more than 75% dead
            auto_compact: true,
        }
    }
}

impl CompactionConfig {
    /// Set the minimum slot count
    pub fn with_min_total_slots(mut self, min_total_slots: u64) -> Self {
        self.min_total_slots = min_total_slots;
        self
    }

    /// Set the dead fraction as `numerator / denominator`
    pub fn with_dead_ratio(mut self, numerator: u64, denominator: u64) -> Self {
        self.dead_ratio_numerator = numerator;
        self.dead_ratio_denominator = denominator;
        self
    }

    /// Enable or disable automatic compaction
    pub fn with_auto_compact(mut self, enabled: bool) -> Self {
        self.auto_compact = enabled;
        self
    }

    /// Check that the ratio is a proper fraction
    ///
    /// A numerator at or above the denominator would never trigger, and a zero
    /// denominator is meaningless.
    pub fn validate(&self) -> Result<(), ReplayError> {
        if self.dead_ratio_denominator == 0 {
            return Err(ReplayError::invalid_config(
                "dead_ratio_denominator must be non-zero",
            ));
        }
        if self.dead_ratio_numerator >= self.dead_ratio_denominator {
            return Err(ReplayError::invalid_config(format!(
                "dead ratio {}/{} must be below 1",
                self.dead_ratio_numerator, self.dead_ratio_denominator
            )));
        }
        Ok(())
    }

    /// Whether a table of `total_slots` with `dead_slots` tombstones should be compacted
    pub fn should_compact(&self, total_slots: u64, dead_slots: u64) -> bool {
        self.auto_compact
            && total_slots > self.min_total_slots
            && u128::from(dead_slots) * u128::from(self.dead_ratio_denominator)
                > u128::from(total_slots) * u128::from(self.dead_ratio_numerator)
    }
}

/// Result of a compaction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompactionResult {
    /// Slots held before the pass
    pub slots_before: u64,
    /// Dead slots dropped
    pub slots_reclaimed: u64,
    /// Live slots kept
    pub slots_retained: u64,
}

impl CompactionResult {
    /// Whether the pass changed nothing
    pub fn is_noop(&self) -> bool {
        self.slots_reclaimed == 0
    }
}
