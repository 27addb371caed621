//! Final-value computation from a base and a set of modifier records.
//!
//! Override semantics are asymmetric: the presence of any override discards
//! the base and every additive record, and the surviving value is the
//! override created most recently. Additive records sort by (priority,
//! created_order) before summing so the application order is a property of
//! the records, never of registration order.

use crate::modifiers::ModifierRecord;

/// Policy for breaking a tie between overrides created at the same sequence
/// value.
///
/// A true tie cannot arise from one game's monotonic allocator; it can arise
/// when records are reconstructed from a save. The policy makes the outcome
/// explicit instead of leaning on registration order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OverrideTieBreak {
    /// Keep the last of the tied overrides in record order.
    #[default]
    MostRecent,
    /// Keep the tied override with the lowest priority value.
    LowestPriority,
}

/// Computes a final stat value from a base and modifier records.
#[derive(Clone, Copy, Debug)]
pub struct ModifierAggregator {
    floor: i32,
    tie_break: OverrideTieBreak,
}

impl ModifierAggregator {
    pub fn new(floor: i32, tie_break: OverrideTieBreak) -> Self {
        Self { floor, tie_break }
    }

    /// Computes the final value.
    ///
    /// 1. Partition into override / non-override records.
    /// 2. With overrides present: the result is the override with the
    ///    greatest `created_order`; base and non-overrides are ignored.
    /// 3. Otherwise: non-overrides sort by (priority asc, created_order asc)
    ///    and sum onto the base.
    /// 4. Clamp at the stat domain floor.
    pub fn compute(&self, base: i32, records: &[ModifierRecord]) -> i32 {
        let overrides: Vec<&ModifierRecord> = records.iter().filter(|r| r.overrides).collect();

        let value = if overrides.is_empty() {
            let mut additive: Vec<&ModifierRecord> =
                records.iter().filter(|r| !r.overrides).collect();
            additive.sort_by_key(|r| (r.priority, r.created_order));
            additive.iter().fold(base, |acc, r| acc + r.amount)
        } else {
            self.winning_override(&overrides).amount
        };

        value.max(self.floor)
    }

    fn winning_override<'a>(&self, overrides: &[&'a ModifierRecord]) -> &'a ModifierRecord {
        let latest_order = overrides
            .iter()
            .map(|r| r.created_order)
            .max()
            .unwrap_or_default();
        let tied: Vec<&'a ModifierRecord> = overrides
            .iter()
            .copied()
            .filter(|r| r.created_order == latest_order)
            .collect();

        if tied.len() > 1 {
            tracing::warn!(
                created_order = latest_order,
                tied = tied.len(),
                policy = ?self.tie_break,
                "ambiguous simultaneous overrides, applying tie-break policy"
            );
            match self.tie_break {
                OverrideTieBreak::MostRecent => tied[tied.len() - 1],
                OverrideTieBreak::LowestPriority => tied
                    .iter()
                    .copied()
                    .min_by_key(|r| r.priority)
                    .unwrap_or(tied[0]),
            }
        } else {
            tied[0]
        }
    }
}
