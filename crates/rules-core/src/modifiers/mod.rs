//! Modifier records and the aggregation rules that turn a printed base plus
//! a set of records into one effective value.

mod aggregator;
mod record;

pub use aggregator::{ModifierAggregator, OverrideTieBreak};
pub use record::{Duration, ModifierCategory, ModifierError, ModifierRecord};
