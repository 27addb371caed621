use crate::skills::SkillAxis;
use crate::state::EntityId;

/// Where a modifier came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierCategory {
    /// The printed value itself, surfaced in breakdown listings.
    Base,
    Card,
    Equipment,
    Effect,
    StatusToken,
    Temporary,
    Override,
}

/// How long a modifier or effect lasts, shortest to longest.
///
/// `Custom` durations are bounded by collaborator-defined conditions and
/// rank alongside `Persistent`; ranking always goes through [`Duration::rank`],
/// never through derived ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Duration {
    EndOfDuel,
    EndOfConflict,
    EndOfPhase,
    EndOfRound,
    Persistent,
    Custom,
}

impl Duration {
    /// Position in the shortest-to-longest ranking used for effect
    /// suppression and duration expiry.
    pub const fn rank(self) -> u8 {
        match self {
            Duration::EndOfDuel => 0,
            Duration::EndOfConflict => 1,
            Duration::EndOfPhase => 2,
            Duration::EndOfRound => 3,
            Duration::Persistent | Duration::Custom => 4,
        }
    }

    /// True if this duration lapses at the given boundary.
    ///
    /// Persistent and custom durations never lapse at a phase boundary.
    pub fn lapses_at(self, boundary: Duration) -> bool {
        self.rank() <= boundary.rank() && self.rank() < Duration::Persistent.rank()
    }
}

/// One immutable contribution to a computed stat.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifierRecord {
    /// Signed contribution, or the replacement value for overrides.
    pub amount: i32,
    pub name: String,
    pub category: ModifierCategory,
    pub source: EntityId,
    /// Lower applies first among non-overrides.
    pub priority: i32,
    /// An override replaces the base and every non-override record.
    pub overrides: bool,
    pub duration: Duration,
    /// Monotonic creation tie-break issued by [`crate::state::GameState::next_sequence`].
    pub created_order: u64,
}

impl ModifierRecord {
    /// An additive contribution.
    pub fn additive(
        name: impl Into<String>,
        amount: i32,
        category: ModifierCategory,
        source: EntityId,
        created_order: u64,
    ) -> Self {
        Self {
            amount,
            name: name.into(),
            category,
            source,
            priority: 0,
            overrides: false,
            duration: Duration::Persistent,
            created_order,
        }
    }

    /// A replacement value: base and non-overrides are discarded entirely.
    pub fn overriding(
        name: impl Into<String>,
        amount: i32,
        category: ModifierCategory,
        source: EntityId,
        created_order: u64,
    ) -> Self {
        Self {
            overrides: true,
            ..Self::additive(name, amount, category, source, created_order)
        }
    }

    /// Builder: set apply priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Builder: set duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Errors from attaching a modifier to a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ModifierError {
    #[error("card {card} has a printed dash on the {axis} axis")]
    DashAxis { card: EntityId, axis: SkillAxis },
}
