use crate::modifiers::OverrideTieBreak;

/// Game configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Upper bound on effect re-evaluation passes per state commit.
    ///
    /// Exceeding this bound is an invariant violation (a modifier cycle),
    /// surfaced as [`crate::effects::EngineError::FixedPointDiverged`] rather
    /// than silently truncating the pass loop.
    pub max_fixed_point_passes: u32,

    /// Upper bound on event replacement-chain depth.
    ///
    /// Walking past this depth stops at the last reachable event and logs.
    pub max_replacement_depth: u32,

    /// Policy for breaking ties between simultaneous override modifiers.
    pub override_tie_break: OverrideTieBreak,
}

impl GameConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum personal status tokens a card can carry at once.
    pub const MAX_STATUS_TOKENS: usize = 4;

    // ===== rule constants =====
    /// The five elemental rings.
    pub const RING_COUNT: usize = 5;
    /// Computed skills never drop below this floor.
    pub const SKILL_FLOOR: i32 = 0;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_FIXED_POINT_PASSES: u32 = 100;
    pub const DEFAULT_MAX_REPLACEMENT_DEPTH: u32 = 32;

    pub fn new() -> Self {
        Self {
            max_fixed_point_passes: Self::DEFAULT_MAX_FIXED_POINT_PASSES,
            max_replacement_depth: Self::DEFAULT_MAX_REPLACEMENT_DEPTH,
            override_tie_break: OverrideTieBreak::MostRecent,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new()
    }
}
