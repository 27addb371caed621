use crate::state::PlayerId;

/// Outcome of one resolved conflict, for UI and logging consumers.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConflictResolutionResult {
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    pub attacker_skill: i32,
    pub defender_skill: i32,
    /// Always non-negative.
    pub skill_difference: i32,
    pub is_unopposed: bool,
    pub is_tie: bool,
    /// Whether the defended province broke.
    pub province_broken: bool,
    pub resolution_complete: bool,
}
