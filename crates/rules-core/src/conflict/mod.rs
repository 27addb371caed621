//! Conflict declaration data and the resolution pipeline.

mod resolver;
mod result;

pub use resolver::{ConflictResolver, ResolverError};
pub use result::ConflictResolutionResult;

use crate::skills::SkillAxis;
use crate::state::{Element, EntityId, PlayerId};

/// The two contest kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictType {
    Military,
    Political,
}

impl ConflictType {
    /// The skill axis this conflict kind is scored on.
    pub fn axis(self) -> SkillAxis {
        match self {
            ConflictType::Military => SkillAxis::Military,
            ConflictType::Political => SkillAxis::Political,
        }
    }
}

/// Which side of a conflict a modifier affects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictSide {
    Attacker,
    Defender,
}

/// A player-, ring-, or province-level additive modifier to one side's
/// total, applied after the per-character sum.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SideModifier {
    pub affects: ConflictSide,
    pub amount: i32,
    pub name: String,
    pub source: EntityId,
}

/// Pipeline stages of a conflict's resolution.
///
/// `Resolved` is terminal except through the manual-override path, which
/// reopens `WinnerDetermined`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResolutionStage {
    Created,
    SkillsCalculated,
    WinnerDetermined,
    EffectsApplied,
    Resolved,
}

/// One declared conflict, mutated through the resolver pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Conflict {
    pub attacking_player: PlayerId,
    pub defending_player: PlayerId,
    pub conflict_type: ConflictType,
    pub ring: Element,
    /// Ordered as declared.
    pub attackers: Vec<EntityId>,
    pub defenders: Vec<EntityId>,
    /// The province under attack, if the conflict targets one.
    pub province: Option<EntityId>,
    pub side_modifiers: Vec<SideModifier>,
    pub attacker_skill: i32,
    pub defender_skill: i32,
    pub winner: Option<PlayerId>,
    pub loser: Option<PlayerId>,
    /// Non-negative.
    pub skill_difference: i32,
    pub unopposed: bool,
    pub resolved: bool,
    stage: ResolutionStage,
    cached: Option<ConflictResolutionResult>,
}

impl Conflict {
    /// A freshly declared conflict with the given attackers.
    pub fn declare(
        attacking_player: PlayerId,
        conflict_type: ConflictType,
        ring: Element,
        attackers: Vec<EntityId>,
    ) -> Self {
        Self {
            attacking_player,
            defending_player: attacking_player.opponent(),
            conflict_type,
            ring,
            attackers,
            defenders: Vec::new(),
            province: None,
            side_modifiers: Vec::new(),
            attacker_skill: 0,
            defender_skill: 0,
            winner: None,
            loser: None,
            skill_difference: 0,
            unopposed: false,
            resolved: false,
            stage: ResolutionStage::Created,
            cached: None,
        }
    }

    /// Builder: declared defenders.
    pub fn with_defenders(mut self, defenders: Vec<EntityId>) -> Self {
        self.defenders = defenders;
        self
    }

    /// Builder: the attacked province.
    pub fn with_province(mut self, province: EntityId) -> Self {
        self.province = Some(province);
        self
    }

    /// Builder: a side-level modifier.
    pub fn with_side_modifier(mut self, modifier: SideModifier) -> Self {
        self.side_modifiers.push(modifier);
        self
    }

    pub fn stage(&self) -> ResolutionStage {
        self.stage
    }

    pub(crate) fn set_stage(&mut self, stage: ResolutionStage) {
        self.stage = stage;
    }

    pub(crate) fn cached(&self) -> Option<&ConflictResolutionResult> {
        self.cached.as_ref()
    }

    pub(crate) fn set_cached(&mut self, result: Option<ConflictResolutionResult>) {
        self.cached = result;
    }
}
