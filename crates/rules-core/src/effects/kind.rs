//! Closed vocabulary of effect bodies.
//!
//! Effect bodies are a closed enum registered at construction: the engine
//! dispatches on the variant, so there is no runtime name-based handler
//! lookup and no "handler not found" failure mode.

use crate::skills::{SkillAxis, SkillCalculator};
use crate::state::{CardKind, CardState, EntityId, GameState};

/// On/off restrictions an effect can place on a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Restriction {
    /// Cannot be declared as an attacker.
    CannotAttack,
    /// Cannot be declared as a defender.
    CannotDefend,
}

/// How a skill modifier's amount is computed.
///
/// `TargetGlory` amounts are re-evaluated on every engine pass, so a change
/// to the target's glory ripples into the modified axis on the next pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Amount {
    Fixed(i32),
    /// The target's current effective glory.
    TargetGlory,
}

impl Amount {
    pub(crate) fn eval(self, state: &GameState, target: EntityId) -> i32 {
        match self {
            Amount::Fixed(value) => value,
            Amount::TargetGlory => SkillCalculator::new(state).glory(target).unwrap_or(0),
        }
    }
}

/// What happens when a conflict this effect watches resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResolutionAction {
    /// The losing player loses this much honor.
    LoserLosesHonor(i32),
    /// The winning player claims the contested ring.
    ClaimRing,
}

/// Groups of effects that conflict with each other on one entity.
///
/// A new effect in a group is suppressed while the entity already carries a
/// same-group effect of equal or longer duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SuppressionGroup {
    Restriction(Restriction),
    AbsoluteSet(SkillAxis),
}

/// One effect body.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EffectKind {
    /// Adds to one skill axis of each target.
    ModifySkill {
        axis: SkillAxis,
        amount: Amount,
        priority: i32,
    },

    /// Replaces one skill axis of each target with an absolute value.
    SetSkill { axis: SkillAxis, value: i32 },

    /// Places an on/off restriction on each target.
    Restrict(Restriction),

    /// Forces the current conflict to resolve as unopposed.
    ForceUnopposed,

    /// Runs once when the current conflict resolves.
    OnResolution(ResolutionAction),
}

impl EffectKind {
    /// True for bodies that maintain a per-entity target set; conflict-scoped
    /// bodies (`ForceUnopposed`, `OnResolution`) target the conflict itself.
    pub fn targets_entities(&self) -> bool {
        matches!(
            self,
            EffectKind::ModifySkill { .. } | EffectKind::SetSkill { .. } | EffectKind::Restrict(_)
        )
    }

    /// Whether the body can apply to this card at all.
    ///
    /// Skill bodies reject printed-dash axes here, at the source, rather
    /// than masking the records out of sums later.
    pub fn applies_to(&self, card: &CardState) -> bool {
        match self {
            EffectKind::ModifySkill { axis, .. } | EffectKind::SetSkill { axis, .. } => {
                axis.printed_base(card).is_some()
            }
            EffectKind::Restrict(_) => card.kind == CardKind::Character,
            EffectKind::ForceUnopposed | EffectKind::OnResolution(_) => false,
        }
    }

    /// The conflict group this body belongs to, if any.
    pub fn suppression_group(&self) -> Option<SuppressionGroup> {
        match self {
            EffectKind::Restrict(restriction) => Some(SuppressionGroup::Restriction(*restriction)),
            EffectKind::SetSkill { axis, .. } => Some(SuppressionGroup::AbsoluteSet(*axis)),
            _ => None,
        }
    }
}
