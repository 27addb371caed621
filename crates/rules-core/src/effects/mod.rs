//! Running effects and the per-game engine that re-evaluates them.

mod engine;
mod instance;
mod kind;

pub use engine::{EffectEngine, EngineError};
pub use instance::{
    ActivePredicate, ControllerFilter, EffectInstance, InstanceState, TargetPredicate,
};
pub use kind::{Amount, EffectKind, ResolutionAction, Restriction, SuppressionGroup};

use std::fmt;

use crate::modifiers::ModifierError;
use crate::state::EntityId;

/// Identifier of a registered effect instance, unique within one game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectId(pub u64);

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "effect#{}", self.0)
    }
}

/// Faults raised by an effect body during apply/unapply.
///
/// These are caught at the engine boundary: the offending instance is logged
/// and cancelled so the rest of the pass is not corrupted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("target {0} not found in the entity store")]
    TargetMissing(EntityId),

    #[error(transparent)]
    Modifier(#[from] ModifierError),
}
