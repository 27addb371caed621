//! Deterministic rules-computation core for a two-player strategic card
//! game.
//!
//! `rules-core` computes effective numeric attributes (combat skills,
//! province strength, glory) under a dynamically changing set of active
//! modifiers, and resolves conflicts where each side's modified skills are
//! summed and compared. Catalog loading, presentation, transport, and
//! persistence are external collaborators; they read the types re-exported
//! here and mutate state only through [`effects::EffectEngine`] and
//! [`conflict::ConflictResolver`].

pub mod config;
pub mod conflict;
pub mod effects;
pub mod events;
pub mod modifiers;
pub mod skills;
pub mod state;

pub use config::GameConfig;
pub use conflict::{
    Conflict, ConflictResolutionResult, ConflictResolver, ConflictSide, ConflictType,
    ResolutionStage, ResolverError, SideModifier,
};
pub use effects::{
    Amount, ControllerFilter, EffectEngine, EffectError, EffectId, EffectInstance, EffectKind,
    EngineError, InstanceState, ResolutionAction, Restriction,
};
pub use events::{EventId, EventProperties, EventQueue, GameEvent};
pub use modifiers::{
    Duration, ModifierAggregator, ModifierCategory, ModifierError, ModifierRecord,
    OverrideTieBreak,
};
pub use skills::{SkillAxis, SkillCalculator};
pub use state::{
    CardKind, CardState, Element, EntityId, EntityStore, GameState, Location, Phase, PlayerId,
    PlayerState, Players, PrintedStats, RingState, StatusToken, StatusTokens,
};
