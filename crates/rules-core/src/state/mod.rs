//! Authoritative game state representation.
//!
//! This module owns the data structures that describe cards, players, rings,
//! and phase bookkeeping. Collaborators (UI, persistence, transport) read
//! this state but mutate it exclusively through the effect engine and the
//! conflict resolver.

mod card;
mod common;
mod ring;
mod store;

pub use card::{
    AppliedModifier, CardKind, CardState, Location, PrintedStats, RestrictionMarker, StatusToken,
    StatusTokens,
};
pub use common::{EntityId, Phase, PlayerId, PlayerState, Players};
pub use ring::{Element, RingState};
pub use store::EntityStore;

use crate::config::GameConfig;
use crate::conflict::Conflict;

/// Canonical state of one game instance.
///
/// Nothing here is process-global: two concurrently hosted games hold two
/// fully independent `GameState` values.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub config: GameConfig,
    pub players: Players,
    pub entities: EntityStore,
    pub rings: [RingState; GameConfig::RING_COUNT],
    pub phase: Phase,
    /// The conflict currently being contested, if one has been declared.
    pub current_conflict: Option<Conflict>,
    /// Monotonic sequence allocator backing modifier `created_order` and
    /// event ordering. Never reset within a game.
    sequence: u64,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            players: Players::new(Self::STARTING_HONOR),
            entities: EntityStore::new(),
            rings: [
                RingState::new(Element::Air),
                RingState::new(Element::Earth),
                RingState::new(Element::Fire),
                RingState::new(Element::Water),
                RingState::new(Element::Void),
            ],
            phase: Phase::Dynasty,
            current_conflict: None,
            sequence: 0,
        }
    }

    /// Starting honor for both players.
    pub const STARTING_HONOR: i32 = 10;

    /// Allocates the next value of the game-wide monotonic sequence.
    pub fn next_sequence(&mut self) -> u64 {
        let next = self.sequence;
        self.sequence += 1;
        next
    }

    pub fn ring(&self, element: Element) -> &RingState {
        &self.rings[element.index()]
    }

    pub fn ring_mut(&mut self, element: Element) -> &mut RingState {
        &mut self.rings[element.index()]
    }

    /// Shorthand for inserting a card into the arena.
    pub fn add_card(&mut self, card: CardState) -> EntityId {
        self.entities.insert(card)
    }

    pub fn card(&self, id: EntityId) -> Option<&CardState> {
        self.entities.get(id)
    }

    pub fn card_mut(&mut self, id: EntityId) -> Option<&mut CardState> {
        self.entities.get_mut(id)
    }

    /// Declares a conflict: stores it as current and marks its ring
    /// contested. Declaration legality (attacker restrictions, dash axes)
    /// is checked upstream of this core.
    pub fn declare_conflict(&mut self, conflict: Conflict) {
        self.ring_mut(conflict.ring).contested = true;
        self.current_conflict = Some(conflict);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
