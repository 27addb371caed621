//! Indexed entity arena.
//!
//! All cards of one game live here; every other part of the core refers to
//! them by [`EntityId`]. Effects therefore never own or point at card state
//! directly, and removing a card is a single slot invalidation that cannot
//! leave dangling references behind.

use crate::state::{CardState, EntityId};

/// Arena of all card entities for one game instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityStore {
    slots: Vec<Option<CardState>>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a card and assigns it the next id.
    ///
    /// Ids are never reused; a removed card's slot stays empty for the rest
    /// of the game.
    pub fn insert(&mut self, mut card: CardState) -> EntityId {
        let id = EntityId(self.slots.len() as u32);
        card.id = id;
        self.slots.push(Some(card));
        id
    }

    /// Invalidates a card's slot, returning the final state if it was live.
    pub fn remove(&mut self, id: EntityId) -> Option<CardState> {
        self.slots.get_mut(id.0 as usize)?.take()
    }

    pub fn get(&self, id: EntityId) -> Option<&CardState> {
        self.slots.get(id.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut CardState> {
        self.slots.get_mut(id.0 as usize)?.as_mut()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Iterates over live cards.
    pub fn iter(&self) -> impl Iterator<Item = &CardState> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut CardState> {
        self.slots.iter_mut().filter_map(|s| s.as_mut())
    }

    /// Number of live cards.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
