//! The five elemental rings and their per-game state.

use crate::state::PlayerId;

/// The five elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Element {
    Air,
    Earth,
    Fire,
    Water,
    Void,
}

impl Element {
    pub(crate) const fn index(self) -> usize {
        match self {
            Element::Air => 0,
            Element::Earth => 1,
            Element::Fire => 2,
            Element::Water => 3,
            Element::Void => 4,
        }
    }
}

/// Per-game state of one ring.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RingState {
    pub element: Element,
    /// Fate accumulated on an unclaimed ring.
    pub fate: u32,
    /// Set while a declared conflict is anchored to this ring.
    pub contested: bool,
    /// The player who claimed the ring this round, if any.
    pub claimed_by: Option<PlayerId>,
}

impl RingState {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            fate: 0,
            contested: false,
            claimed_by: None,
        }
    }

    /// Returns the ring to the unclaimed pool (regroup phase).
    pub fn reset(&mut self) {
        self.contested = false;
        self.claimed_by = None;
    }
}
