use std::fmt;

/// Unique identifier for any card-like entity tracked in the state.
///
/// Identifiers index into the per-game [`super::EntityStore`]; they are never
/// reused within a game, so a stale id held by an effect resolves to `None`
/// rather than to a different card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One of the two seats in a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    /// The other seat.
    pub const fn opponent(self) -> Self {
        match self {
            PlayerId::One => PlayerId::Two,
            PlayerId::Two => PlayerId::One,
        }
    }

    const fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerId::One => write!(f, "P1"),
            PlayerId::Two => write!(f, "P2"),
        }
    }
}

/// Per-player bookkeeping visible to the rules core.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerState {
    pub id: PlayerId,
    pub honor: i32,
}

impl PlayerState {
    pub fn new(id: PlayerId, honor: i32) -> Self {
        Self { id, honor }
    }
}

/// Pair of player states addressed by [`PlayerId`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Players([PlayerState; 2]);

impl Players {
    pub fn new(honor: i32) -> Self {
        Self([
            PlayerState::new(PlayerId::One, honor),
            PlayerState::new(PlayerId::Two, honor),
        ])
    }

    pub fn get(&self, id: PlayerId) -> &PlayerState {
        &self.0[id.index()]
    }

    pub fn get_mut(&mut self, id: PlayerId) -> &mut PlayerState {
        &mut self.0[id.index()]
    }
}

/// Phases of one game round, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    Dynasty,
    Draw,
    Conflict,
    Fate,
    Regroup,
}
