//! Card state: printed attributes, zone placement, tokens, and the
//! per-card modifier/restriction lists maintained by the effect engine.

use arrayvec::ArrayVec;

use crate::config::GameConfig;
use crate::effects::{EffectId, Restriction};
use crate::modifiers::{Duration, ModifierError, ModifierRecord};
use crate::skills::SkillAxis;
use crate::state::{EntityId, PlayerId};

/// Zones a card can occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Location {
    DynastyDeck,
    ConflictDeck,
    Hand,
    ProvinceRow,
    PlayArea,
    DiscardPile,
    RemovedFromGame,
}

/// Card categories the rules core distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CardKind {
    Character,
    Attachment,
    Holding,
    Province,
}

/// Printed (base) numeric attributes.
///
/// `None` models a printed dash: the card simply has no value on that axis,
/// and modifiers targeting it are rejected at apply time rather than being
/// masked out of sums later.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrintedStats {
    pub military: Option<i32>,
    pub political: Option<i32>,
    pub glory: i32,
    pub strength: Option<i32>,
}

impl PrintedStats {
    /// Printed values for a character card.
    pub fn character(military: Option<i32>, political: Option<i32>, glory: i32) -> Self {
        Self {
            military,
            political,
            glory,
            strength: None,
        }
    }

    /// Printed values for a province card.
    pub fn province(strength: i32) -> Self {
        Self {
            military: None,
            political: None,
            glory: 0,
            strength: Some(strength),
        }
    }
}

/// Personal status tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatusToken {
    Honored,
    Dishonored,
}

impl StatusToken {
    fn cancels(self, other: StatusToken) -> bool {
        self != other
    }
}

/// Status tokens carried by one card.
///
/// Adding a token is idempotent; adding the opposite of a carried token
/// removes the carried one instead (the tokens cancel out).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusTokens {
    tokens: ArrayVec<StatusToken, { GameConfig::MAX_STATUS_TOKENS }>,
}

impl StatusTokens {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has(&self, token: StatusToken) -> bool {
        self.tokens.contains(&token)
    }

    /// Adds a token, cancelling against an opposite token if one is carried.
    ///
    /// Returns true if the card's token set changed.
    pub fn add(&mut self, token: StatusToken) -> bool {
        if let Some(pos) = self.tokens.iter().position(|t| t.cancels(token)) {
            self.tokens.remove(pos);
            return true;
        }
        if self.has(token) || self.tokens.is_full() {
            return false;
        }
        self.tokens.push(token);
        true
    }

    pub fn remove(&mut self, token: StatusToken) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| *t != token);
        self.tokens.len() != before
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusToken> {
        self.tokens.iter()
    }
}

/// A modifier record pinned to one skill axis of one card.
///
/// `applied_by` identifies the effect instance that produced the record, so
/// unapplying an effect removes exactly what it added. Records applied
/// outside the effect engine (debug/manual paths) carry `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppliedModifier {
    pub axis: SkillAxis,
    pub record: ModifierRecord,
    pub applied_by: Option<EffectId>,
}

/// An on/off restriction placed on a card by an effect instance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RestrictionMarker {
    pub restriction: Restriction,
    pub source: EffectId,
    pub duration: Duration,
}

/// Runtime state of one card.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CardState {
    pub id: EntityId,
    pub name: String,
    pub kind: CardKind,
    pub controller: PlayerId,
    pub location: Location,
    pub facedown: bool,
    pub printed: PrintedStats,
    pub tokens: StatusTokens,
    /// Broken provinces stay in the row but no longer defend.
    pub broken: bool,
    modifiers: Vec<AppliedModifier>,
    restrictions: Vec<RestrictionMarker>,
}

impl CardState {
    /// Creates a card with a placeholder id; [`super::EntityStore::insert`]
    /// assigns the real one.
    pub fn new(
        name: impl Into<String>,
        kind: CardKind,
        controller: PlayerId,
        printed: PrintedStats,
    ) -> Self {
        Self {
            id: EntityId(u32::MAX),
            name: name.into(),
            kind,
            controller,
            location: match kind {
                CardKind::Province => Location::ProvinceRow,
                _ => Location::Hand,
            },
            facedown: false,
            printed,
            tokens: StatusTokens::empty(),
            broken: false,
            modifiers: Vec::new(),
            restrictions: Vec::new(),
        }
    }

    /// Builder: place the card in a zone.
    pub fn in_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Attaches a modifier record to one axis.
    ///
    /// Rejected when the axis is printed as a dash: a card with no value on
    /// an axis never participates in that axis, so there is nothing to
    /// modify.
    pub fn apply_modifier(
        &mut self,
        axis: SkillAxis,
        record: ModifierRecord,
        applied_by: Option<EffectId>,
    ) -> Result<(), ModifierError> {
        if axis.printed_base(self).is_none() {
            return Err(ModifierError::DashAxis {
                card: self.id,
                axis,
            });
        }
        self.modifiers.push(AppliedModifier {
            axis,
            record,
            applied_by,
        });
        Ok(())
    }

    /// Removes every modifier a given effect instance applied.
    ///
    /// Returns the number of records removed.
    pub fn remove_modifiers_by(&mut self, effect: EffectId) -> usize {
        let before = self.modifiers.len();
        self.modifiers.retain(|m| m.applied_by != Some(effect));
        before - self.modifiers.len()
    }

    /// Records applied to one axis, for aggregation.
    pub fn modifiers_for(&self, axis: SkillAxis) -> impl Iterator<Item = &ModifierRecord> {
        self.modifiers
            .iter()
            .filter(move |m| m.axis == axis)
            .map(|m| &m.record)
    }

    /// All applied modifiers, for inspection tooling.
    pub fn modifiers(&self) -> &[AppliedModifier] {
        &self.modifiers
    }

    pub fn add_restriction(&mut self, marker: RestrictionMarker) {
        self.restrictions.push(marker);
    }

    /// Removes the restriction marker a given effect instance placed.
    pub fn remove_restriction_by(&mut self, effect: EffectId) -> bool {
        let before = self.restrictions.len();
        self.restrictions.retain(|r| r.source != effect);
        self.restrictions.len() != before
    }

    /// True while any active marker imposes the restriction, whichever
    /// effect put it there.
    pub fn is_restricted(&self, restriction: Restriction) -> bool {
        self.restrictions.iter().any(|r| r.restriction == restriction)
    }

    pub fn restrictions(&self) -> &[RestrictionMarker] {
        &self.restrictions
    }
}
