//! Per-axis skill computation.
//!
//! The calculator gathers the printed base for one axis, the modifier
//! records the effect engine has attached to the card, and the glory-linked
//! contribution of personal status tokens, then hands the set to the
//! aggregator. A printed dash yields `None` and the card is excluded from
//! side sums at the source.

use crate::config::GameConfig;
use crate::modifiers::{ModifierAggregator, ModifierCategory, ModifierRecord};
use crate::state::{CardState, EntityId, GameState, StatusToken};

/// The numeric axes the core computes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillAxis {
    Military,
    Political,
    ProvinceStrength,
    Glory,
}

impl SkillAxis {
    /// The printed base for this axis, `None` for a printed dash.
    pub fn printed_base(self, card: &CardState) -> Option<i32> {
        match self {
            SkillAxis::Military => card.printed.military,
            SkillAxis::Political => card.printed.political,
            SkillAxis::ProvinceStrength => card.printed.strength,
            SkillAxis::Glory => Some(card.printed.glory),
        }
    }

    /// True for the two axes that status tokens feed into.
    fn glory_linked(self) -> bool {
        matches!(self, SkillAxis::Military | SkillAxis::Political)
    }
}

/// Read-only view that computes effective values against one game state.
pub struct SkillCalculator<'a> {
    state: &'a GameState,
    aggregator: ModifierAggregator,
}

impl<'a> SkillCalculator<'a> {
    pub fn new(state: &'a GameState) -> Self {
        Self {
            state,
            aggregator: ModifierAggregator::new(
                GameConfig::SKILL_FLOOR,
                state.config.override_tie_break,
            ),
        }
    }

    pub fn military_skill(&self, id: EntityId) -> Option<i32> {
        self.skill(id, SkillAxis::Military)
    }

    pub fn political_skill(&self, id: EntityId) -> Option<i32> {
        self.skill(id, SkillAxis::Political)
    }

    pub fn province_strength(&self, id: EntityId) -> Option<i32> {
        self.skill(id, SkillAxis::ProvinceStrength)
    }

    pub fn glory(&self, id: EntityId) -> Option<i32> {
        self.skill(id, SkillAxis::Glory)
    }

    /// Effective value for one axis, `None` when the card is missing or the
    /// axis is a printed dash.
    pub fn skill(&self, id: EntityId, axis: SkillAxis) -> Option<i32> {
        let card = self.state.card(id)?;
        let base = axis.printed_base(card)?;

        let mut records: Vec<ModifierRecord> = card.modifiers_for(axis).cloned().collect();
        records.extend(self.token_records(card, axis));

        Some(self.aggregator.compute(base, &records))
    }

    /// Read-only record listing for one axis, for debug/inspection tooling.
    ///
    /// The printed base appears first as a `Base` record; the rest are the
    /// records the aggregator would see, in stored order.
    pub fn modifier_breakdown(&self, id: EntityId, axis: SkillAxis) -> Vec<ModifierRecord> {
        let Some(card) = self.state.card(id) else {
            return Vec::new();
        };
        let Some(base) = axis.printed_base(card) else {
            return Vec::new();
        };

        let mut records = vec![ModifierRecord::additive(
            card.name.clone(),
            base,
            ModifierCategory::Base,
            id,
            0,
        )];
        records.extend(card.modifiers_for(axis).cloned());
        records.extend(self.token_records(card, axis));
        records
    }

    /// Glory-linked token contribution: an honored card adds its effective
    /// glory to both skills, a dishonored card subtracts it.
    fn token_records(&self, card: &CardState, axis: SkillAxis) -> Vec<ModifierRecord> {
        if !axis.glory_linked() {
            return Vec::new();
        }

        let glory = {
            let records: Vec<ModifierRecord> =
                card.modifiers_for(SkillAxis::Glory).cloned().collect();
            self.aggregator.compute(card.printed.glory, &records)
        };

        card.tokens
            .iter()
            .map(|token| {
                let amount = match token {
                    StatusToken::Honored => glory,
                    StatusToken::Dishonored => -glory,
                };
                ModifierRecord::additive(
                    format!("{token} status"),
                    amount,
                    ModifierCategory::StatusToken,
                    card.id,
                    0,
                )
            })
            .collect()
    }
}
