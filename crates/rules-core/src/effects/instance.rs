//! A running effect bound to a source card.
//!
//! Instances own nothing but entity ids: targets are looked up in the arena
//! on every evaluation, so a card that changed zones since the last pass
//! simply stops matching instead of dangling.

use std::fmt;

use crate::effects::{EffectError, EffectId, EffectKind};
use crate::modifiers::{Duration, ModifierCategory, ModifierRecord};
use crate::state::{CardState, EntityId, GameState, Location, PlayerId, RestrictionMarker};

/// Predicate an entity must satisfy to be targeted.
pub type TargetPredicate = Box<dyn Fn(&CardState, &GameState) -> bool + Send + Sync>;

/// Predicate the game state must satisfy for the instance to stay active.
pub type ActivePredicate = Box<dyn Fn(&GameState) -> bool + Send + Sync>;

/// Which controller's cards the instance targets, relative to the controller
/// of its source card.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControllerFilter {
    #[default]
    Any,
    Own,
    Opponent,
}

impl ControllerFilter {
    fn matches(self, source: PlayerId, target: PlayerId) -> bool {
        match self {
            ControllerFilter::Any => true,
            ControllerFilter::Own => source == target,
            ControllerFilter::Opponent => source != target,
        }
    }
}

/// Lifecycle states. `Cancelled` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstanceState {
    Uninitialized,
    Active,
    Reevaluating,
    Cancelled,
}

/// A running effect with a dynamic target set.
pub struct EffectInstance {
    pub(crate) id: EffectId,
    pub(crate) created_order: u64,
    source: EntityId,
    kind: EffectKind,
    duration: Duration,
    controller_filter: ControllerFilter,
    location_filter: Location,
    /// Explicitly chosen targets; when set, the zone scan and its filters
    /// are bypassed and the body validates each choice at apply time.
    explicit_targets: Option<Vec<EntityId>>,
    match_condition: Option<TargetPredicate>,
    active_condition: Option<ActivePredicate>,
    /// Conditional effects bypass same-group suppression.
    conditional: bool,
    state: InstanceState,
    targets: Vec<EntityId>,
}

impl EffectInstance {
    pub fn new(source: EntityId, kind: EffectKind, duration: Duration) -> Self {
        Self {
            id: EffectId(u64::MAX),
            created_order: 0,
            source,
            kind,
            duration,
            controller_filter: ControllerFilter::Any,
            location_filter: Location::PlayArea,
            explicit_targets: None,
            match_condition: None,
            active_condition: None,
            conditional: false,
            state: InstanceState::Uninitialized,
            targets: Vec::new(),
        }
    }

    /// Builder: restrict targets by controller relationship.
    pub fn controlled_by(mut self, filter: ControllerFilter) -> Self {
        self.controller_filter = filter;
        self
    }

    /// Builder: the zone scope targets are drawn from.
    pub fn in_location(mut self, location: Location) -> Self {
        self.location_filter = location;
        self
    }

    /// Builder: explicitly chosen targets instead of a zone scan.
    ///
    /// Chosen targets skip the zone, controller, and applicability
    /// filters; the body validates them at apply time, so choosing a
    /// dash-axis card or a removed id faults the instance.
    pub fn with_targets(mut self, targets: Vec<EntityId>) -> Self {
        self.explicit_targets = Some(targets);
        self
    }

    /// Builder: per-target match condition.
    pub fn matching(
        mut self,
        predicate: impl Fn(&CardState, &GameState) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.match_condition = Some(Box::new(predicate));
        self
    }

    /// Builder: whole-instance active condition.
    pub fn while_active(
        mut self,
        predicate: impl Fn(&GameState) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.active_condition = Some(Box::new(predicate));
        self
    }

    /// Builder: mark conditional, bypassing same-group suppression.
    pub fn conditional(mut self) -> Self {
        self.conditional = true;
        self
    }

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn source(&self) -> EntityId {
        self.source
    }

    pub fn kind(&self) -> &EffectKind {
        &self.kind
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_conditional(&self) -> bool {
        self.conditional
    }

    pub fn lifecycle(&self) -> InstanceState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, InstanceState::Cancelled)
    }

    /// Current target set, by id.
    pub fn targets(&self) -> &[EntityId] {
        &self.targets
    }

    pub fn has_target(&self, id: EntityId) -> bool {
        self.targets.contains(&id)
    }

    /// Entities in the declared zone scope that currently qualify, or the
    /// explicitly chosen targets verbatim.
    pub fn potential_targets(&self, state: &GameState) -> Vec<EntityId> {
        if !self.kind.targets_entities() {
            return Vec::new();
        }
        if let Some(chosen) = &self.explicit_targets {
            return chosen.clone();
        }
        let Some(source_controller) = state.card(self.source).map(|c| c.controller) else {
            return Vec::new();
        };

        state
            .entities
            .iter()
            .filter(|card| card.location == self.location_filter)
            .filter(|card| {
                self.controller_filter
                    .matches(source_controller, card.controller)
            })
            .filter(|card| self.kind.applies_to(card))
            .filter(|card| match &self.match_condition {
                Some(predicate) => predicate(card, state),
                None => true,
            })
            .map(|card| card.id)
            .collect()
    }

    /// True while the instance's source still supports it.
    ///
    /// Printed (persistent) abilities require their source in play and face
    /// up; duration-scoped effects outlive their source by design.
    pub fn structurally_valid(&self, state: &GameState) -> bool {
        if self.duration != Duration::Persistent {
            return true;
        }
        match state.card(self.source) {
            Some(card) => {
                !card.facedown
                    && matches!(card.location, Location::PlayArea | Location::ProvinceRow)
            }
            None => false,
        }
    }

    /// One re-evaluation step.
    ///
    /// Cancels the instance when its active condition or structural validity
    /// fails; otherwise drops stale targets, idempotently recalculates the
    /// body on kept targets, and picks up newly qualifying ones. Returns
    /// whether anything observable changed.
    pub fn check_condition(&mut self, state: &mut GameState) -> Result<bool, EffectError> {
        match self.state {
            InstanceState::Cancelled => return Ok(false),
            InstanceState::Uninitialized | InstanceState::Active => {
                self.state = InstanceState::Reevaluating;
            }
            InstanceState::Reevaluating => {}
        }

        let alive = self.structurally_valid(state)
            && match &self.active_condition {
                Some(predicate) => predicate(state),
                None => true,
            };
        if !alive {
            return self.cancel(state);
        }

        let desired = self.potential_targets(state);
        let mut changed = false;

        let stale: Vec<EntityId> = self
            .targets
            .iter()
            .copied()
            .filter(|t| !desired.contains(t))
            .collect();
        for target in stale {
            self.remove_target(state, target)?;
            changed = true;
        }

        for target in self.targets.clone() {
            changed |= self.recalculate_target(state, target)?;
        }

        for target in desired {
            if !self.has_target(target) {
                self.add_target(state, target)?;
                changed = true;
            }
        }

        self.state = InstanceState::Active;
        Ok(changed)
    }

    /// Applies the body to a new target exactly once.
    pub fn add_target(&mut self, state: &mut GameState, target: EntityId) -> Result<(), EffectError> {
        if self.has_target(target) {
            return Ok(());
        }
        self.apply_body(state, target)?;
        self.targets.push(target);
        Ok(())
    }

    /// Fully reverses what `add_target` applied.
    pub fn remove_target(
        &mut self,
        state: &mut GameState,
        target: EntityId,
    ) -> Result<(), EffectError> {
        if !self.has_target(target) {
            return Ok(());
        }
        self.targets.retain(|t| *t != target);

        // A removed card's slot is already invalidated; nothing to unapply.
        if let Some(card) = state.card_mut(target) {
            card.remove_modifiers_by(self.id);
            card.remove_restriction_by(self.id);
        }
        Ok(())
    }

    /// Cancels the instance and drops every target. Terminal and idempotent.
    pub fn cancel(&mut self, state: &mut GameState) -> Result<bool, EffectError> {
        if self.state == InstanceState::Cancelled {
            return Ok(false);
        }
        let had_targets = !self.targets.is_empty();
        for target in std::mem::take(&mut self.targets) {
            if let Some(card) = state.card_mut(target) {
                card.remove_modifiers_by(self.id);
                card.remove_restriction_by(self.id);
            }
        }
        self.state = InstanceState::Cancelled;
        Ok(had_targets)
    }

    fn apply_body(&self, state: &mut GameState, target: EntityId) -> Result<(), EffectError> {
        let label = state
            .card(self.source)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| format!("{}", self.id));

        match &self.kind {
            EffectKind::ModifySkill {
                axis,
                amount,
                priority,
            } => {
                let value = amount.eval(state, target);
                let record = ModifierRecord::additive(
                    label,
                    value,
                    ModifierCategory::Effect,
                    self.source,
                    self.created_order,
                )
                .with_priority(*priority)
                .with_duration(self.duration);
                let card = state
                    .card_mut(target)
                    .ok_or(EffectError::TargetMissing(target))?;
                card.apply_modifier(*axis, record, Some(self.id))?;
            }
            EffectKind::SetSkill { axis, value } => {
                let record = ModifierRecord::overriding(
                    label,
                    *value,
                    ModifierCategory::Effect,
                    self.source,
                    self.created_order,
                )
                .with_duration(self.duration);
                let card = state
                    .card_mut(target)
                    .ok_or(EffectError::TargetMissing(target))?;
                card.apply_modifier(*axis, record, Some(self.id))?;
            }
            EffectKind::Restrict(restriction) => {
                let card = state
                    .card_mut(target)
                    .ok_or(EffectError::TargetMissing(target))?;
                card.add_restriction(RestrictionMarker {
                    restriction: *restriction,
                    source: self.id,
                    duration: self.duration,
                });
            }
            EffectKind::ForceUnopposed | EffectKind::OnResolution(_) => {}
        }
        Ok(())
    }

    /// Re-applies the body to a kept target without double-adding.
    ///
    /// Only dynamic amounts can change between passes; everything else is
    /// verified present and left alone.
    fn recalculate_target(
        &self,
        state: &mut GameState,
        target: EntityId,
    ) -> Result<bool, EffectError> {
        match &self.kind {
            EffectKind::ModifySkill { axis, amount, .. } => {
                let desired = amount.eval(state, target);
                let card = state
                    .card_mut(target)
                    .ok_or(EffectError::TargetMissing(target))?;
                let current = card
                    .modifiers()
                    .iter()
                    .find(|m| m.applied_by == Some(self.id) && m.axis == *axis)
                    .map(|m| m.record.amount);
                if current == Some(desired) {
                    return Ok(false);
                }
                card.remove_modifiers_by(self.id);
                self.apply_body(state, target)?;
                Ok(true)
            }
            EffectKind::SetSkill { axis, .. } => {
                let card = state
                    .card_mut(target)
                    .ok_or(EffectError::TargetMissing(target))?;
                let present = card
                    .modifiers()
                    .iter()
                    .any(|m| m.applied_by == Some(self.id) && m.axis == *axis);
                if present {
                    return Ok(false);
                }
                self.apply_body(state, target)?;
                Ok(true)
            }
            EffectKind::Restrict(restriction) => {
                let card = state
                    .card_mut(target)
                    .ok_or(EffectError::TargetMissing(target))?;
                let present = card
                    .restrictions()
                    .iter()
                    .any(|r| r.source == self.id && r.restriction == *restriction);
                if present {
                    return Ok(false);
                }
                self.apply_body(state, target)?;
                Ok(true)
            }
            EffectKind::ForceUnopposed | EffectKind::OnResolution(_) => Ok(false),
        }
    }
}

impl fmt::Debug for EffectInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectInstance")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("kind", &self.kind)
            .field("duration", &self.duration)
            .field("state", &self.state)
            .field("targets", &self.targets)
            .finish_non_exhaustive()
    }
}
