//! Conflict resolution pipeline.
//!
//! One resolver drives one declared conflict through skill calculation,
//! winner determination, the unopposed check, and resolution effects. Every
//! step is idempotent given unchanged inputs, and the resolution-effect step
//! is guarded so it runs exactly once; a second full resolution returns the
//! cached result.

use serde_json::Value;

use crate::config::GameConfig;
use crate::conflict::{Conflict, ConflictResolutionResult, ConflictSide, ResolutionStage};
use crate::effects::{EffectEngine, ResolutionAction};
use crate::events::{EventProperties, EventQueue};
use crate::skills::SkillCalculator;
use crate::state::{EntityId, GameState, PlayerId};

/// Honor the defender forfeits for leaving a conflict unopposed.
const UNOPPOSED_HONOR_LOSS: i32 = 1;

/// Errors from the resolution pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolverError {
    /// Fail-fast: a resolver cannot exist without a declared conflict.
    #[error("no conflict has been declared")]
    NoActiveConflict,

    #[error("pipeline step needs stage {expected}, conflict is at {actual}")]
    OutOfOrder {
        expected: ResolutionStage,
        actual: ResolutionStage,
    },

    /// The conflict reached a terminal stage; only the manual-override
    /// path may reopen it.
    #[error("conflict already resolved (stage {stage})")]
    AlreadyResolved { stage: ResolutionStage },
}

/// Drives the current conflict of one game through resolution.
pub struct ConflictResolver<'a> {
    state: &'a mut GameState,
    engine: &'a mut EffectEngine,
    events: &'a mut EventQueue,
}

impl<'a> ConflictResolver<'a> {
    /// Fails fast when no conflict has been declared on the game state.
    pub fn new(
        state: &'a mut GameState,
        engine: &'a mut EffectEngine,
        events: &'a mut EventQueue,
    ) -> Result<Self, ResolverError> {
        if state.current_conflict.is_none() {
            return Err(ResolverError::NoActiveConflict);
        }
        Ok(Self {
            state,
            engine,
            events,
        })
    }

    /// Runs the full pipeline and returns the result.
    ///
    /// Resolving an already-resolved conflict returns the cached result
    /// without recomputing anything.
    pub fn resolve(&mut self) -> Result<ConflictResolutionResult, ResolverError> {
        if let Some(cached) = self.conflict()?.cached() {
            return Ok(cached.clone());
        }
        self.calculate_skills()?;
        self.determine_winner()?;
        self.check_unopposed()?;
        self.apply_resolution_effects()
    }

    /// Step 1: sums each side's per-character skill, then side-level
    /// modifiers, flooring each total independently.
    pub fn calculate_skills(&mut self) -> Result<(), ResolverError> {
        self.ensure_open()?;
        let (axis, attackers, defenders, side_modifiers) = {
            let conflict = self.conflict()?;
            (
                conflict.conflict_type.axis(),
                conflict.attackers.clone(),
                conflict.defenders.clone(),
                conflict.side_modifiers.clone(),
            )
        };

        let calc = SkillCalculator::new(self.state);
        // Characters with a printed dash contribute nothing: they are
        // excluded at the source, not zeroed afterwards.
        let sum = |ids: &[EntityId]| -> i32 {
            ids.iter().filter_map(|id| calc.skill(*id, axis)).sum()
        };
        let mut attacker_skill = sum(&attackers);
        let mut defender_skill = sum(&defenders);

        for modifier in &side_modifiers {
            match modifier.affects {
                ConflictSide::Attacker => attacker_skill += modifier.amount,
                ConflictSide::Defender => defender_skill += modifier.amount,
            }
        }

        attacker_skill = attacker_skill.max(GameConfig::SKILL_FLOOR);
        defender_skill = defender_skill.max(GameConfig::SKILL_FLOOR);

        let conflict = self.conflict_mut()?;
        conflict.attacker_skill = attacker_skill;
        conflict.defender_skill = defender_skill;
        if conflict.stage() == ResolutionStage::Created {
            conflict.set_stage(ResolutionStage::SkillsCalculated);
        }
        Ok(())
    }

    /// Step 2: positive difference means the attacker wins, negative the
    /// defender; zero means no winner and no loser.
    pub fn determine_winner(&mut self) -> Result<(), ResolverError> {
        self.ensure_open()?;
        let conflict = self.conflict_mut()?;
        if conflict.stage() < ResolutionStage::SkillsCalculated {
            return Err(ResolverError::OutOfOrder {
                expected: ResolutionStage::SkillsCalculated,
                actual: conflict.stage(),
            });
        }

        let difference = conflict.attacker_skill - conflict.defender_skill;
        (conflict.winner, conflict.loser) = if difference > 0 {
            (
                Some(conflict.attacking_player),
                Some(conflict.defending_player),
            )
        } else if difference < 0 {
            (
                Some(conflict.defending_player),
                Some(conflict.attacking_player),
            )
        } else {
            (None, None)
        };
        conflict.skill_difference = difference.abs();
        conflict.set_stage(ResolutionStage::WinnerDetermined);
        Ok(())
    }

    /// Step 3: unopposed iff a force-unopposed effect targets the conflict,
    /// or nobody defended and the attacker actually won. A 0-0 tie with no
    /// defenders is not unopposed.
    pub fn check_unopposed(&mut self) -> Result<bool, ResolverError> {
        self.ensure_open()?;
        let forced = self.engine.has_force_unopposed();
        let conflict = self.conflict_mut()?;
        if conflict.stage() < ResolutionStage::WinnerDetermined {
            return Err(ResolverError::OutOfOrder {
                expected: ResolutionStage::WinnerDetermined,
                actual: conflict.stage(),
            });
        }

        let attacker_won = conflict.winner == Some(conflict.attacking_player);
        conflict.unopposed = forced || (conflict.defenders.is_empty() && attacker_won);
        Ok(conflict.unopposed)
    }

    /// Step 4: marks the conflict resolved and runs on-resolution bodies
    /// exactly once. Guarded: a second call returns the cached result.
    pub fn apply_resolution_effects(&mut self) -> Result<ConflictResolutionResult, ResolverError> {
        if let Some(cached) = self.conflict()?.cached() {
            return Ok(cached.clone());
        }
        {
            let conflict = self.conflict()?;
            if conflict.stage() < ResolutionStage::WinnerDetermined {
                return Err(ResolverError::OutOfOrder {
                    expected: ResolutionStage::WinnerDetermined,
                    actual: conflict.stage(),
                });
            }
        }

        let province_broken = self.break_province()?;

        let (winner, loser, unopposed, ring) = {
            let conflict = self.conflict_mut()?;
            conflict.resolved = true;
            conflict.set_stage(ResolutionStage::EffectsApplied);
            (
                conflict.winner,
                conflict.loser,
                conflict.unopposed,
                conflict.ring,
            )
        };

        for (_, action) in self.engine.resolution_actions() {
            match action {
                ResolutionAction::LoserLosesHonor(amount) => {
                    if let Some(loser) = loser {
                        self.state.players.get_mut(loser).honor -= amount;
                    }
                }
                ResolutionAction::ClaimRing => {
                    if let Some(winner) = winner {
                        self.state.ring_mut(ring).claimed_by = Some(winner);
                    }
                }
            }
        }

        if unopposed {
            if let Some(loser) = loser {
                self.state.players.get_mut(loser).honor -= UNOPPOSED_HONOR_LOSS;
            }
        }

        self.state.ring_mut(ring).contested = false;

        let result = {
            let conflict = self.conflict_mut()?;
            conflict.set_stage(ResolutionStage::Resolved);
            let result = ConflictResolutionResult {
                winner: conflict.winner,
                loser: conflict.loser,
                attacker_skill: conflict.attacker_skill,
                defender_skill: conflict.defender_skill,
                skill_difference: conflict.skill_difference,
                is_unopposed: conflict.unopposed,
                is_tie: conflict.winner.is_none(),
                province_broken,
                resolution_complete: true,
            };
            conflict.set_cached(Some(result.clone()));
            result
        };

        self.announce(&result);
        Ok(result)
    }

    /// Manual override: a privileged caller forces the winner, bypassing
    /// calculation and the unopposed check. The difference is still
    /// recomputed from the already-known skills, and resolution effects run
    /// exactly once for the forced outcome.
    pub fn force_winner(
        &mut self,
        winner: PlayerId,
    ) -> Result<ConflictResolutionResult, ResolverError> {
        let conflict = self.conflict_mut()?;
        conflict.winner = Some(winner);
        conflict.loser = Some(winner.opponent());
        conflict.skill_difference = (conflict.attacker_skill - conflict.defender_skill).abs();
        conflict.resolved = false;
        conflict.set_stage(ResolutionStage::WinnerDetermined);
        conflict.set_cached(None);
        self.apply_resolution_effects()
    }

    /// Steps 1-3 only run while the conflict is still open.
    /// `EffectsApplied` and `Resolved` are reopened exclusively through
    /// [`Self::force_winner`].
    fn ensure_open(&self) -> Result<(), ResolverError> {
        let stage = self.conflict()?.stage();
        if stage >= ResolutionStage::EffectsApplied {
            return Err(ResolverError::AlreadyResolved { stage });
        }
        Ok(())
    }

    fn conflict(&self) -> Result<&Conflict, ResolverError> {
        self.state
            .current_conflict
            .as_ref()
            .ok_or(ResolverError::NoActiveConflict)
    }

    fn conflict_mut(&mut self) -> Result<&mut Conflict, ResolverError> {
        self.state
            .current_conflict
            .as_mut()
            .ok_or(ResolverError::NoActiveConflict)
    }

    /// The attacked province breaks when the winning attacker's margin
    /// reaches its effective strength.
    fn break_province(&mut self) -> Result<bool, ResolverError> {
        let (winner, attacking_player, difference, province) = {
            let conflict = self.conflict()?;
            (
                conflict.winner,
                conflict.attacking_player,
                conflict.skill_difference,
                conflict.province,
            )
        };

        let Some(province) = province else {
            return Ok(false);
        };
        if winner != Some(attacking_player) {
            return Ok(false);
        }

        let strength = SkillCalculator::new(self.state)
            .province_strength(province)
            .unwrap_or(0);
        if difference < strength {
            return Ok(false);
        }

        if let Some(card) = self.state.card_mut(province) {
            card.broken = true;
        }
        Ok(true)
    }

    /// Publishes the outcome as a causal event for downstream consumers.
    fn announce(&mut self, result: &ConflictResolutionResult) {
        let mut properties = EventProperties::new();
        if let Some(winner) = result.winner {
            properties.insert("winner".into(), Value::from(winner.to_string()));
        }
        properties.insert(
            "skillDifference".into(),
            Value::from(result.skill_difference),
        );
        properties.insert("unopposed".into(), Value::from(result.is_unopposed));
        self.events
            .create(self.state, "onConflictResolved", properties, None);
    }
}
