//! Per-game effect registry and fixed-point re-evaluation.
//!
//! The engine owns every [`EffectInstance`] of one game; cards hold only
//! identifiers. On every state mutation the caller runs [`EffectEngine::reevaluate`],
//! which repeats evaluation passes until a pass produces no change. The pass
//! loop is bounded: exceeding the bound means a modifier cycle and is
//! reported as an invariant violation, never silently truncated.

use crate::effects::{EffectError, EffectId, EffectInstance, EffectKind, ResolutionAction};
use crate::modifiers::Duration;
use crate::state::GameState;

/// Invariant violations detected by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("effect re-evaluation did not reach a fixed point within {passes} passes")]
    FixedPointDiverged { passes: u32 },
}

/// Registry and evaluator for all effect instances of one game.
///
/// Not shared between games: each `GameState` pairs with exactly one engine,
/// so concurrently hosted games never see each other's effects.
#[derive(Debug, Default)]
pub struct EffectEngine {
    instances: Vec<EffectInstance>,
    next_id: u64,
}

impl EffectEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an instance, assigns its id and creation order, and runs
    /// its first evaluation.
    ///
    /// A non-conditional instance in a suppression group is cancelled at
    /// birth when every one of its would-be targets already carries a
    /// same-group effect of equal or longer duration.
    pub fn register(&mut self, mut instance: EffectInstance, state: &mut GameState) -> EffectId {
        let id = EffectId(self.next_id);
        self.next_id += 1;
        instance.id = id;
        instance.created_order = state.next_sequence();

        if self.is_suppressed(&instance, state) {
            tracing::debug!(
                effect = %id,
                duration = %instance.duration(),
                "same-kind effect suppressed by longer-lived instance"
            );
            // Cancel before any target is acquired; nothing to unapply.
            let _ = instance.cancel(state);
            self.instances.push(instance);
            return id;
        }

        self.instances.push(instance);
        let idx = self.instances.len() - 1;
        if let Err(fault) = self.instances[idx].check_condition(state) {
            self.contain_fault(idx, fault, state);
        }
        id
    }

    /// Re-evaluates every instance until a full pass produces no change.
    ///
    /// Returns the number of passes taken (at least one). Instances are
    /// visited in registration order within a pass, but no rule outcome may
    /// depend on that order. A cancelled instance is not revisited within
    /// the same pass.
    pub fn reevaluate(&mut self, state: &mut GameState) -> Result<u32, EngineError> {
        let bound = state.config.max_fixed_point_passes;

        for pass in 1..=bound {
            let mut changed = false;

            for idx in 0..self.instances.len() {
                if !self.instances[idx].is_active() {
                    continue;
                }
                match self.instances[idx].check_condition(state) {
                    Ok(instance_changed) => changed |= instance_changed,
                    Err(fault) => {
                        self.contain_fault(idx, fault, state);
                        changed = true;
                    }
                }
            }

            if !changed {
                return Ok(pass);
            }
        }

        tracing::error!(
            passes = bound,
            "fixed-point re-evaluation exceeded its pass bound"
        );
        Err(EngineError::FixedPointDiverged { passes: bound })
    }

    /// Cancels an instance. Idempotent: cancelling a cancelled instance is a
    /// no-op.
    pub fn cancel(&mut self, id: EffectId, state: &mut GameState) {
        if let Some(idx) = self.index_of(id) {
            if let Err(fault) = self.instances[idx].cancel(state) {
                tracing::warn!(effect = %id, error = %fault, "fault while unapplying cancelled effect");
            }
        }
    }

    /// Cancels every instance whose duration lapses at the given boundary
    /// and returns how many lapsed.
    pub fn expire_at(&mut self, boundary: Duration, state: &mut GameState) -> usize {
        let mut lapsed = 0;
        for idx in 0..self.instances.len() {
            let instance = &self.instances[idx];
            if instance.is_active() && instance.duration().lapses_at(boundary) {
                if let Err(fault) = self.instances[idx].cancel(state) {
                    let id = self.instances[idx].id();
                    tracing::warn!(effect = %id, error = %fault, "fault while expiring effect");
                }
                lapsed += 1;
            }
        }
        lapsed
    }

    /// True while an active effect forces the current conflict unopposed.
    pub fn has_force_unopposed(&self) -> bool {
        self.instances
            .iter()
            .any(|i| i.is_active() && matches!(i.kind(), EffectKind::ForceUnopposed))
    }

    /// Active on-resolution bodies, in registration order.
    pub fn resolution_actions(&self) -> Vec<(EffectId, ResolutionAction)> {
        self.instances
            .iter()
            .filter(|i| i.is_active())
            .filter_map(|i| match i.kind() {
                EffectKind::OnResolution(action) => Some((i.id(), *action)),
                _ => None,
            })
            .collect()
    }

    pub fn instance(&self, id: EffectId) -> Option<&EffectInstance> {
        self.instances.iter().find(|i| i.id() == id)
    }

    pub fn is_active(&self, id: EffectId) -> bool {
        self.instance(id).is_some_and(|i| i.is_active())
    }

    /// Number of registered instances, cancelled ones included.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Drops cancelled instances, typically at a phase boundary.
    ///
    /// Ids stay unique afterwards: the id counter never rewinds, so a
    /// pruned id simply stops resolving. Returns how many were dropped.
    pub fn prune_cancelled(&mut self) -> usize {
        let before = self.instances.len();
        self.instances.retain(|i| i.is_active());
        before - self.instances.len()
    }

    fn index_of(&self, id: EffectId) -> Option<usize> {
        self.instances.iter().position(|i| i.id() == id)
    }

    /// Suppression check for same-group effects (§ binary restrictions and
    /// absolute sets): the new instance must outlast every same-group
    /// instance already carried by each of its would-be targets.
    fn is_suppressed(&self, instance: &EffectInstance, state: &GameState) -> bool {
        let Some(group) = instance.kind().suppression_group() else {
            return false;
        };
        if instance.is_conditional() {
            return false;
        }

        let candidates = instance.potential_targets(state);
        if candidates.is_empty() {
            return false;
        }

        candidates.iter().any(|target| {
            self.instances.iter().any(|existing| {
                existing.is_active()
                    && existing.kind().suppression_group() == Some(group)
                    && existing.has_target(*target)
                    && existing.duration().rank() >= instance.duration().rank()
            })
        })
    }

    /// Catches a body fault at the engine boundary: log, cancel the
    /// offending instance, keep the pass intact.
    fn contain_fault(&mut self, idx: usize, fault: EffectError, state: &mut GameState) {
        let id = self.instances[idx].id();
        tracing::warn!(effect = %id, error = %fault, "effect body fault, cancelling instance");
        if let Err(secondary) = self.instances[idx].cancel(state) {
            tracing::warn!(effect = %id, error = %secondary, "fault while unwinding cancelled effect");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Amount, ControllerFilter, InstanceState, Restriction};
    use crate::skills::{SkillAxis, SkillCalculator};
    use crate::state::{CardKind, CardState, EntityId, Location, PlayerId, PrintedStats};

    fn in_play(state: &mut GameState, name: &str, military: i32, glory: i32) -> EntityId {
        state.add_card(
            CardState::new(
                name,
                CardKind::Character,
                PlayerId::One,
                PrintedStats::character(Some(military), Some(1), glory),
            )
            .in_location(Location::PlayArea),
        )
    }

    fn plus_military(source: EntityId, amount: i32, duration: Duration) -> EffectInstance {
        EffectInstance::new(
            source,
            EffectKind::ModifySkill {
                axis: SkillAxis::Military,
                amount: Amount::Fixed(amount),
                priority: 0,
            },
            duration,
        )
    }

    #[test]
    fn registered_effect_applies_to_matching_targets() {
        let mut state = GameState::default();
        let source = in_play(&mut state, "Banner", 1, 0);
        let ally = in_play(&mut state, "Ally", 2, 0);

        let mut engine = EffectEngine::new();
        engine.register(
            plus_military(source, 2, Duration::Persistent).controlled_by(ControllerFilter::Own),
            &mut state,
        );
        engine.reevaluate(&mut state).unwrap();

        let calc = SkillCalculator::new(&state);
        assert_eq!(calc.military_skill(ally), Some(4));
        assert_eq!(calc.military_skill(source), Some(3));
    }

    #[test]
    fn target_set_is_subset_of_potential_targets_after_check() {
        let mut state = GameState::default();
        let source = in_play(&mut state, "Banner", 1, 0);
        let ally = in_play(&mut state, "Ally", 2, 0);

        let mut engine = EffectEngine::new();
        let id = engine.register(plus_military(source, 1, Duration::Persistent), &mut state);
        engine.reevaluate(&mut state).unwrap();
        assert!(engine.instance(id).unwrap().has_target(ally));

        // The ally leaves play; the next pass must drop it.
        state.card_mut(ally).unwrap().location = Location::DiscardPile;
        engine.reevaluate(&mut state).unwrap();

        let instance = engine.instance(id).unwrap();
        let potential = instance.potential_targets(&state);
        assert!(instance.targets().iter().all(|t| potential.contains(t)));
        assert!(!instance.has_target(ally));
        assert!(
            state
                .card(ally)
                .unwrap()
                .modifiers_for(SkillAxis::Military)
                .next()
                .is_none()
        );
    }

    #[test]
    fn persistent_effect_cancels_when_source_leaves_play() {
        let mut state = GameState::default();
        let source = in_play(&mut state, "Banner", 1, 0);
        let ally = in_play(&mut state, "Ally", 2, 0);

        let mut engine = EffectEngine::new();
        let id = engine.register(plus_military(source, 2, Duration::Persistent), &mut state);
        engine.reevaluate(&mut state).unwrap();
        assert_eq!(SkillCalculator::new(&state).military_skill(ally), Some(4));

        state.card_mut(source).unwrap().location = Location::DiscardPile;
        engine.reevaluate(&mut state).unwrap();

        assert!(!engine.is_active(id));
        assert_eq!(SkillCalculator::new(&state).military_skill(ally), Some(2));
    }

    #[test]
    fn duration_scoped_effect_survives_source_leaving() {
        let mut state = GameState::default();
        let source = in_play(&mut state, "Event", 1, 0);
        let ally = in_play(&mut state, "Ally", 2, 0);

        let mut engine = EffectEngine::new();
        let id = engine.register(plus_military(source, 2, Duration::EndOfPhase), &mut state);
        engine.reevaluate(&mut state).unwrap();

        state.card_mut(source).unwrap().location = Location::DiscardPile;
        engine.reevaluate(&mut state).unwrap();
        assert!(engine.is_active(id));

        engine.expire_at(Duration::EndOfPhase, &mut state);
        assert!(!engine.is_active(id));
        assert_eq!(SkillCalculator::new(&state).military_skill(ally), Some(2));
    }

    #[test]
    fn glory_linked_amount_ripples_across_passes() {
        let mut state = GameState::default();
        let source = in_play(&mut state, "Paragon", 2, 1);

        let mut engine = EffectEngine::new();
        // Military bonus equal to effective glory.
        engine.register(
            EffectInstance::new(
                source,
                EffectKind::ModifySkill {
                    axis: SkillAxis::Military,
                    amount: Amount::TargetGlory,
                    priority: 0,
                },
                Duration::Persistent,
            ),
            &mut state,
        );
        engine.reevaluate(&mut state).unwrap();
        assert_eq!(SkillCalculator::new(&state).military_skill(source), Some(3));

        // A glory boost must ripple into the military amount on re-evaluation.
        engine.register(
            EffectInstance::new(
                source,
                EffectKind::ModifySkill {
                    axis: SkillAxis::Glory,
                    amount: Amount::Fixed(2),
                    priority: 0,
                },
                Duration::Persistent,
            ),
            &mut state,
        );
        engine.reevaluate(&mut state).unwrap();
        assert_eq!(SkillCalculator::new(&state).military_skill(source), Some(5));
    }

    #[test]
    fn shorter_same_kind_restriction_is_suppressed() {
        let mut state = GameState::default();
        let source = in_play(&mut state, "Edict", 1, 0);
        let victim = in_play(&mut state, "Victim", 2, 0);

        let mut engine = EffectEngine::new();
        let persistent = engine.register(
            EffectInstance::new(
                source,
                EffectKind::Restrict(Restriction::CannotAttack),
                Duration::Persistent,
            ),
            &mut state,
        );
        engine.reevaluate(&mut state).unwrap();
        assert!(engine.instance(persistent).unwrap().has_target(victim));

        // A phase-scoped duplicate cannot displace the persistent one.
        let phase = engine.register(
            EffectInstance::new(
                source,
                EffectKind::Restrict(Restriction::CannotAttack),
                Duration::EndOfPhase,
            ),
            &mut state,
        );
        assert!(!engine.is_active(phase));
        assert_eq!(
            engine.instance(phase).unwrap().lifecycle(),
            InstanceState::Cancelled
        );
    }

    #[test]
    fn conditional_effect_bypasses_suppression() {
        let mut state = GameState::default();
        let source = in_play(&mut state, "Edict", 1, 0);
        let _victim = in_play(&mut state, "Victim", 2, 0);

        let mut engine = EffectEngine::new();
        engine.register(
            EffectInstance::new(
                source,
                EffectKind::Restrict(Restriction::CannotAttack),
                Duration::Persistent,
            ),
            &mut state,
        );
        engine.reevaluate(&mut state).unwrap();

        let conditional = engine.register(
            EffectInstance::new(
                source,
                EffectKind::Restrict(Restriction::CannotAttack),
                Duration::EndOfConflict,
            )
            .conditional(),
            &mut state,
        );
        assert!(engine.is_active(conditional));
    }

    #[test]
    fn cancelling_twice_is_a_no_op() {
        let mut state = GameState::default();
        let source = in_play(&mut state, "Banner", 1, 0);

        let mut engine = EffectEngine::new();
        let id = engine.register(plus_military(source, 1, Duration::Persistent), &mut state);
        engine.cancel(id, &mut state);
        engine.cancel(id, &mut state);
        assert!(!engine.is_active(id));
    }

    #[test]
    fn body_fault_cancels_only_the_offending_instance() {
        let mut state = GameState::default();
        let soldier = in_play(&mut state, "Soldier", 2, 0);
        let courtier = state.add_card(
            CardState::new(
                "Courtier",
                CardKind::Character,
                PlayerId::One,
                PrintedStats::character(None, Some(2), 0),
            )
            .in_location(Location::PlayArea),
        );

        let mut engine = EffectEngine::new();
        let healthy = engine.register(plus_military(soldier, 2, Duration::Persistent), &mut state);
        // An explicitly chosen target with a printed military dash: the
        // body faults at apply time.
        let faulty = engine.register(
            plus_military(soldier, 1, Duration::Persistent).with_targets(vec![courtier]),
            &mut state,
        );
        engine.reevaluate(&mut state).unwrap();

        assert_eq!(
            engine.instance(faulty).unwrap().lifecycle(),
            InstanceState::Cancelled
        );
        assert!(engine.is_active(healthy));
        assert_eq!(SkillCalculator::new(&state).military_skill(soldier), Some(4));
    }

    #[test]
    fn chosen_target_leaving_the_arena_faults_the_instance() {
        let mut state = GameState::default();
        let source = in_play(&mut state, "Banner", 1, 0);
        let victim = in_play(&mut state, "Victim", 2, 0);

        let mut engine = EffectEngine::new();
        let id = engine.register(
            plus_military(source, 1, Duration::Persistent).with_targets(vec![victim]),
            &mut state,
        );
        engine.reevaluate(&mut state).unwrap();
        assert!(engine.is_active(id));

        state.entities.remove(victim);
        engine.reevaluate(&mut state).unwrap();
        assert!(!engine.is_active(id));
    }

    #[test]
    fn pruning_drops_cancelled_instances_and_keeps_ids_unique() {
        let mut state = GameState::default();
        let source = in_play(&mut state, "Banner", 1, 0);

        let mut engine = EffectEngine::new();
        let a = engine.register(plus_military(source, 1, Duration::EndOfPhase), &mut state);
        engine.expire_at(Duration::EndOfPhase, &mut state);

        assert_eq!(engine.prune_cancelled(), 1);
        assert!(engine.instance(a).is_none());

        let b = engine.register(plus_military(source, 1, Duration::EndOfPhase), &mut state);
        assert_ne!(a, b);
    }

    #[test]
    fn divergent_effects_hit_the_pass_bound() {
        let mut state = GameState::default();
        state.config.max_fixed_point_passes = 5;
        let source = in_play(&mut state, "Oscillator", 2, 0);

        let mut engine = EffectEngine::new();
        // Active only while the target set is empty: acquiring its target
        // flips the condition, dropping it re-arms the condition. Never
        // converges.
        engine.register(
            EffectInstance::new(
                source,
                EffectKind::ModifySkill {
                    axis: SkillAxis::Military,
                    amount: Amount::Fixed(1),
                    priority: 0,
                },
                Duration::EndOfPhase,
            )
            .matching(move |card, state| {
                card.id == source
                    && state
                        .card(source)
                        .is_some_and(|c| c.modifiers_for(SkillAxis::Military).next().is_none())
            }),
            &mut state,
        );

        assert_eq!(
            engine.reevaluate(&mut state),
            Err(EngineError::FixedPointDiverged { passes: 5 })
        );
    }
}
