//! End-to-end conflict resolution scenarios against the full stack:
//! entity arena, effect engine, skill calculation, and the resolver
//! pipeline.

use rules_core::{
    Amount, CardKind, CardState, Conflict, ConflictResolver, ConflictSide, ConflictType, Duration,
    EffectEngine, EffectInstance, EffectKind, Element, EntityId, EventQueue, GameState, Location,
    PlayerId, PrintedStats, ResolutionAction, ResolutionStage, ResolverError, Restriction,
    SideModifier, SkillAxis, SkillCalculator,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("rules_core=debug")
        .with_test_writer()
        .try_init();
}

fn setup() -> (GameState, EffectEngine, EventQueue) {
    init_tracing();
    (GameState::default(), EffectEngine::new(), EventQueue::new())
}

fn character(
    state: &mut GameState,
    name: &str,
    controller: PlayerId,
    military: i32,
    political: i32,
) -> EntityId {
    state.add_card(
        CardState::new(
            name,
            CardKind::Character,
            controller,
            PrintedStats::character(Some(military), Some(political), 0),
        )
        .in_location(Location::PlayArea),
    )
}

fn military_conflict(state: &mut GameState, attackers: Vec<EntityId>, defenders: Vec<EntityId>) {
    let conflict = Conflict::declare(PlayerId::One, ConflictType::Military, Element::Fire, attackers)
        .with_defenders(defenders);
    state.declare_conflict(conflict);
}

#[test]
fn scenario_a_unopposed_attack_with_player_bonus() {
    let (mut state, mut engine, mut events) = setup();
    let a1 = character(&mut state, "Vanguard", PlayerId::One, 2, 1);
    let a2 = character(&mut state, "Berserker", PlayerId::One, 3, 1);

    let conflict =
        Conflict::declare(PlayerId::One, ConflictType::Military, Element::Fire, vec![a1, a2])
            .with_side_modifier(SideModifier {
                affects: ConflictSide::Attacker,
                amount: 1,
                name: "war banner".into(),
                source: a1,
            });
    state.declare_conflict(conflict);

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let result = resolver.resolve().unwrap();

    assert_eq!(result.attacker_skill, 6);
    assert_eq!(result.defender_skill, 0);
    assert_eq!(result.winner, Some(PlayerId::One));
    assert_eq!(result.skill_difference, 6);
    assert!(result.is_unopposed);
    assert!(!result.is_tie);
    assert!(result.resolution_complete);
}

#[test]
fn scenario_b_equal_skills_is_a_tie() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Duelist", PlayerId::One, 4, 1);
    let defender = character(&mut state, "Sentinel", PlayerId::Two, 4, 1);
    military_conflict(&mut state, vec![attacker], vec![defender]);

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let result = resolver.resolve().unwrap();

    assert_eq!(result.winner, None);
    assert_eq!(result.loser, None);
    assert_eq!(result.skill_difference, 0);
    assert!(result.is_tie);
    assert!(!result.is_unopposed);
}

#[test]
fn zero_zero_with_no_defenders_is_not_unopposed() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Pacifist", PlayerId::One, 0, 1);
    military_conflict(&mut state, vec![attacker], vec![]);

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let result = resolver.resolve().unwrap();

    assert_eq!(result.attacker_skill, 0);
    assert_eq!(result.defender_skill, 0);
    assert!(result.is_tie);
    // The attacker did not win, so an empty defense is not unopposed.
    assert!(!result.is_unopposed);
}

#[test]
fn resolving_twice_returns_the_cached_result() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Vanguard", PlayerId::One, 3, 1);
    military_conflict(&mut state, vec![attacker], vec![]);

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let first = resolver.resolve().unwrap();
    let second = resolver.resolve().unwrap();

    assert_eq!(first, second);
}

#[test]
fn unopposed_defender_loses_honor_once() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Raider", PlayerId::One, 2, 1);
    military_conflict(&mut state, vec![attacker], vec![]);
    let honor_before = state.players.get(PlayerId::Two).honor;

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let result = resolver.resolve().unwrap();
    assert!(result.is_unopposed);
    // A second resolve must not deduct again.
    resolver.resolve().unwrap();

    assert_eq!(state.players.get(PlayerId::Two).honor, honor_before - 1);
}

#[test]
fn scenario_c_set_override_then_reverts_when_conflict_ends() {
    let (mut state, mut engine, mut events) = setup();
    let samurai = character(&mut state, "Veteran", PlayerId::One, 2, 1);

    // Persistent +1 military from the character's own ability.
    engine.register(
        EffectInstance::new(
            samurai,
            EffectKind::ModifySkill {
                axis: SkillAxis::Military,
                amount: Amount::Fixed(1),
                priority: 0,
            },
            Duration::Persistent,
        )
        .matching(move |card, _| card.id == samurai),
        &mut state,
    );
    engine.reevaluate(&mut state).unwrap();
    assert_eq!(SkillCalculator::new(&state).military_skill(samurai), Some(3));

    // A later "set military to 0" override for the conflict's duration.
    engine.register(
        EffectInstance::new(
            samurai,
            EffectKind::SetSkill {
                axis: SkillAxis::Military,
                value: 0,
            },
            Duration::EndOfConflict,
        )
        .matching(move |card, _| card.id == samurai),
        &mut state,
    );
    engine.reevaluate(&mut state).unwrap();
    assert_eq!(SkillCalculator::new(&state).military_skill(samurai), Some(0));

    military_conflict(&mut state, vec![samurai], vec![]);
    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let result = resolver.resolve().unwrap();
    assert_eq!(result.attacker_skill, 0);

    // The conflict ends; the override's instance lapses and the printed
    // value plus the persistent bonus returns.
    engine.expire_at(Duration::EndOfConflict, &mut state);
    engine.reevaluate(&mut state).unwrap();
    assert_eq!(SkillCalculator::new(&state).military_skill(samurai), Some(3));
}

#[test]
fn scenario_d_restriction_outlives_the_removed_longer_instance() {
    let (mut state, mut engine, _events) = setup();
    let edict = character(&mut state, "Edict", PlayerId::Two, 1, 1);
    let target = character(&mut state, "Hothead", PlayerId::One, 3, 1);

    let restrict = |duration| {
        EffectInstance::new(edict, EffectKind::Restrict(Restriction::CannotAttack), duration)
            .matching(move |card, _| card.id == target)
    };

    // Phase-scoped restriction lands first; the persistent one is longer,
    // so it is not suppressed and carries its own marker.
    let phase_scoped = engine.register(restrict(Duration::EndOfPhase), &mut state);
    let persistent = engine.register(restrict(Duration::Persistent), &mut state);
    engine.reevaluate(&mut state).unwrap();
    assert!(engine.is_active(phase_scoped));
    assert!(engine.is_active(persistent));
    assert!(state.card(target).unwrap().is_restricted(Restriction::CannotAttack));

    // Removing the persistent instance leaves the restriction in force
    // while the phase-scoped one has not lapsed.
    engine.cancel(persistent, &mut state);
    assert!(state.card(target).unwrap().is_restricted(Restriction::CannotAttack));

    engine.expire_at(Duration::EndOfPhase, &mut state);
    assert!(!state.card(target).unwrap().is_restricted(Restriction::CannotAttack));
}

#[test]
fn forced_unopposed_effect_overrides_a_defended_conflict() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Raider", PlayerId::One, 5, 1);
    let defender = character(&mut state, "Sentinel", PlayerId::Two, 1, 1);
    military_conflict(&mut state, vec![attacker], vec![defender]);

    engine.register(
        EffectInstance::new(attacker, EffectKind::ForceUnopposed, Duration::EndOfConflict),
        &mut state,
    );

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let result = resolver.resolve().unwrap();
    assert!(result.is_unopposed);
}

#[test]
fn resolution_actions_run_exactly_once() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Champion", PlayerId::One, 4, 1);
    military_conflict(&mut state, vec![attacker], vec![]);

    engine.register(
        EffectInstance::new(
            attacker,
            EffectKind::OnResolution(ResolutionAction::LoserLosesHonor(2)),
            Duration::EndOfConflict,
        ),
        &mut state,
    );
    engine.register(
        EffectInstance::new(
            attacker,
            EffectKind::OnResolution(ResolutionAction::ClaimRing),
            Duration::EndOfConflict,
        ),
        &mut state,
    );

    let honor_before = state.players.get(PlayerId::Two).honor;
    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    resolver.resolve().unwrap();
    resolver.resolve().unwrap();

    // 2 from the resolution body, 1 from the unopposed rule.
    assert_eq!(state.players.get(PlayerId::Two).honor, honor_before - 3);
    assert_eq!(state.ring(Element::Fire).claimed_by, Some(PlayerId::One));
    assert!(!state.ring(Element::Fire).contested);
}

#[test]
fn resolved_conflict_is_closed_to_pipeline_steps() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Raider", PlayerId::One, 5, 1);
    let defender = character(&mut state, "Sentinel", PlayerId::Two, 1, 1);
    military_conflict(&mut state, vec![attacker], vec![defender]);

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    resolver.resolve().unwrap();

    // A fresh resolver over the resolved conflict cannot rerun steps 1-3.
    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    assert!(matches!(
        resolver.calculate_skills(),
        Err(ResolverError::AlreadyResolved { .. })
    ));
    assert!(matches!(
        resolver.determine_winner(),
        Err(ResolverError::AlreadyResolved { .. })
    ));
    assert!(matches!(
        resolver.check_unopposed(),
        Err(ResolverError::AlreadyResolved { .. })
    ));

    // The cached outcome and the terminal stage are untouched.
    let again = resolver.resolve().unwrap();
    assert_eq!(again.winner, Some(PlayerId::One));
    assert_eq!(
        state.current_conflict.as_ref().map(|c| c.stage()),
        Some(ResolutionStage::Resolved)
    );
}

#[test]
fn manual_override_forces_the_loser_to_win() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Raider", PlayerId::One, 5, 1);
    let defender = character(&mut state, "Sentinel", PlayerId::Two, 1, 1);
    military_conflict(&mut state, vec![attacker], vec![defender]);

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let natural = resolver.resolve().unwrap();
    assert_eq!(natural.winner, Some(PlayerId::One));

    let forced = resolver.force_winner(PlayerId::Two).unwrap();
    assert_eq!(forced.winner, Some(PlayerId::Two));
    assert_eq!(forced.loser, Some(PlayerId::One));
    // Difference still comes from the known skills.
    assert_eq!(forced.skill_difference, 4);
    assert!(forced.resolution_complete);
}

#[test]
fn attacked_province_breaks_when_the_margin_reaches_its_strength() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Siegemaster", PlayerId::One, 6, 1);
    let province = state.add_card(CardState::new(
        "Borderlands",
        CardKind::Province,
        PlayerId::Two,
        PrintedStats::province(4),
    ));

    let conflict =
        Conflict::declare(PlayerId::One, ConflictType::Military, Element::Earth, vec![attacker])
            .with_province(province);
    state.declare_conflict(conflict);

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let result = resolver.resolve().unwrap();

    assert_eq!(result.skill_difference, 6);
    assert!(result.province_broken);
    assert!(state.card(province).unwrap().broken);
}

#[test]
fn dash_characters_contribute_nothing_to_the_sum() {
    let (mut state, mut engine, mut events) = setup();
    let bureaucrat = state.add_card(
        CardState::new(
            "Bureaucrat",
            CardKind::Character,
            PlayerId::One,
            PrintedStats::character(None, Some(3), 1),
        )
        .in_location(Location::PlayArea),
    );
    let soldier = character(&mut state, "Soldier", PlayerId::One, 2, 1);
    military_conflict(&mut state, vec![bureaucrat, soldier], vec![]);

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let result = resolver.resolve().unwrap();
    assert_eq!(result.attacker_skill, 2);
}

#[test]
fn negative_side_modifiers_floor_each_side_independently() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Skirmisher", PlayerId::One, 1, 1);
    let defender = character(&mut state, "Sentinel", PlayerId::Two, 2, 1);

    let conflict =
        Conflict::declare(PlayerId::One, ConflictType::Military, Element::Air, vec![attacker])
            .with_defenders(vec![defender])
            .with_side_modifier(SideModifier {
                affects: ConflictSide::Attacker,
                amount: -5,
                name: "rout".into(),
                source: defender,
            });
    state.declare_conflict(conflict);

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    let result = resolver.resolve().unwrap();

    assert_eq!(result.attacker_skill, 0);
    assert_eq!(result.defender_skill, 2);
    assert_eq!(result.winner, Some(PlayerId::Two));
}

#[test]
fn resolver_construction_fails_without_a_declared_conflict() {
    let (mut state, mut engine, mut events) = setup();
    let err = ConflictResolver::new(&mut state, &mut engine, &mut events).err();
    assert_eq!(err, Some(ResolverError::NoActiveConflict));
}

#[test]
fn resolution_publishes_a_causal_event() {
    let (mut state, mut engine, mut events) = setup();
    let attacker = character(&mut state, "Herald", PlayerId::One, 2, 1);
    military_conflict(&mut state, vec![attacker], vec![]);

    let mut resolver = ConflictResolver::new(&mut state, &mut engine, &mut events).unwrap();
    resolver.resolve().unwrap();

    assert_eq!(events.pending(), 1);
    assert_eq!(events.resolve_pending(&mut state), 1);
}
