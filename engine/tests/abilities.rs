mod common;

use common::*;
use engine::{AbilityDef, AbilityKind, ActorId, AlarmState, CommandOutcome, Detection, GridPos, RejectReason, SimEvent};

fn flash() -> AbilityDef {
    AbilityDef {
        id: "flash".into(),
        name: "Quick Flash".into(),
        kind: AbilityKind::Flashbang {
            radius: 1.5,
            stun_ticks: 40,
        },
        range: 6.0,
        delay_ticks: 1,
        cooldown_ticks: 0,
        charges: 1,
    }
}

#[test]
fn stunned_enemies_see_nothing() {
    let mut vasquez = crew_at("Vasquez", 1, 2);
    vasquez.abilities = vec!["flash".into()];
    let mut spec = spec(open_room(), vec![vasquez], vec![enemy_at("guard", 5, 2)]);
    spec.definitions = extra_definitions(Vec::new(), vec![flash()]);

    let mut mission = mission(&spec, 12);
    assert!(mission.use_ability(ActorId(0), "flash", GridPos::new(5, 2)).is_accepted());
    assert_eq!(
        mission.use_ability(ActorId(0), "flash", GridPos::new(5, 2)),
        CommandOutcome::Rejected(RejectReason::NoCharges)
    );

    for _ in 0..20 {
        mission.tick();
    }
    let guard = mission.actor(ActorId(1)).expect("guard");
    assert!(guard.is_stunned());
    assert_eq!(mission.perception(ActorId(1)).expect("perception").state, Detection::Idle);
    assert_eq!(mission.alarm(), AlarmState::Quiet);
}

#[test]
fn stun_wears_off_and_the_enemy_notices() {
    let mut vasquez = crew_at("Vasquez", 1, 2);
    vasquez.abilities = vec!["flash".into()];
    let mut spec = spec(open_room(), vec![vasquez], vec![enemy_at("guard", 5, 2)]);
    spec.definitions = extra_definitions(Vec::new(), vec![flash()]);

    let mut mission = mission(&spec, 12);
    assert!(mission.use_ability(ActorId(0), "flash", GridPos::new(5, 2)).is_accepted());
    for _ in 0..45 {
        mission.tick();
    }
    assert!(!mission.actor(ActorId(1)).expect("guard").is_stunned());
    assert_eq!(mission.perception(ActorId(1)).expect("perception").state, Detection::Alerted);
    assert_eq!(mission.alarm(), AlarmState::Alerted);
}

#[test]
fn medkit_heals_the_occupant_up_to_max() {
    let mut hicks = crew_at("Hicks", 2, 2);
    hicks.hp = Some(2);
    let mut medic = crew_at("Dietrich", 3, 2);
    medic.abilities = vec!["medkit".into()];
    let mut spec = spec(open_room(), vec![hicks, medic], vec![enemy_at("sleeper", 9, 3)]);
    spec.definitions = extra_definitions(vec![trooper("sleeper", 20, 0.5)], Vec::new());

    let mut mission = mission(&spec, 21);
    let events = record(&mut mission);
    assert!(mission.use_ability(ActorId(1), "medkit", GridPos::new(2, 2)).is_accepted());
    assert_eq!(
        mission.use_ability(ActorId(1), "medkit", GridPos::new(2, 2)),
        CommandOutcome::Rejected(RejectReason::OnCooldown)
    );

    mission.tick();
    assert_eq!(mission.actor(ActorId(0)).expect("hicks").hp, 8);
    assert!(events.borrow().iter().any(|event| matches!(
        event,
        SimEvent::AbilityResolved { affected, .. } if affected == &vec![ActorId(0)]
    )));

    assert_eq!(
        mission.use_ability(ActorId(1), "medkit", GridPos::new(6, 2)),
        CommandOutcome::Rejected(RejectReason::OnCooldown)
    );
}

#[test]
fn ability_targets_need_range_and_sight() {
    let map = template(&[
        "###########", //
        "#E...#....#", //
        "#E...#....#", //
        "#E........#", //
        "###########",
    ]);
    let mut hudson = crew_at("Hudson", 3, 1);
    hudson.abilities = vec!["frag".into(), "medkit".into()];
    let mut spec = spec(map, vec![hudson], vec![enemy_at("sleeper", 9, 3)]);
    spec.definitions = extra_definitions(vec![trooper("sleeper", 20, 0.5)], Vec::new());
    let mut mission = mission(&spec, 2);

    assert_eq!(
        mission.use_ability(ActorId(0), "medkit", GridPos::new(6, 1)),
        CommandOutcome::Rejected(RejectReason::OutOfRange)
    );
    assert_eq!(
        mission.use_ability(ActorId(0), "frag", GridPos::new(7, 1)),
        CommandOutcome::Rejected(RejectReason::NoLineOfSight)
    );
    assert_eq!(
        mission.use_ability(ActorId(0), "frag", GridPos::new(30, 1)),
        CommandOutcome::Rejected(RejectReason::OutOfBounds)
    );
    assert_eq!(
        mission.use_ability(ActorId(0), "flashbang", GridPos::new(4, 2)),
        CommandOutcome::Rejected(RejectReason::UnknownAbility)
    );
    assert!(mission.use_ability(ActorId(0), "frag", GridPos::new(4, 3)).is_accepted());
    let pending = mission.pending_abilities();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].resolve_tick, 20);
}

#[test]
fn grenades_from_the_fallen_still_go_off() {
    let mut ripley = crew_at("Ripley", 2, 2);
    ripley.hp = Some(1);
    ripley.abilities = vec!["frag".into(), "pop".into()];
    let mut spec = spec(
        open_room(),
        vec![ripley, crew_at("Hicks", 1, 1)],
        vec![enemy_at("sleeper", 7, 2)],
    );
    spec.definitions = extra_definitions(vec![trooper("sleeper", 5, 0.5)], vec![quick_grenade()]);

    let mut mission = mission(&spec, 2);
    let events = record(&mut mission);
    assert!(mission.use_ability(ActorId(0), "frag", GridPos::new(7, 2)).is_accepted());
    assert!(mission.use_ability(ActorId(0), "pop", GridPos::new(3, 2)).is_accepted());

    mission.tick();
    assert!(!mission.actor(ActorId(0)).expect("ripley").alive);
    assert!(mission.actor(ActorId(2)).expect("sleeper").alive);

    let summary = mission.run_to_completion(100);
    assert!(summary.victory);
    assert_eq!(summary.ticks, 20);
    assert_eq!(summary.actors[0].kills, 1);
    assert!(events.borrow().iter().any(|event| matches!(
        event,
        SimEvent::ActorDied {
            actor: ActorId(2),
            killer: Some(ActorId(0))
        }
    )));
}
