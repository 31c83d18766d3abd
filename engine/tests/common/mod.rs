#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use engine::mission::{CrewSpawn, EnemySpawn, InteractableSpawn, MapSource};
use engine::{
    AbilityDef, AbilityKind, ActorStats, DefinitionSet, EnemyDef, GridPos, Mission, MissionSpec, Objective, SimConfig,
    SimEvent, UnitKind,
};

pub fn template(rows: &[&str]) -> MapSource {
    MapSource::Template {
        rows: rows.iter().map(|row| (*row).to_string()).collect(),
    }
}

// Open 11x5 room with three entry tiles on the left
pub fn open_room() -> MapSource {
    template(&[
        "###########", //
        "#E........#", //
        "#E........#", //
        "#E........#", //
        "###########",
    ])
}

pub fn crew_at(name: &str, x: i32, y: i32) -> CrewSpawn {
    CrewSpawn {
        name: name.into(),
        pos: Some(GridPos::new(x, y)),
        stats: ActorStats::default(),
        hp: None,
        weapon: "rifle".into(),
        abilities: Vec::new(),
    }
}

pub fn enemy_at(definition: &str, x: i32, y: i32) -> EnemySpawn {
    EnemySpawn {
        definition: definition.into(),
        pos: Some(GridPos::new(x, y)),
        name: None,
    }
}

// Every shot lands
pub fn sure_hits() -> SimConfig {
    SimConfig {
        min_hit_chance: 1.0,
        max_hit_chance: 1.0,
        ..SimConfig::default()
    }
}

// Every shot misses
pub fn no_hits() -> SimConfig {
    SimConfig {
        min_hit_chance: 0.0,
        max_hit_chance: 0.0,
        ..SimConfig::default()
    }
}

pub fn spec(map: MapSource, crew: Vec<CrewSpawn>, enemies: Vec<EnemySpawn>) -> MissionSpec {
    MissionSpec {
        name: "scenario".into(),
        map,
        crew,
        enemies,
        interactables: Vec::<InteractableSpawn>::new(),
        objective: Objective::EliminateAll,
        time_limit_ticks: None,
        config: SimConfig::default(),
        definitions: None,
    }
}

pub fn trooper(id: &str, max_hp: i32, vision: f32) -> EnemyDef {
    EnemyDef {
        id: id.into(),
        name: id.into(),
        kind: UnitKind::Trooper,
        stats: ActorStats {
            max_hp,
            vision,
            ..ActorStats::default()
        },
        weapon: "rifle".into(),
    }
}

// A grenade that goes off on the next tick
pub fn quick_grenade() -> AbilityDef {
    AbilityDef {
        id: "pop".into(),
        name: "Pop Charge".into(),
        kind: AbilityKind::Grenade { radius: 1.5, damage: 5 },
        range: 4.0,
        delay_ticks: 1,
        cooldown_ticks: 0,
        charges: 1,
    }
}

pub fn extra_definitions(enemies: Vec<EnemyDef>, abilities: Vec<AbilityDef>) -> Option<DefinitionSet> {
    Some(DefinitionSet {
        weapons: Vec::new(),
        enemies,
        abilities,
    })
}

pub fn mission(spec: &MissionSpec, seed: u64) -> Mission {
    Mission::new(spec, seed).expect("valid mission")
}

// Collects every published event for later inspection
pub fn record(mission: &mut Mission) -> Rc<RefCell<Vec<SimEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    mission.subscribe(move |event| {
        sink.borrow_mut().push(event.clone());
        Ok(())
    });
    log
}

pub fn assert_no_shared_tiles(mission: &Mission) {
    let mut seen = std::collections::BTreeSet::new();
    for actor in mission.actors().iter().filter(|actor| actor.alive) {
        assert!(
            seen.insert(actor.pos),
            "tick {}: two live actors share {}",
            mission.tick_count(),
            actor.pos
        );
    }
}
