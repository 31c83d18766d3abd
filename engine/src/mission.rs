use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::actor::{Actor, ActorStats, Controller, UnitKind};
use crate::config::SimConfig;
use crate::definitions::{DefinitionError, DefinitionSet, Definitions};
use crate::interactables::{
    DoorConfig, DoorState, HazardConfig, HazardState, Interactable, InteractableKind, TerminalConfig, TerminalState,
};
use crate::map::template::TemplateFeature;
use crate::map::{GameMap, MapBuild, generate_map, parse_template};
use crate::types::{ActorId, GridPos, InteractableId};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("map template is empty")]
    EmptyMap,
    #[error("unknown map glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
    #[error("mission has no crew")]
    NoCrew,
    #[error("{name} cannot spawn at {pos}: tile is not walkable")]
    InvalidSpawn { name: String, pos: GridPos },
    #[error("{name} cannot spawn at {pos}: tile already occupied")]
    OccupiedSpawn { name: String, pos: GridPos },
    #[error("no free tile left to place {name}")]
    NoSpawnRoom { name: String },
    #[error("interactable at {pos} must sit on an empty floor tile")]
    InvalidInteractable { pos: GridPos },
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[cfg(feature = "json")]
    #[error("failed to parse mission: {0}")]
    Parse(#[from] serde_json::Error),
}

// ============================================================================
// Mission Input
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum MapSource {
    Template { rows: Vec<String> },
    Procedural { width: i32, height: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewSpawn {
    pub name: String,
    // Entry-zone tiles are handed out in order when omitted
    #[serde(default)]
    pub pos: Option<GridPos>,
    #[serde(default)]
    pub stats: ActorStats,
    // Starting health, defaults to max
    #[serde(default)]
    pub hp: Option<i32>,
    pub weapon: String,
    #[serde(default)]
    pub abilities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawn {
    pub definition: String,
    // A random free tile away from the entry zone when omitted
    #[serde(default)]
    pub pos: Option<GridPos>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum InteractableSpec {
    Door {
        #[serde(default)]
        locked: bool,
        #[serde(default)]
        config: DoorConfig,
    },
    Terminal {
        #[serde(default)]
        config: TerminalConfig,
    },
    Hazard {
        #[serde(default)]
        config: HazardConfig,
    },
}

impl InteractableSpec {
    const fn into_kind(self) -> InteractableKind {
        match self {
            Self::Door { locked, config } => InteractableKind::Door {
                state: if locked { DoorState::Locked } else { DoorState::Closed },
                config,
            },
            Self::Terminal { config } => InteractableKind::Terminal {
                state: TerminalState::Idle,
                config,
            },
            Self::Hazard { config } => InteractableKind::Hazard {
                state: HazardState::Armed,
                config,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractableSpawn {
    pub pos: GridPos,
    #[serde(flatten)]
    pub spec: InteractableSpec,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    EliminateAll,
    HackAndExtract,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSpec {
    #[serde(default)]
    pub name: String,
    pub map: MapSource,
    pub crew: Vec<CrewSpawn>,
    #[serde(default)]
    pub enemies: Vec<EnemySpawn>,
    // Placed on top of whatever the template glyphs already spawn
    #[serde(default)]
    pub interactables: Vec<InteractableSpawn>,
    #[serde(default)]
    pub objective: Objective,
    #[serde(default)]
    pub time_limit_ticks: Option<u64>,
    #[serde(default)]
    pub config: SimConfig,
    // Extra or overriding definitions layered on the builtin set
    #[serde(default)]
    pub definitions: Option<DefinitionSet>,
}

impl MissionSpec {
    #[cfg(feature = "json")]
    pub fn from_json_str(text: &str) -> Result<Self, MissionError> {
        Ok(serde_json::from_str(text)?)
    }

    // Builtin definitions plus whatever this mission ships
    pub fn definitions(&self) -> Result<Definitions, MissionError> {
        let mut defs = Definitions::builtin();
        if let Some(extra) = &self.definitions {
            defs.extend(extra.clone())?;
        }
        Ok(defs)
    }
}

// ============================================================================
// Mission Setup
// ============================================================================

pub(crate) struct Setup {
    pub map: GameMap,
    pub entry_zone: Vec<GridPos>,
    pub actors: Vec<Actor>,
    pub interactables: Vec<Interactable>,
}

fn place_interactables(
    map: &mut GameMap,
    features: &[(GridPos, TemplateFeature)],
    extra: &[InteractableSpawn],
) -> Result<Vec<Interactable>, MissionError> {
    let template = features.iter().map(|(pos, feature)| {
        let spec = match feature {
            TemplateFeature::Door { locked } => InteractableSpec::Door {
                locked: *locked,
                config: DoorConfig::default(),
            },
            TemplateFeature::Terminal => InteractableSpec::Terminal {
                config: TerminalConfig::default(),
            },
            TemplateFeature::Hazard => InteractableSpec::Hazard {
                config: HazardConfig::default(),
            },
        };
        (*pos, spec)
    });
    let listed = extra.iter().map(|spawn| (spawn.pos, spawn.spec));

    let mut placed = Vec::new();
    for (pos, spec) in template.chain(listed) {
        if !map.is_walkable(pos) || map.interactable_at(pos).is_some() {
            return Err(MissionError::InvalidInteractable { pos });
        }
        let id = InteractableId(placed.len() as u32);
        let interactable = Interactable {
            id,
            pos,
            kind: spec.into_kind(),
        };
        map.register_interactable(pos, id);
        placed.push(interactable);
    }

    // Doors seal only after every placement check has seen the bare floor
    for interactable in &placed {
        if interactable.seals_tile() {
            map.set_sealed(interactable.pos, true);
        }
    }

    Ok(placed)
}

fn claim_spawn(
    map: &GameMap,
    occupied: &mut BTreeSet<GridPos>,
    name: &str,
    pos: GridPos,
) -> Result<GridPos, MissionError> {
    if !map.is_walkable(pos) {
        return Err(MissionError::InvalidSpawn {
            name: name.to_string(),
            pos,
        });
    }
    if !occupied.insert(pos) {
        return Err(MissionError::OccupiedSpawn {
            name: name.to_string(),
            pos,
        });
    }
    Ok(pos)
}

// Random free tile at least a few steps from every entry tile
fn random_enemy_tile<R: Rng>(
    rng: &mut R,
    map: &GameMap,
    entry_zone: &[GridPos],
    occupied: &BTreeSet<GridPos>,
) -> Option<GridPos> {
    let candidates: Vec<GridPos> = map
        .positions()
        .filter(|pos| map.is_walkable(*pos) && !occupied.contains(pos))
        .filter(|pos| map.interactable_at(*pos).is_none())
        .filter(|pos| entry_zone.iter().all(|entry| entry.chebyshev(*pos) > 3))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    Some(candidates[rng.random_range(0..candidates.len())])
}

// Build the map, roster and interactables a mission starts with
pub(crate) fn build<R: Rng>(spec: &MissionSpec, defs: &Definitions, rng: &mut R) -> Result<Setup, MissionError> {
    if spec.crew.is_empty() {
        return Err(MissionError::NoCrew);
    }

    let MapBuild {
        mut map,
        entry_zone,
        features,
    } = match &spec.map {
        MapSource::Template { rows } => parse_template(rows)?,
        MapSource::Procedural { width, height } => generate_map(rng, *width, *height),
    };

    let interactables = place_interactables(&mut map, &features, &spec.interactables)?;

    let crew_controller = if spec.config.crew_autopilot {
        Controller::Autonomous
    } else {
        Controller::Commanded
    };

    let mut occupied = BTreeSet::new();
    let mut actors = Vec::with_capacity(spec.crew.len() + spec.enemies.len());
    let mut free_entry = entry_zone.iter().copied();

    for crew in &spec.crew {
        let pos = match crew.pos {
            Some(pos) => pos,
            None => free_entry
                .find(|pos| !occupied.contains(pos) && map.is_walkable(*pos))
                .ok_or_else(|| MissionError::NoSpawnRoom { name: crew.name.clone() })?,
        };
        let pos = claim_spawn(&map, &mut occupied, &crew.name, pos)?;

        let weapon = defs.weapon(&crew.weapon)?.clone();
        let abilities = crew
            .abilities
            .iter()
            .map(|id| defs.ability(id).cloned())
            .collect::<Result<Vec<_>, _>>()?;

        let mut actor = Actor::new(
            ActorId(actors.len() as u32),
            crew.name.clone(),
            UnitKind::Crew,
            crew_controller,
            pos,
            crew.stats,
            weapon,
            abilities,
        );
        if let Some(hp) = crew.hp {
            actor.hp = hp.min(actor.stats.max_hp);
        }
        actors.push(actor);
    }

    for enemy in &spec.enemies {
        let def = defs.enemy(&enemy.definition)?;
        let name = enemy.name.clone().unwrap_or_else(|| format!("{} {}", def.name, actors.len()));
        let pos = match enemy.pos {
            Some(pos) => pos,
            None => random_enemy_tile(rng, &map, &entry_zone, &occupied)
                .ok_or_else(|| MissionError::NoSpawnRoom { name: name.clone() })?,
        };
        let pos = claim_spawn(&map, &mut occupied, &name, pos)?;
        let weapon = defs.weapon(&def.weapon)?.clone();

        actors.push(Actor::new(
            ActorId(actors.len() as u32),
            name,
            def.kind,
            Controller::Autonomous,
            pos,
            def.stats,
            weapon,
            Vec::new(),
        ));
    }

    Ok(Setup {
        map,
        entry_zone,
        actors,
        interactables,
    })
}
