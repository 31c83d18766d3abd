pub mod actor;
pub mod combat;
pub mod commands;
pub mod config;
pub mod constants;
pub mod definitions;
pub mod events;
pub mod interactables;
pub mod map;
pub mod mission;
pub mod scheduler;
pub mod summary;
pub mod systems;
pub mod types;
pub mod visibility;
pub mod world;

pub use actor::{Actor, ActorStats, Controller, StatusEffect, UnitKind};
pub use combat::{AttackResult, CombatStats, FactionStats};
pub use commands::{CommandOutcome, RejectReason};
pub use config::SimConfig;
pub use definitions::{AbilityDef, AbilityKind, DefinitionError, DefinitionSet, Definitions, EnemyDef, WeaponDef};
pub use events::{SimEvent, SubscriptionId};
pub use interactables::{Interactable, InteractableKind, InteractableState};
pub use map::{CoverHeight, GameMap, Terrain};
pub use mission::{MissionError, MissionSpec, Objective};
pub use summary::{ActorReport, MissionSummary};
pub use types::{ActorId, Faction, GridPos, InteractableId};
pub use world::{AlarmState, Detection, Mission, MissionStatus, Outcome};
