use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::actor::{Actor, Orders, StatusEffect};
use crate::combat::FactionStats;
use crate::config::SimConfig;
use crate::definitions::{AbilityDef, Definitions};
use crate::events::{EventBus, SimEvent, SubscriptionId};
use crate::interactables::{
    ChannelKind, HazardState, Interactable, InteractableKind, InteractableState, TerminalState,
};
use crate::map::GameMap;
use crate::mission::{self, MissionError, MissionSpec, Objective, Setup};
use crate::scheduler::TickClock;
use crate::types::{ActorId, Faction, GridPos, InteractableId};
use crate::visibility::VisibilityGrid;

// ============================================================================
// Mission-Level State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmState {
    #[default]
    Quiet,
    Alerted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionStatus {
    Active,
    Complete(Outcome),
}

// ============================================================================
// Perception
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Detection {
    #[default]
    Idle,
    Alerted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sighting {
    pub pos: GridPos,
    pub tick: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnemyPerception {
    pub state: Detection,
    pub last_known: BTreeMap<ActorId, Sighting>,
    pub last_transition_tick: Option<u64>,
    // Opponents seen during the latest perception pass, nearest first
    pub visible: Vec<ActorId>,
}

impl EnemyPerception {
    // Freshest last-known position, ties going to the lowest actor id
    #[must_use]
    pub fn latest_sighting(&self) -> Option<(ActorId, Sighting)> {
        self.last_known
            .iter()
            .fold(None, |best: Option<(ActorId, Sighting)>, (id, sighting)| match best {
                Some((_, current)) if current.tick >= sighting.tick => best,
                _ => Some((*id, *sighting)),
            })
    }
}

// Thrown or applied ability waiting for its resolution tick
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAbility {
    pub owner: ActorId,
    pub ability: AbilityDef,
    pub target: GridPos,
    pub resolve_tick: u64,
}

// ============================================================================
// Mission
// ============================================================================

// Aggregate root owning every piece of mutable simulation state. Systems borrow it for one tick.
#[derive(Debug)]
pub struct Mission {
    pub(crate) name: String,
    pub(crate) seed: u64,
    pub(crate) config: SimConfig,
    pub(crate) map: GameMap,
    pub(crate) entry_zone: Vec<GridPos>,
    pub(crate) actors: Vec<Actor>,
    pub(crate) interactables: Vec<Interactable>,
    pub(crate) perception: BTreeMap<ActorId, EnemyPerception>,
    pub(crate) alarm: AlarmState,
    pub(crate) visibility: VisibilityGrid,
    pub(crate) pending: Vec<PendingAbility>,
    // Shots taken since the last perception pass: victim -> (shooter, where it fired from)
    pub(crate) shot_at: BTreeMap<ActorId, (ActorId, GridPos)>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) stats: FactionStats,
    pub(crate) events: EventBus,
    pub(crate) objective: Objective,
    pub(crate) time_limit: Option<u64>,
    // Ticks run so far; during a tick, the number of the tick in progress
    pub(crate) tick: u64,
    pub(crate) status: MissionStatus,
    pub(crate) clock: TickClock,
    announced: bool,
}

impl Mission {
    // Build a mission from a `MissionSpec` using the builtin definitions plus any it ships
    pub fn new(spec: &MissionSpec, seed: u64) -> Result<Self, MissionError> {
        let defs = spec.definitions()?;
        Self::with_definitions(spec, &defs, seed)
    }

    pub fn with_definitions(spec: &MissionSpec, defs: &Definitions, seed: u64) -> Result<Self, MissionError> {
        let config = spec.config.sanitized();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let Setup {
            map,
            entry_zone,
            actors,
            interactables,
        } = mission::build(spec, defs, &mut rng)?;

        let perception = actors
            .iter()
            .filter(|actor| actor.faction == Faction::Enemy)
            .map(|actor| (actor.id, EnemyPerception::default()))
            .collect();

        let mut mission = Self {
            name: spec.name.clone(),
            seed,
            config,
            visibility: VisibilityGrid::new(map.width(), map.height()),
            map,
            entry_zone,
            actors,
            interactables,
            perception,
            alarm: AlarmState::Quiet,
            pending: Vec::new(),
            shot_at: BTreeMap::new(),
            rng,
            stats: FactionStats::default(),
            events: EventBus::default(),
            objective: spec.objective,
            time_limit: spec.time_limit_ticks,
            tick: 0,
            status: MissionStatus::Active,
            clock: TickClock::new(config.tick_seconds(), config.max_catch_up_ticks),
            announced: false,
        };
        mission.refresh_visibility();

        info!(
            name = %mission.name,
            seed,
            actors = mission.actors.len(),
            interactables = mission.interactables.len(),
            "mission ready"
        );
        Ok(mission)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn config(&self) -> &SimConfig {
        &self.config
    }

    #[must_use]
    pub const fn map(&self) -> &GameMap {
        &self.map
    }

    #[must_use]
    pub fn entry_zone(&self) -> &[GridPos] {
        &self.entry_zone
    }

    #[must_use]
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(id.index())
    }

    // Live actor standing on `pos`
    #[must_use]
    pub fn actor_at(&self, pos: GridPos) -> Option<ActorId> {
        self.actors.iter().find(|actor| actor.alive && actor.pos == pos).map(|actor| actor.id)
    }

    pub fn live_actors(&self, faction: Faction) -> impl Iterator<Item = &Actor> + '_ {
        self.actors.iter().filter(move |actor| actor.alive && actor.faction == faction)
    }

    #[must_use]
    pub fn interactables(&self) -> &[Interactable] {
        &self.interactables
    }

    #[must_use]
    pub fn interactable(&self, id: InteractableId) -> Option<&Interactable> {
        self.interactables.get(id.index())
    }

    #[must_use]
    pub fn perception(&self, enemy: ActorId) -> Option<&EnemyPerception> {
        self.perception.get(&enemy)
    }

    #[must_use]
    pub const fn alarm(&self) -> AlarmState {
        self.alarm
    }

    #[must_use]
    pub const fn visibility(&self) -> &VisibilityGrid {
        &self.visibility
    }

    #[must_use]
    pub fn pending_abilities(&self) -> &[PendingAbility] {
        &self.pending
    }

    #[must_use]
    pub const fn stats(&self) -> &FactionStats {
        &self.stats
    }

    #[must_use]
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub const fn status(&self) -> MissionStatus {
        self.status
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        match self.status {
            MissionStatus::Active => None,
            MissionStatus::Complete(outcome) => Some(outcome),
        }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.status, MissionStatus::Complete(_))
    }

    // ========================================================================
    // Events
    // ========================================================================

    pub fn subscribe(&mut self, handler: impl FnMut(&SimEvent) -> anyhow::Result<()> + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    #[must_use]
    pub const fn subscriber_failures(&self) -> u64 {
        self.events.failures()
    }

    pub(crate) fn emit(&mut self, event: SimEvent) {
        self.events.publish(&event);
    }

    // Subscribers attach after construction, so the roster is announced on the first tick
    pub(crate) fn announce_roster(&mut self) {
        if self.announced {
            return;
        }
        self.announced = true;
        let added: Vec<SimEvent> = self
            .actors
            .iter()
            .map(|actor| SimEvent::ActorAdded {
                actor: actor.id,
                name: actor.name.clone(),
                faction: actor.faction,
                pos: actor.pos,
            })
            .collect();
        for event in added {
            self.emit(event);
        }
    }

    // ========================================================================
    // Damage & Death
    // ========================================================================

    // Single entry point for every source of harm. Interrupts channels that allow it and kills on
    // lethal damage. Returns true when the victim died.
    pub(crate) fn apply_damage(&mut self, victim: ActorId, amount: i32, source: Option<ActorId>) -> bool {
        let Some(target) = self.actors.get_mut(victim.index()) else {
            return false;
        };
        if !target.alive || amount <= 0 {
            return false;
        }

        target.hp -= amount;
        target.tally.damage_taken += amount;
        let lethal = target.hp <= 0;
        if lethal {
            target.hp = 0;
        }

        if let Some(attacker) = source.and_then(|id| self.actors.get_mut(id.index())) {
            attacker.tally.damage_dealt += amount;
            let faction = attacker.faction;
            self.stats.get_mut(faction).damage_dealt += amount;
        }

        if lethal {
            self.kill(victim, source);
        } else {
            self.interrupt_channel(victim, false);
        }
        lethal
    }

    // Being shot at is noticed whether or not it lands. The victim returns fire and its next
    // perception pass learns where the shot came from.
    pub(crate) fn note_shot(&mut self, victim: ActorId, shooter: ActorId) {
        let Some(from) = self.actor(shooter).map(|actor| actor.pos) else {
            return;
        };
        let Some(target) = self.actors.get_mut(victim.index()).filter(|actor| actor.alive) else {
            return;
        };
        target.return_fire_on(shooter);
        self.shot_at.insert(victim, (shooter, from));
    }

    fn kill(&mut self, victim: ActorId, killer: Option<ActorId>) {
        self.interrupt_channel(victim, true);

        let Some(actor) = self.actors.get_mut(victim.index()) else {
            return;
        };
        actor.alive = false;
        actor.halt();
        actor.paused = false;
        actor.orders = Orders::default();
        actor.statuses.clear();
        actor.reload_remaining = None;
        info!(tick = self.tick, victim = %victim, name = %actor.name, "actor died");

        if let Some(killer_id) = killer.filter(|id| *id != victim) {
            if let Some(killer) = self.actors.get_mut(killer_id.index()) {
                killer.tally.kills += 1;
                let faction = killer.faction;
                self.stats.get_mut(faction).kills += 1;
            }
        }

        self.emit(SimEvent::ActorDied { actor: victim, killer });
        self.emit(SimEvent::ActorRemoved { actor: victim });
    }

    pub(crate) fn add_status(&mut self, actor: ActorId, status: StatusEffect) {
        let Some(target) = self.actors.get_mut(actor.index()).filter(|actor| actor.alive) else {
            return;
        };
        target.add_status(status);
        if matches!(status, StatusEffect::Stunned { .. }) {
            self.interrupt_channel(actor, false);
        }
    }

    // ========================================================================
    // Interactables & Channels
    // ========================================================================

    // Change an interactable's state, keep the map's door seals in sync and publish the change
    pub(crate) fn set_interactable_state(&mut self, id: InteractableId, to: InteractableState) -> bool {
        let Some(interactable) = self.interactables.get_mut(id.index()) else {
            return false;
        };
        let Some(from) = interactable.transition(to) else {
            return false;
        };
        let pos = interactable.pos;
        let sealed = interactable.seals_tile();
        self.map.set_sealed(pos, sealed);
        debug!(tick = self.tick, %id, ?from, ?to, "interactable changed");
        self.emit(SimEvent::InteractableChanged { id, from, to });
        true
    }

    // Cancel the actor's channel. Non-interruptible channels survive unless `force` is set.
    // A terminal mid-hack rolls back to idle.
    pub(crate) fn interrupt_channel(&mut self, actor: ActorId, force: bool) -> bool {
        let Some(owner) = self.actors.get_mut(actor.index()) else {
            return false;
        };
        let Some(channel) = owner.channel else {
            return false;
        };
        if !channel.interruptible && !force {
            return false;
        }
        owner.channel = None;

        if channel.kind == ChannelKind::Hack {
            let hacking = self
                .interactable(channel.target)
                .is_some_and(|target| target.state() == InteractableState::Terminal(TerminalState::Hacking));
            if hacking {
                self.set_interactable_state(channel.target, InteractableState::Terminal(TerminalState::Idle));
            }
        }

        debug!(tick = self.tick, %actor, kind = ?channel.kind, "channel interrupted");
        self.emit(SimEvent::ChannelInterrupted {
            actor,
            target: channel.target,
            kind: channel.kind,
        });
        true
    }

    pub(crate) fn complete_channel(&mut self, actor: ActorId) {
        let Some(owner) = self.actors.get_mut(actor.index()) else {
            return;
        };
        let Some(channel) = owner.channel.take() else {
            return;
        };

        let next = self
            .interactable(channel.target)
            .and_then(|target| target.completed_state(channel.kind));
        if let Some(next) = next {
            self.set_interactable_state(channel.target, next);
        }

        debug!(tick = self.tick, %actor, kind = ?channel.kind, "channel completed");
        self.emit(SimEvent::ChannelCompleted {
            actor,
            target: channel.target,
            kind: channel.kind,
        });
    }

    // Detonate an armed hazard: straight-line area damage to every live actor in radius
    pub(crate) fn trigger_hazard(&mut self, id: InteractableId, by: Option<ActorId>) {
        let Some(hazard) = self.interactable(id).copied() else {
            return;
        };
        let InteractableKind::Hazard {
            state: HazardState::Armed,
            config,
        } = hazard.kind
        else {
            return;
        };

        self.set_interactable_state(id, InteractableState::Hazard(HazardState::Triggered));
        info!(tick = self.tick, %id, pos = %hazard.pos, "hazard triggered");
        self.emit(SimEvent::HazardTriggered { id, by });

        let caught: Vec<ActorId> = self
            .actors
            .iter()
            .filter(|actor| actor.alive && actor.pos.distance(hazard.pos) <= config.radius)
            .map(|actor| actor.id)
            .collect();
        for victim in caught {
            if config.bleed_per_tick > 0 && config.bleed_ticks > 0 {
                self.add_status(
                    victim,
                    StatusEffect::Bleeding {
                        damage_per_tick: config.bleed_per_tick,
                        remaining: config.bleed_ticks,
                    },
                );
            }
            self.apply_damage(victim, config.damage, None);
        }
    }

    // ========================================================================
    // Alarm
    // ========================================================================

    // Quiet -> Alerted, once per mission. Alarm-locked terminals shut down, cancelling any hack.
    pub(crate) fn raise_alarm(&mut self, by: ActorId) {
        if self.alarm == AlarmState::Alerted {
            return;
        }
        self.alarm = AlarmState::Alerted;
        info!(tick = self.tick, %by, "alarm raised");
        self.emit(SimEvent::AlarmRaised { by });

        let locking: Vec<InteractableId> = self
            .interactables
            .iter()
            .filter(|interactable| {
                matches!(
                    interactable.kind,
                    InteractableKind::Terminal {
                        state: TerminalState::Idle | TerminalState::Hacking,
                        config,
                    } if config.locks_on_alarm
                )
            })
            .map(|interactable| interactable.id)
            .collect();

        for terminal in locking {
            let hackers: Vec<ActorId> = self
                .actors
                .iter()
                .filter(|actor| actor.channel.is_some_and(|channel| channel.target == terminal))
                .map(|actor| actor.id)
                .collect();
            for hacker in hackers {
                self.interrupt_channel(hacker, true);
            }
            self.set_interactable_state(terminal, InteractableState::Terminal(TerminalState::Disabled));
        }
    }

    // ========================================================================
    // Fog of War
    // ========================================================================

    pub(crate) fn refresh_visibility(&mut self) {
        let observers: Vec<(GridPos, f32)> = self
            .live_actors(Faction::Crew)
            .map(|actor| (actor.pos, actor.stats.vision))
            .collect();
        self.visibility.recompute(&self.map, &observers);
    }

    // ========================================================================
    // Clock Control
    // ========================================================================

    pub fn set_paused(&mut self, paused: bool) {
        self.clock.set_paused(paused);
    }

    pub fn set_time_scale(&mut self, scale: f32) {
        self.clock.set_time_scale(scale);
    }
}
