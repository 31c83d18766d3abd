use std::fmt;
use tracing::debug;

use crate::actor::{Actor, channel_ticks};
use crate::events::SimEvent;
use crate::interactables::{ChannelKind, ChanneledAction, DoorState, Interaction, InteractableState, TerminalState};
use crate::types::{ActorId, GridPos, InteractableId};
use crate::visibility::has_line_of_sight;
use crate::world::{Mission, PendingAbility};

// ============================================================================
// Command Outcomes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MissionOver,
    UnknownActor,
    ActorDead,
    UnknownTarget,
    TargetDead,
    SameFaction,
    OutOfBounds,
    NotWalkable,
    Channeling,
    Stunned,
    Reloading,
    MagazineFull,
    NoReserve,
    UnknownInteractable,
    NotAdjacent,
    Occupied,
    NothingToDo,
    UnknownAbility,
    NoCharges,
    OnCooldown,
    OutOfRange,
    NoLineOfSight,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissionOver => "mission is over",
            Self::UnknownActor => "no such actor",
            Self::ActorDead => "actor is dead",
            Self::UnknownTarget => "no such target",
            Self::TargetDead => "target is dead",
            Self::SameFaction => "target is on the same side",
            Self::OutOfBounds => "tile is out of bounds",
            Self::NotWalkable => "tile is not walkable",
            Self::Channeling => "actor is busy channeling",
            Self::Stunned => "actor is stunned",
            Self::Reloading => "actor is already reloading",
            Self::MagazineFull => "magazine is full",
            Self::NoReserve => "no reserve ammunition",
            Self::UnknownInteractable => "no such interactable",
            Self::NotAdjacent => "interactable is not adjacent",
            Self::Occupied => "tile is occupied",
            Self::NothingToDo => "nothing to do in the current state",
            Self::UnknownAbility => "actor does not carry that ability",
            Self::NoCharges => "no charges left",
            Self::OnCooldown => "ability is cooling down",
            Self::OutOfRange => "target is out of range",
            Self::NoLineOfSight => "no line of sight to target",
        };
        f.write_str(text)
    }
}

// What became of an order. Invalid orders never touch simulation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Accepted,
    Rejected(RejectReason),
}

impl CommandOutcome {
    #[must_use]
    pub const fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

fn reject(actor: ActorId, command: &str, reason: RejectReason) -> CommandOutcome {
    debug!(%actor, command, %reason, "command rejected");
    CommandOutcome::Rejected(reason)
}

// ============================================================================
// Command Surface
// ============================================================================

impl Mission {
    // Shared liveness gate for every order
    fn commandable(&self, actor: ActorId) -> Result<&Actor, RejectReason> {
        if self.is_complete() {
            return Err(RejectReason::MissionOver);
        }
        let found = self.actor(actor).ok_or(RejectReason::UnknownActor)?;
        if !found.alive {
            return Err(RejectReason::ActorDead);
        }
        Ok(found)
    }

    // Walk toward `target`. Cancels an interruptible channel; a non-interruptible one refuses.
    pub fn order_move(&mut self, actor: ActorId, target: GridPos) -> CommandOutcome {
        let mover = match self.commandable(actor) {
            Ok(mover) => mover,
            Err(reason) => return reject(actor, "move", reason),
        };
        if !self.map.in_bounds(target) {
            return reject(actor, "move", RejectReason::OutOfBounds);
        }
        if !self.map.is_walkable(target) {
            return reject(actor, "move", RejectReason::NotWalkable);
        }
        if mover.channel.is_some_and(|channel| !channel.interruptible) {
            return reject(actor, "move", RejectReason::Channeling);
        }

        self.interrupt_channel(actor, false);
        let mover = &mut self.actors[actor.index()];
        if mover.pos == target {
            mover.halt();
        } else {
            mover.set_move_target(target);
        }
        debug!(%actor, %target, "move ordered");
        CommandOutcome::Accepted
    }

    pub fn order_attack(&mut self, actor: ActorId, target: ActorId) -> CommandOutcome {
        let attacker = match self.commandable(actor) {
            Ok(attacker) => attacker,
            Err(reason) => return reject(actor, "attack", reason),
        };
        if attacker.is_channeling() {
            return reject(actor, "attack", RejectReason::Channeling);
        }
        let Some(victim) = self.actor(target) else {
            return reject(actor, "attack", RejectReason::UnknownTarget);
        };
        if !victim.alive {
            return reject(actor, "attack", RejectReason::TargetDead);
        }
        if victim.faction == attacker.faction {
            return reject(actor, "attack", RejectReason::SameFaction);
        }

        self.actors[actor.index()].orders.attack_target = Some(target);
        debug!(%actor, %target, "attack ordered");
        CommandOutcome::Accepted
    }

    pub fn order_reload(&mut self, actor: ActorId) -> CommandOutcome {
        let shooter = match self.commandable(actor) {
            Ok(shooter) => shooter,
            Err(reason) => return reject(actor, "reload", reason),
        };
        let reason = if shooter.is_channeling() {
            Some(RejectReason::Channeling)
        } else if shooter.is_reloading() {
            Some(RejectReason::Reloading)
        } else if shooter.magazine >= shooter.weapon.magazine {
            Some(RejectReason::MagazineFull)
        } else if shooter.reserve == 0 {
            Some(RejectReason::NoReserve)
        } else {
            None
        };
        if let Some(reason) = reason {
            return reject(actor, "reload", reason);
        }

        self.actors[actor.index()].start_reload();
        CommandOutcome::Accepted
    }

    // Open or close a door on the spot, or start the channel that unlocks, hacks or disarms
    pub fn order_interact(&mut self, actor: ActorId, interactable: InteractableId) -> CommandOutcome {
        let user = match self.commandable(actor) {
            Ok(user) => user,
            Err(reason) => return reject(actor, "interact", reason),
        };
        if user.is_channeling() {
            return reject(actor, "interact", RejectReason::Channeling);
        }
        if user.is_stunned() {
            return reject(actor, "interact", RejectReason::Stunned);
        }
        let Some(target) = self.interactable(interactable) else {
            return reject(actor, "interact", RejectReason::UnknownInteractable);
        };
        if !user.pos.is_adjacent(target.pos) {
            return reject(actor, "interact", RejectReason::NotAdjacent);
        }
        let tech = user.stats.tech;
        let pos = target.pos;

        match target.interaction() {
            Interaction::Open => {
                self.set_interactable_state(interactable, InteractableState::Door(DoorState::Open));
            }
            Interaction::Close => {
                if self.actor_at(pos).is_some() {
                    return reject(actor, "interact", RejectReason::Occupied);
                }
                self.set_interactable_state(interactable, InteractableState::Door(DoorState::Closed));
            }
            Interaction::Channel {
                kind,
                base_ticks,
                interruptible,
            } => {
                let ticks = channel_ticks(base_ticks, tech);
                if kind == ChannelKind::Hack {
                    self.set_interactable_state(interactable, InteractableState::Terminal(TerminalState::Hacking));
                }
                let user = &mut self.actors[actor.index()];
                user.halt();
                user.channel = Some(ChanneledAction {
                    actor,
                    target: interactable,
                    kind,
                    total: ticks,
                    remaining: ticks,
                    interruptible,
                });
                debug!(%actor, %interactable, ?kind, ticks, "channel started");
                self.emit(SimEvent::ChannelStarted {
                    actor,
                    target: interactable,
                    kind,
                    ticks,
                });
            }
            Interaction::Unavailable => return reject(actor, "interact", RejectReason::NothingToDo),
        }
        CommandOutcome::Accepted
    }

    // Throw or apply an ability at a tile; it resolves after the ability's delay
    pub fn use_ability(&mut self, actor: ActorId, ability: &str, target: GridPos) -> CommandOutcome {
        let user = match self.commandable(actor) {
            Ok(user) => user,
            Err(reason) => return reject(actor, "ability", reason),
        };
        if user.is_channeling() {
            return reject(actor, "ability", RejectReason::Channeling);
        }
        if user.is_stunned() {
            return reject(actor, "ability", RejectReason::Stunned);
        }
        let Some(slot) = user.ability_slot(ability) else {
            return reject(actor, "ability", RejectReason::UnknownAbility);
        };
        if slot.charges == 0 {
            return reject(actor, "ability", RejectReason::NoCharges);
        }
        if slot.cooldown > 0 {
            return reject(actor, "ability", RejectReason::OnCooldown);
        }
        if !self.map.in_bounds(target) {
            return reject(actor, "ability", RejectReason::OutOfBounds);
        }
        if user.pos.distance(target) > slot.ability.range {
            return reject(actor, "ability", RejectReason::OutOfRange);
        }
        if !has_line_of_sight(&self.map, user.pos, target) {
            return reject(actor, "ability", RejectReason::NoLineOfSight);
        }

        let def = slot.ability.clone();
        let resolve_tick = self.tick + u64::from(def.delay_ticks.max(1));
        if let Some(slot) = self.actors[actor.index()].ability_slot_mut(ability) {
            slot.charges -= 1;
            slot.cooldown = def.cooldown_ticks;
        }
        debug!(%actor, ability, %target, resolve_tick, "ability used");
        self.pending.push(PendingAbility {
            owner: actor,
            ability: def,
            target,
            resolve_tick,
        });
        CommandOutcome::Accepted
    }

    // Drop every order. An interruptible channel is cancelled too.
    pub fn clear_orders(&mut self, actor: ActorId) -> CommandOutcome {
        if let Err(reason) = self.commandable(actor) {
            return reject(actor, "clear", reason);
        }
        self.interrupt_channel(actor, false);
        let cleared = &mut self.actors[actor.index()];
        cleared.halt();
        cleared.orders.attack_target = None;
        cleared.orders.auto_defend = None;
        CommandOutcome::Accepted
    }
}
