use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::definitions::{AbilityDef, WeaponDef};
use crate::interactables::ChanneledAction;
use crate::types::{ActorId, Faction, GridPos};

// ============================================================================
// Unit Kinds & Stats
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Crew,
    Trooper,
    Drone,
}

impl UnitKind {
    #[must_use]
    pub const fn faction(self) -> Faction {
        match self {
            Self::Crew => Faction::Crew,
            Self::Trooper | Self::Drone => Faction::Enemy,
        }
    }

    // Hovering units pass over hazards without setting them off
    #[must_use]
    pub const fn hovers(self) -> bool {
        matches!(self, Self::Drone)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorStats {
    pub max_hp: i32,
    pub armor: i32,
    // Additive hit-chance bonus
    pub aim: f32,
    // Tiles per second
    pub speed: f32,
    // Detection radius in tiles
    pub vision: f32,
    // Fraction by which hostile detection radius shrinks against this unit
    pub stealth: f32,
    // Fraction by which channel durations shrink
    pub tech: f32,
}

impl Default for ActorStats {
    fn default() -> Self {
        Self {
            max_hp: 10,
            armor: 0,
            aim: 0.0,
            speed: DEFAULT_SPEED,
            vision: DEFAULT_VISION,
            stealth: 0.0,
            tech: 0.0,
        }
    }
}

// Detection radius of a watcher with `vision` against a target with `stealth`
#[must_use]
pub fn detection_radius(vision: f32, stealth: f32) -> f32 {
    let factor = (1.0 - stealth.clamp(0.0, MAX_STEALTH)).max(MIN_DETECTION_FRACTION);
    vision * factor
}

// Ticks a channel with `base` duration takes for a unit with `tech`; never less than one
#[must_use]
pub fn channel_ticks(base: u32, tech: f32) -> u32 {
    let scaled = (base as f32 * (1.0 - tech.clamp(0.0, MAX_TECH))).ceil() as u32;
    scaled.max(1)
}

// ============================================================================
// Orders, Status & Tallies
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Controller {
    // Only the command surface moves this unit
    Commanded,
    // The AI controller drives this unit
    Autonomous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum StatusEffect {
    Stunned { remaining: u32 },
    Bleeding { damage_per_tick: i32, remaining: u32 },
}

impl StatusEffect {
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        match self {
            Self::Stunned { remaining } | Self::Bleeding { remaining, .. } => *remaining,
        }
    }

    const fn remaining_mut(&mut self) -> &mut u32 {
        match self {
            Self::Stunned { remaining } | Self::Bleeding { remaining, .. } => remaining,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Orders {
    pub move_target: Option<GridPos>,
    pub attack_target: Option<ActorId>,
    // Whoever last shot at this unit; return fire absent a manual target
    pub auto_defend: Option<ActorId>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorTally {
    pub kills: u32,
    pub shots: u32,
    pub hits: u32,
    pub damage_dealt: i32,
    pub damage_taken: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbilitySlot {
    pub ability: AbilityDef,
    pub charges: u32,
    pub cooldown: u32,
}

// ============================================================================
// Actor
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub kind: UnitKind,
    pub faction: Faction,
    pub controller: Controller,
    pub pos: GridPos,
    // Fraction of the way to `next_step`; the step is locked while this is above zero
    pub progress: f32,
    pub next_step: Option<GridPos>,
    // Lost this tick's collision arbitration
    pub paused: bool,
    pub hp: i32,
    pub stats: ActorStats,
    pub weapon: WeaponDef,
    pub magazine: u32,
    pub reserve: u32,
    pub cooldown: u32,
    pub reload_remaining: Option<u32>,
    pub orders: Orders,
    pub channel: Option<ChanneledAction>,
    pub statuses: Vec<StatusEffect>,
    pub abilities: Vec<AbilitySlot>,
    pub alive: bool,
    pub tally: ActorTally,
}

impl Actor {
    #[must_use]
    pub fn new(
        id: ActorId,
        name: String,
        kind: UnitKind,
        controller: Controller,
        pos: GridPos,
        stats: ActorStats,
        weapon: WeaponDef,
        abilities: Vec<AbilityDef>,
    ) -> Self {
        let magazine = weapon.magazine;
        let reserve = weapon.reserve;
        Self {
            id,
            name,
            kind,
            faction: kind.faction(),
            controller,
            pos,
            progress: 0.0,
            next_step: None,
            paused: false,
            hp: stats.max_hp,
            stats,
            weapon,
            magazine,
            reserve,
            cooldown: 0,
            reload_remaining: None,
            orders: Orders::default(),
            channel: None,
            statuses: Vec::new(),
            abilities: abilities
                .into_iter()
                .map(|ability| AbilitySlot {
                    charges: ability.charges,
                    ability,
                    cooldown: 0,
                })
                .collect(),
            alive: true,
            tally: ActorTally::default(),
        }
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.statuses.iter().any(|status| matches!(status, StatusEffect::Stunned { .. }))
    }

    #[must_use]
    pub const fn is_channeling(&self) -> bool {
        self.channel.is_some()
    }

    #[must_use]
    pub const fn is_reloading(&self) -> bool {
        self.reload_remaining.is_some()
    }

    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.orders.move_target.is_some()
    }

    // Live, not stunned, not channeling, not reloading, off cooldown and with a round chambered
    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.alive && !self.is_stunned() && !self.is_channeling() && !self.is_reloading() && self.cooldown == 0 && self.magazine > 0
    }

    #[must_use]
    pub fn hp_fraction(&self) -> f32 {
        if self.stats.max_hp <= 0 {
            return 0.0;
        }
        (self.hp as f32 / self.stats.max_hp as f32).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn in_weapon_range(&self, target: GridPos) -> bool {
        self.pos.distance(target) <= self.weapon.range
    }

    // ========================================================================
    // Movement
    // ========================================================================

    // Retargeting resets inter-tile progress; the same target again is a no-op
    pub fn set_move_target(&mut self, target: GridPos) {
        if self.orders.move_target == Some(target) {
            return;
        }
        self.orders.move_target = Some(target);
        self.progress = 0.0;
        self.next_step = None;
    }

    // Stop where we stand
    pub fn halt(&mut self) {
        self.orders.move_target = None;
        self.progress = 0.0;
        self.next_step = None;
    }

    // Auto-defend against `shooter`, unless locked into a channel that takes no new target
    pub fn return_fire_on(&mut self, shooter: ActorId) {
        if self.channel.is_some_and(|channel| !channel.interruptible) {
            return;
        }
        self.orders.auto_defend = Some(shooter);
    }

    // ========================================================================
    // Ammunition
    // ========================================================================

    pub fn start_reload(&mut self) -> bool {
        if self.is_reloading() || self.reserve == 0 || self.magazine >= self.weapon.magazine {
            return false;
        }
        self.reload_remaining = Some(self.weapon.reload_ticks.max(1));
        true
    }

    // Spend one round and start the cooldown; an empty magazine with reserve left reloads
    pub fn consume_round(&mut self) {
        self.magazine = self.magazine.saturating_sub(1);
        self.cooldown = self.weapon.cooldown_ticks;
        self.tally.shots += 1;
        if self.magazine == 0 {
            self.start_reload();
        }
    }

    fn finish_reload(&mut self) {
        let wanted = self.weapon.magazine.saturating_sub(self.magazine);
        let moved = wanted.min(self.reserve);
        self.magazine += moved;
        self.reserve -= moved;
        self.reload_remaining = None;
    }

    // Count down weapon cooldown, reload and ability cooldowns by one tick
    pub fn advance_timers(&mut self) {
        self.cooldown = self.cooldown.saturating_sub(1);
        if let Some(remaining) = self.reload_remaining {
            if remaining <= 1 {
                self.finish_reload();
            } else {
                self.reload_remaining = Some(remaining - 1);
            }
        }
        for slot in &mut self.abilities {
            slot.cooldown = slot.cooldown.saturating_sub(1);
        }
    }

    // ========================================================================
    // Status Effects
    // ========================================================================

    pub fn add_status(&mut self, status: StatusEffect) {
        // A fresh stun replaces a weaker one instead of stacking
        if let StatusEffect::Stunned { remaining } = status {
            for existing in &mut self.statuses {
                if let StatusEffect::Stunned { remaining: current } = existing {
                    *current = (*current).max(remaining);
                    return;
                }
            }
        }
        self.statuses.push(status);
    }

    // Tick every status down; returns bleed damage owed this tick
    pub fn advance_statuses(&mut self) -> i32 {
        let mut bleed = 0;
        for status in &mut self.statuses {
            if let StatusEffect::Bleeding { damage_per_tick, .. } = status {
                bleed += *damage_per_tick;
            }
            let remaining = status.remaining_mut();
            *remaining = remaining.saturating_sub(1);
        }
        self.statuses.retain(|status| status.remaining() > 0);
        bleed
    }

    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp + amount.max(0)).min(self.stats.max_hp);
        self.hp - before
    }

    #[must_use]
    pub fn ability_slot(&self, ability: &str) -> Option<&AbilitySlot> {
        self.abilities.iter().find(|slot| slot.ability.id == ability)
    }

    pub fn ability_slot_mut(&mut self, ability: &str) -> Option<&mut AbilitySlot> {
        self.abilities.iter_mut().find(|slot| slot.ability.id == ability)
    }
}
