use tracing::trace;

use crate::combat::{AttackResult, hit_chance, roll_damage, roll_hit};
use crate::events::SimEvent;
use crate::map::cover_against;
use crate::types::ActorId;
use crate::visibility::has_line_of_sight;
use crate::world::Mission;

// ============================================================================
// Attack Resolution
// ============================================================================

// Manual attack orders first, then return fire from anyone without one. A unit killed in the
// first pass never shoots back in the second.
pub fn run(mission: &mut Mission) {
    for idx in 0..mission.actors.len() {
        if let Some(target) = mission.actors[idx].orders.attack_target {
            fire(mission, idx, target, false);
        }
    }

    for idx in 0..mission.actors.len() {
        let orders = mission.actors[idx].orders;
        if orders.attack_target.is_some() {
            continue;
        }
        if let Some(target) = orders.auto_defend {
            fire(mission, idx, target, true);
        }
    }
}

// Take one shot if everything lines up. Stale targets are dropped here, on use.
fn fire(mission: &mut Mission, idx: usize, target_id: ActorId, auto_defend: bool) {
    let attacker = &mission.actors[idx];
    if !attacker.alive {
        return;
    }

    let stale = mission
        .actor(target_id)
        .is_none_or(|target| !target.alive || target.faction == attacker.faction);
    if stale {
        let orders = &mut mission.actors[idx].orders;
        if auto_defend {
            orders.auto_defend = None;
        } else {
            orders.attack_target = None;
        }
        return;
    }

    if !attacker.can_fire() {
        return;
    }
    let Some(target) = mission.actor(target_id) else {
        return;
    };
    let attacker = &mission.actors[idx];
    let attacker_id = attacker.id;
    let distance = attacker.pos.distance(target.pos);
    if distance > attacker.weapon.range || !has_line_of_sight(&mission.map, attacker.pos, target.pos) {
        return;
    }

    let cover = cover_against(&mission.map, target.pos, attacker.pos);
    let chance = hit_chance(&attacker.weapon, attacker.stats.aim, distance, cover, &mission.config);
    let weapon = attacker.weapon.clone();
    let armor = target.stats.armor;
    let faction = attacker.faction;

    let hit = roll_hit(&mut mission.rng, chance);
    let damage = if hit { roll_damage(&mut mission.rng, &weapon, armor) } else { 0 };

    let shooter = &mut mission.actors[idx];
    shooter.consume_round();
    if hit {
        shooter.tally.hits += 1;
    }
    let stats = mission.stats.get_mut(faction);
    stats.shots += 1;
    if hit {
        stats.hits += 1;
    }

    mission.note_shot(target_id, attacker_id);

    let killed = hit && mission.apply_damage(target_id, damage, Some(attacker_id));

    let result = AttackResult {
        tick: mission.tick,
        attacker: attacker_id,
        target: target_id,
        hit,
        chance,
        damage,
        cover,
        distance,
        killed,
        auto_defend,
    };
    trace!(?result, "attack resolved");
    mission.emit(SimEvent::AttackResolved(result));
}
