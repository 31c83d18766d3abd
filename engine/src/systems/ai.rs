use tracing::debug;

use super::movement::step_toward;
use super::perception::detect_opponents;
use crate::actor::{Actor, Controller};
use crate::commands::CommandOutcome;
use crate::constants::*;
use crate::interactables::{InteractableKind, TerminalState};
use crate::mission::Objective;
use crate::types::{ActorId, Faction, GridPos, InteractableId};
use crate::world::{Detection, Mission};

// ============================================================================
// Target Scoring
// ============================================================================

// Proximity, plus bonuses for being in range, for threatening me, and for being hurt
#[must_use]
pub fn score_target(me: &Actor, other: &Actor) -> f32 {
    let distance = me.pos.distance(other.pos);
    let mut score = 1.0 / (distance + 1.0);
    if distance <= me.weapon.range {
        score += SCORE_IN_RANGE_BONUS;
    }
    if other.orders.attack_target == Some(me.id) {
        score += SCORE_ATTACKING_ME_BONUS;
    } else if other.orders.auto_defend == Some(me.id) {
        score += SCORE_DEFENDING_AGAINST_ME_BONUS;
    }
    score + SCORE_WOUNDED_WEIGHT * (1.0 - other.hp_fraction())
}

// Highest score wins; candidates arrive in priority order so the first of equals is kept
fn best_target(mission: &Mission, me: &Actor, candidates: &[ActorId]) -> Option<(ActorId, f32)> {
    candidates
        .iter()
        .filter_map(|id| mission.actor(*id).filter(|other| other.alive))
        .map(|other| (other.id, score_target(me, other)))
        .fold(None, |best, (id, score)| match best {
            Some((_, top)) if top >= score => best,
            _ => Some((id, score)),
        })
}

// ============================================================================
// Decisions
// ============================================================================

enum Decision {
    Engage(ActorId),
    MoveTo(GridPos),
    Interact(InteractableId),
    Hold,
}

fn choose_target(mission: &Mission, me: &Actor, visible: &[ActorId]) -> Option<ActorId> {
    let (best, best_score) = best_target(mission, me, visible)?;

    // Keep a live, visible, in-range target unless the challenger clears the hysteresis margin
    let current = me
        .orders
        .attack_target
        .filter(|id| visible.contains(id))
        .and_then(|id| mission.actor(id))
        .filter(|target| target.alive && me.in_weapon_range(target.pos));
    let Some(current) = current else {
        return Some(best);
    };
    if best == current.id {
        return Some(best);
    }

    let current_score = score_target(me, current);
    if best_score >= current_score * (1.0 + mission.config.switch_hysteresis) {
        debug!(tick = mission.tick, id = %me.id, from = %current.id, to = %best, "target switched");
        Some(best)
    } else {
        Some(current.id)
    }
}

// Alerted enemy with nobody in sight walks to the freshest last-known position
fn investigate(mission: &Mission, me: &Actor) -> Decision {
    let Some((_, sighting)) = mission.perception(me.id).and_then(|perception| perception.latest_sighting()) else {
        return Decision::Hold;
    };
    if sighting.pos == me.pos {
        return Decision::Hold;
    }
    Decision::MoveTo(sighting.pos)
}

// Autopilot crew with nobody in sight: work the objective, otherwise close on the nearest enemy
fn pursue_objective(mission: &Mission, me: &Actor) -> Decision {
    if mission.objective == Objective::HackAndExtract {
        let terminal = mission
            .interactables
            .iter()
            .filter(|interactable| {
                interactable.is_objective()
                    && matches!(
                        interactable.kind,
                        InteractableKind::Terminal {
                            state: TerminalState::Idle,
                            ..
                        }
                    )
            })
            .min_by_key(|interactable| (me.pos.distance_sq(interactable.pos), interactable.id));
        if let Some(terminal) = terminal {
            return if me.pos.is_adjacent(terminal.pos) {
                Decision::Interact(terminal.id)
            } else {
                Decision::MoveTo(terminal.pos)
            };
        }

        let hacking_elsewhere = mission.interactables.iter().any(|interactable| {
            matches!(
                interactable.kind,
                InteractableKind::Terminal {
                    state: TerminalState::Hacking,
                    config,
                } if config.objective
            )
        });
        if !hacking_elsewhere {
            if mission.entry_zone.contains(&me.pos) {
                return Decision::Hold;
            }
            let exit = mission
                .entry_zone
                .iter()
                .filter(|pos| mission.actor_at(**pos).is_none())
                .min_by_key(|pos| me.pos.distance_sq(**pos));
            return exit.map_or(Decision::Hold, |pos| Decision::MoveTo(*pos));
        }
    }

    mission
        .live_actors(me.faction.opposing())
        .min_by_key(|enemy| (me.pos.distance_sq(enemy.pos), enemy.id))
        .map_or(Decision::Hold, |enemy| Decision::MoveTo(enemy.pos))
}

fn decide(mission: &Mission, me: &Actor) -> Decision {
    let visible: Vec<ActorId> = match me.faction {
        Faction::Enemy => mission
            .perception(me.id)
            .map(|perception| perception.visible.clone())
            .unwrap_or_default(),
        Faction::Crew => detect_opponents(mission, me.id).into_iter().map(|(id, _)| id).collect(),
    };

    if let Some(target) = choose_target(mission, me, &visible) {
        return Decision::Engage(target);
    }
    match me.faction {
        Faction::Enemy => investigate(mission, me),
        Faction::Crew => pursue_objective(mission, me),
    }
}

// ============================================================================
// AI Tick
// ============================================================================

// Runs every `ai_interval_ticks`. Idle enemies do nothing; everyone else autonomous engages the
// best visible opponent, stepping one tile closer when out of range.
pub fn run(mission: &mut Mission) {
    let interval = mission.config.ai_interval_ticks.max(1);
    if (mission.tick - 1) % interval != 0 {
        return;
    }

    for idx in 0..mission.actors.len() {
        let me = &mission.actors[idx];
        if !me.alive || me.controller != Controller::Autonomous || me.is_stunned() || me.is_channeling() {
            continue;
        }
        let idle = mission
            .perception(me.id)
            .is_some_and(|perception| perception.state == Detection::Idle);
        if me.faction == Faction::Enemy && idle {
            continue;
        }

        let id = me.id;
        match decide(mission, me) {
            Decision::Engage(target) => {
                let Some(target_pos) = mission.actor(target).map(|target| target.pos) else {
                    continue;
                };
                let me = &mission.actors[idx];
                let step = (!me.in_weapon_range(target_pos))
                    .then(|| step_toward(&mission.map, me.pos, target_pos))
                    .flatten();
                let actor = &mut mission.actors[idx];
                actor.orders.attack_target = Some(target);
                match step {
                    Some(step) => actor.set_move_target(step),
                    None => actor.halt(),
                }
            }
            Decision::MoveTo(pos) => {
                let actor = &mut mission.actors[idx];
                actor.orders.attack_target = None;
                actor.set_move_target(pos);
            }
            Decision::Interact(terminal) => {
                if let CommandOutcome::Rejected(reason) = mission.order_interact(id, terminal) {
                    debug!(%id, %terminal, %reason, "autopilot interaction refused");
                }
            }
            Decision::Hold => {
                let actor = &mut mission.actors[idx];
                actor.orders.attack_target = None;
                actor.halt();
                // Nothing left to chase at this spot
                if let Some(perception) = mission.perception.get_mut(&id) {
                    perception.last_known.retain(|_, sighting| sighting.pos != actor.pos);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorStats, UnitKind};
    use crate::definitions::Definitions;

    fn actor(id: u32, kind: UnitKind, pos: GridPos) -> Actor {
        Actor::new(
            ActorId(id),
            format!("unit{id}"),
            kind,
            Controller::Autonomous,
            pos,
            ActorStats::default(),
            Definitions::builtin().weapon("rifle").expect("rifle").clone(),
            Vec::new(),
        )
    }

    #[test]
    fn closer_targets_score_higher() {
        let me = actor(0, UnitKind::Trooper, GridPos::new(0, 0));
        let near = actor(1, UnitKind::Crew, GridPos::new(2, 0));
        let far = actor(2, UnitKind::Crew, GridPos::new(9, 0));
        assert!(score_target(&me, &near) > score_target(&me, &far));
    }

    #[test]
    fn threats_and_wounds_raise_the_score() {
        let me = actor(0, UnitKind::Trooper, GridPos::new(0, 0));
        let calm = actor(1, UnitKind::Crew, GridPos::new(3, 0));

        let mut attacking = calm.clone();
        attacking.orders.attack_target = Some(me.id);
        let mut defending = calm.clone();
        defending.orders.auto_defend = Some(me.id);
        let mut wounded = calm.clone();
        wounded.hp = 1;

        let base = score_target(&me, &calm);
        assert!((score_target(&me, &attacking) - base - SCORE_ATTACKING_ME_BONUS).abs() < 1e-5);
        assert!((score_target(&me, &defending) - base - SCORE_DEFENDING_AGAINST_ME_BONUS).abs() < 1e-5);
        assert!(score_target(&me, &wounded) > base);
    }

    #[test]
    fn out_of_range_loses_the_range_bonus() {
        let me = actor(0, UnitKind::Trooper, GridPos::new(0, 0));
        let inside = actor(1, UnitKind::Crew, GridPos::new(10, 0));
        let outside = actor(2, UnitKind::Crew, GridPos::new(11, 0));
        let gap = score_target(&me, &inside) - score_target(&me, &outside);
        assert!(gap > SCORE_IN_RANGE_BONUS);
    }
}
