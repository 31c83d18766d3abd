use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::movement::step_toward;
use crate::types::{ActorId, Compass, GridPos};
use crate::world::Mission;

// ============================================================================
// Collision Arbitration
// ============================================================================

struct Claim {
    actor: usize,
    id: ActorId,
    remaining_sq: i32,
    target: GridPos,
    from: GridPos,
    step: GridPos,
}

impl Claim {
    // Lower sorts first: closer to the final target, then lowest id
    const fn priority(&self) -> (i32, ActorId) {
        (self.remaining_sq, self.id)
    }
}

// Pick every mover's next tile, then let only one mover per tile proceed this tick. Tiles held
// by a stationary actor are never given up: claimants detour around them when a free neighbour
// gets them closer, and pause otherwise. Among movers the claimant closest to its final target
// wins, lowest id breaking ties. Movers waiting on each other's tiles in a ring have the
// lowest-priority member sidestep. Re-evaluated from scratch each tick.
pub fn run(mission: &mut Mission) {
    let mut stationary = BTreeSet::new();
    let mut claims = Vec::new();

    for idx in 0..mission.actors.len() {
        let actor = &mut mission.actors[idx];
        actor.paused = false;
        if !actor.alive {
            continue;
        }

        let mobile = !actor.is_stunned() && !actor.is_channeling();
        let Some(target) = actor.orders.move_target.filter(|_| mobile) else {
            stationary.insert(actor.pos);
            continue;
        };
        if actor.pos == target {
            actor.halt();
            stationary.insert(actor.pos);
            continue;
        }

        // The step in progress stays locked until the actor lands on it
        let step = match actor.next_step {
            Some(step) if actor.progress > 0.0 => Some(step),
            _ => step_toward(&mission.map, actor.pos, target),
        };
        let actor = &mut mission.actors[idx];
        let Some(step) = step else {
            debug!(id = %actor.id, pos = %actor.pos, "no open step, movement halted");
            actor.halt();
            stationary.insert(actor.pos);
            continue;
        };

        actor.next_step = Some(step);
        claims.push(Claim {
            actor: idx,
            id: actor.id,
            remaining_sq: actor.pos.distance_sq(target),
            target,
            from: actor.pos,
            step,
        });
    }

    break_rings(mission, &mut claims, &mut stationary);
    detour_parked(mission, &mut claims, &stationary);

    let mut by_tile: BTreeMap<GridPos, Vec<Claim>> = BTreeMap::new();
    for claim in claims {
        by_tile.entry(claim.step).or_default().push(claim);
    }

    for (tile, mut claimants) in by_tile {
        if stationary.contains(&tile) {
            for claim in &claimants {
                let actor = &mut mission.actors[claim.actor];
                // Next to a destination someone is parked on: give up rather than wait forever
                if claim.target == tile && claim.from.is_adjacent(tile) && actor.progress <= 0.0 {
                    actor.halt();
                } else {
                    actor.paused = true;
                }
            }
            continue;
        }

        claimants.sort_by_key(Claim::priority);
        for claim in claimants.iter().skip(1) {
            mission.actors[claim.actor].paused = true;
            debug!(id = %claim.id, %tile, winner = %claimants[0].id, "move paused by contention");
        }
    }
}

// ============================================================================
// Rings
// ============================================================================

// Movers whose steps lead from one occupied tile to the next and back to the start can never
// land: each waits for the tile ahead to empty. Two movers swapping places is the common case.
fn break_rings(mission: &mut Mission, claims: &mut Vec<Claim>, stationary: &mut BTreeSet<GridPos>) {
    let mut standing: BTreeMap<GridPos, usize> = claims.iter().enumerate().map(|(i, claim)| (claim.from, i)).collect();
    let mut halted = BTreeSet::new();

    for start in 0..claims.len() {
        if halted.contains(&start) {
            continue;
        }
        let mut ring = vec![start];
        let mut current = start;
        let closed = loop {
            let Some(&next) = standing.get(&claims[current].step) else {
                break false;
            };
            if next == start {
                break true;
            }
            if ring.contains(&next) {
                break false;
            }
            ring.push(next);
            current = next;
        };
        if !closed {
            continue;
        }

        let Some(&yielding) = ring.iter().max_by_key(|&&i| claims[i].priority()) else {
            continue;
        };
        let side = sidestep(mission, claims, yielding);
        let claim = &mut claims[yielding];
        let actor = &mut mission.actors[claim.actor];
        if let Some(side) = side {
            debug!(id = %claim.id, from = %claim.from, %side, "sidestepping a blocked ring");
            actor.next_step = Some(side);
            actor.progress = 0.0;
            claim.step = side;
        } else {
            debug!(id = %claim.id, pos = %claim.from, "boxed in by a blocked ring, movement halted");
            actor.halt();
            standing.remove(&claim.from);
            stationary.insert(claim.from);
            halted.insert(yielding);
        }
    }

    let mut idx = 0;
    claims.retain(|_| {
        let keep = !halted.contains(&idx);
        idx += 1;
        keep
    });
}

// ============================================================================
// Detours
// ============================================================================

// A parked actor in the way would otherwise hold its claimants forever. Steps onto the final
// target are left alone: those halt next to it instead.
fn detour_parked(mission: &mut Mission, claims: &mut [Claim], stationary: &BTreeSet<GridPos>) {
    for idx in 0..claims.len() {
        let claim = &claims[idx];
        if !stationary.contains(&claim.step) || claim.step == claim.target {
            continue;
        }
        let Some(side) = sidestep(mission, claims, idx) else {
            continue;
        };
        if side.distance_sq(claim.target) >= claim.remaining_sq {
            continue;
        }

        debug!(id = %claim.id, blocked = %claim.step, %side, "detouring around a parked actor");
        let actor = &mut mission.actors[claim.actor];
        actor.next_step = Some(side);
        actor.progress = 0.0;
        claims[idx].step = side;
    }
}

// Free neighbour that keeps the yielding mover closest to its target, first compass direction
// breaking ties. Occupied tiles and tiles other movers are stepping onto are out.
fn sidestep(mission: &Mission, claims: &[Claim], yielding: usize) -> Option<GridPos> {
    let claim = &claims[yielding];
    let taken: BTreeSet<GridPos> = mission
        .actors
        .iter()
        .filter(|actor| actor.alive)
        .map(|actor| actor.pos)
        .chain(claims.iter().map(|other| other.step))
        .collect();

    Compass::ALL
        .iter()
        .map(|dir| claim.from.step(*dir))
        .filter(|pos| mission.map.is_walkable(*pos) && !taken.contains(pos))
        .min_by_key(|pos| pos.distance_sq(claim.target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorStats;
    use crate::config::SimConfig;
    use crate::mission::{CrewSpawn, MapSource, MissionSpec, Objective};

    fn open_room(crew: &[GridPos]) -> Mission {
        let spec = MissionSpec {
            name: "collision".into(),
            map: MapSource::Template {
                rows: vec![
                    "#########".into(),
                    "#.......#".into(),
                    "#.......#".into(),
                    "#.......#".into(),
                    "#.......#".into(),
                    "#########".into(),
                ],
            },
            crew: crew
                .iter()
                .enumerate()
                .map(|(i, pos)| CrewSpawn {
                    name: format!("crew{i}"),
                    pos: Some(*pos),
                    stats: ActorStats::default(),
                    hp: None,
                    weapon: "pistol".into(),
                    abilities: Vec::new(),
                })
                .collect(),
            enemies: Vec::new(),
            interactables: Vec::new(),
            objective: Objective::EliminateAll,
            time_limit_ticks: None,
            config: SimConfig::default(),
            definitions: None,
        };
        Mission::new(&spec, 1).expect("valid mission")
    }

    #[test]
    fn closer_mover_wins_a_contested_tile() {
        let mut mission = open_room(&[GridPos::new(2, 2), GridPos::new(4, 3)]);
        // Both step onto (3,2): actor 0 has 4 left squared, actor 1 has 8
        mission.actors[0].set_move_target(GridPos::new(4, 2));
        mission.actors[1].set_move_target(GridPos::new(2, 1));
        run(&mut mission);

        assert_eq!(mission.actors[0].next_step, Some(GridPos::new(3, 2)));
        assert_eq!(mission.actors[1].next_step, Some(GridPos::new(3, 2)));
        assert!(!mission.actors[0].paused);
        assert!(mission.actors[1].paused);
    }

    #[test]
    fn uncontested_movers_all_proceed() {
        let mut mission = open_room(&[GridPos::new(2, 2), GridPos::new(6, 2)]);
        mission.actors[0].set_move_target(GridPos::new(2, 4));
        mission.actors[1].set_move_target(GridPos::new(6, 4));
        run(&mut mission);
        assert!(!mission.actors[0].paused);
        assert!(!mission.actors[1].paused);
    }

    #[test]
    fn stationary_occupant_keeps_its_tile() {
        let mut mission = open_room(&[GridPos::new(2, 2), GridPos::new(3, 2)]);
        mission.actors[0].set_move_target(GridPos::new(6, 2));
        run(&mut mission);
        // The occupant stays put and the mover goes around it
        assert!(!mission.actors[0].paused);
        assert_eq!(mission.actors[0].next_step, Some(GridPos::new(3, 1)));
        assert_eq!(mission.actors[1].pos, GridPos::new(3, 2));
    }

    #[test]
    fn boxed_in_mover_waits_behind_a_stationary_occupant() {
        let mut mission = open_room(&[GridPos::new(1, 1), GridPos::new(2, 1), GridPos::new(1, 2), GridPos::new(2, 2)]);
        mission.actors[0].set_move_target(GridPos::new(4, 1));
        run(&mut mission);
        assert!(mission.actors[0].paused);
        assert!(mission.actors[0].is_moving());
        assert_eq!(mission.actors[0].next_step, Some(GridPos::new(2, 1)));
    }

    #[test]
    fn swapping_movers_break_the_deadlock() {
        let mut mission = open_room(&[GridPos::new(2, 2), GridPos::new(3, 2)]);
        mission.actors[0].set_move_target(GridPos::new(6, 2));
        mission.actors[1].set_move_target(GridPos::new(1, 2));
        run(&mut mission);
        // Actor 0 has further to go, so it steps aside and actor 1 keeps its line
        assert_eq!(mission.actors[0].next_step, Some(GridPos::new(3, 1)));
        assert_eq!(mission.actors[1].next_step, Some(GridPos::new(2, 2)));
        assert!(!mission.actors[0].paused);
        assert!(!mission.actors[1].paused);
    }

    #[test]
    fn three_way_ring_is_broken_by_its_farthest_member() {
        let mut mission = open_room(&[GridPos::new(2, 2), GridPos::new(3, 2), GridPos::new(3, 3)]);
        mission.actors[0].set_move_target(GridPos::new(4, 2));
        mission.actors[1].set_move_target(GridPos::new(3, 4));
        mission.actors[2].set_move_target(GridPos::new(1, 1));
        run(&mut mission);
        assert_eq!(mission.actors[0].next_step, Some(GridPos::new(3, 2)));
        assert_eq!(mission.actors[1].next_step, Some(GridPos::new(3, 3)));
        // Actor 2 has 8 left squared against 4 and 4, so it leaves the ring
        assert_ne!(mission.actors[2].next_step, Some(GridPos::new(2, 2)));
        assert!(mission.actors[2].next_step.is_some());
    }

    #[test]
    fn mover_next_to_an_occupied_destination_halts() {
        let mut mission = open_room(&[GridPos::new(2, 2), GridPos::new(3, 2)]);
        mission.actors[0].set_move_target(GridPos::new(3, 2));
        run(&mut mission);
        assert!(!mission.actors[0].is_moving());
        assert!(!mission.actors[0].paused);
    }
}
