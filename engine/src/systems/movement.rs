use tracing::trace;

use crate::map::GameMap;
use crate::types::{Compass, GridPos};
use crate::world::Mission;

// Progress within this much of a full tile counts as arrived (absorbs f32 accumulation error)
const ARRIVAL_EPSILON: f32 = 1e-4;

// ============================================================================
// Step Selection
// ============================================================================

// One-step heuristic toward `to`: the direct 8-way step, else the horizontal then the vertical
// component of a blocked diagonal. None when already there or every option is blocked.
#[must_use]
pub fn step_toward(map: &GameMap, from: GridPos, to: GridPos) -> Option<GridPos> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let dir = Compass::from_step(dx, dy)?;

    let direct = from.step(dir);
    if map.is_walkable(direct) {
        return Some(direct);
    }
    if !dir.is_diagonal() {
        return None;
    }

    let horizontal = from.offset(dx.signum(), 0);
    if map.is_walkable(horizontal) {
        return Some(horizontal);
    }
    let vertical = from.offset(0, dy.signum());
    map.is_walkable(vertical).then_some(vertical)
}

// ============================================================================
// Per-Actor Movement
// ============================================================================

// Accumulate progress toward the arbitrated next step and snap onto it at a full tile
pub(crate) fn advance(mission: &mut Mission, idx: usize) {
    let tick_seconds = mission.config.tick_seconds();
    let actor = &mission.actors[idx];
    if !actor.alive || actor.paused || actor.is_stunned() || actor.is_channeling() {
        return;
    }
    let (Some(target), Some(next)) = (actor.orders.move_target, actor.next_step) else {
        return;
    };
    let id = actor.id;

    let progress = actor.progress + actor.stats.speed * tick_seconds;
    if progress < 1.0 - ARRIVAL_EPSILON {
        mission.actors[idx].progress = progress;
        return;
    }

    // A door may have closed on the step since it was chosen
    if !mission.map.is_walkable(next) {
        trace!(%id, %next, "step blocked, halting");
        mission.actors[idx].halt();
        return;
    }
    // Someone is still standing there; hold at the threshold
    if mission.actor_at(next).is_some_and(|other| other != id) {
        mission.actors[idx].progress = 1.0;
        return;
    }

    let actor = &mut mission.actors[idx];
    actor.pos = next;
    actor.progress = 0.0;
    actor.next_step = None;
    if next == target {
        actor.halt();
    }
    let hovers = actor.kind.hovers();
    trace!(%id, pos = %next, "stepped");

    if hovers {
        return;
    }
    let Some(hazard) = mission.map.interactable_at(next) else {
        return;
    };
    if mission.interactable(hazard).is_some_and(|interactable| interactable.is_armed_hazard()) {
        mission.trigger_hazard(hazard, Some(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Tile;

    #[test]
    fn direct_step_when_clear() {
        let map = GameMap::walled(10, 10);
        assert_eq!(step_toward(&map, GridPos::new(2, 2), GridPos::new(6, 7)), Some(GridPos::new(3, 3)));
        assert_eq!(step_toward(&map, GridPos::new(2, 2), GridPos::new(2, 2)), None);
    }

    #[test]
    fn blocked_diagonal_falls_back_horizontal_then_vertical() {
        let mut map = GameMap::walled(10, 10);
        map.set_tile(GridPos::new(3, 3), Tile::wall());
        assert_eq!(step_toward(&map, GridPos::new(2, 2), GridPos::new(6, 6)), Some(GridPos::new(3, 2)));

        map.set_tile(GridPos::new(3, 2), Tile::wall());
        assert_eq!(step_toward(&map, GridPos::new(2, 2), GridPos::new(6, 6)), Some(GridPos::new(2, 3)));

        map.set_tile(GridPos::new(2, 3), Tile::wall());
        assert_eq!(step_toward(&map, GridPos::new(2, 2), GridPos::new(6, 6)), None);
    }

    #[test]
    fn blocked_cardinal_has_no_fallback() {
        let mut map = GameMap::walled(10, 10);
        map.set_tile(GridPos::new(3, 2), Tile::wall());
        assert_eq!(step_toward(&map, GridPos::new(2, 2), GridPos::new(7, 2)), None);
    }
}
