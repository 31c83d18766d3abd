use tracing::debug;

use crate::actor::detection_radius;
use crate::events::SimEvent;
use crate::types::{ActorId, GridPos};
use crate::visibility::can_see;
use crate::world::{Detection, Mission, Sighting};

// ============================================================================
// Perception Tick
// ============================================================================

// Opponents `watcher` can detect right now, nearest first then lowest id. Stealth shrinks the
// watcher's effective radius per target; stunned watchers see nothing.
#[must_use]
pub fn detect_opponents(mission: &Mission, watcher: ActorId) -> Vec<(ActorId, GridPos)> {
    let Some(me) = mission.actor(watcher).filter(|actor| actor.alive && !actor.is_stunned()) else {
        return Vec::new();
    };

    let mut spotted: Vec<(i32, ActorId, GridPos)> = mission
        .live_actors(me.faction.opposing())
        .filter(|other| {
            let radius = detection_radius(me.stats.vision, other.stats.stealth);
            can_see(&mission.map, me.pos, other.pos, radius)
        })
        .map(|other| (me.pos.distance_sq(other.pos), other.id, other.pos))
        .collect();
    spotted.sort_by_key(|(distance_sq, id, _)| (*distance_sq, *id));
    spotted.into_iter().map(|(_, id, pos)| (id, pos)).collect()
}

// Every enemy refreshes what it can see. The first detection flips Idle -> Alerted (and the
// alarm, if nobody raised it yet). Being shot at counts as spotting the shooter where it fired
// from, once; after that only sight refreshes its last-known position.
pub fn run(mission: &mut Mission) {
    let tick = mission.tick;
    let watchers: Vec<ActorId> = mission.perception.keys().copied().collect();
    let mut shot_at = std::mem::take(&mut mission.shot_at);

    for watcher in watchers {
        let alive = mission.actor(watcher).is_some_and(|actor| actor.alive);
        let spotted = detect_opponents(mission, watcher);
        let provoked = shot_at
            .remove(&watcher)
            .filter(|(shooter, _)| alive && mission.actor(*shooter).is_some_and(|actor| actor.alive));

        let actors = &mission.actors;
        let Some(entry) = mission.perception.get_mut(&watcher) else {
            continue;
        };
        entry.visible = spotted.iter().map(|(id, _)| *id).collect();
        entry
            .last_known
            .retain(|id, _| actors.get(id.index()).is_some_and(|actor| actor.alive));
        if !alive {
            continue;
        }

        for (id, pos) in spotted.iter().copied().chain(provoked) {
            entry.last_known.insert(id, Sighting { pos, tick });
        }

        if entry.state != Detection::Idle {
            continue;
        }
        let Some((first, at)) = spotted.first().copied().or(provoked) else {
            continue;
        };
        entry.state = Detection::Alerted;
        entry.last_transition_tick = Some(tick);

        debug!(tick, enemy = %watcher, spotted = %first, %at, "enemy alerted");
        mission.emit(SimEvent::EnemyAlerted {
            enemy: watcher,
            spotted: first,
            at,
        });
        mission.raise_alarm(watcher);
    }
}
